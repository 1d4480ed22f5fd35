//! Persistence layer error types

use thiserror::Error;

/// Errors raised by survey, option-set and response stores
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Backend unreachable or refused the request
    #[error("Backend error: {0}")]
    Backend(String),

    /// Item not found
    #[error("Item not found: {entity_type} with identifier '{identifier}'")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    /// Duplicate entry
    #[error("Duplicate entry: {entity_type} with id '{id}' already exists")]
    Duplicate { entity_type: String, id: String },
}

impl PersistenceError {
    pub fn not_found(entity_type: &str, identifier: &str) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            identifier: identifier.to_string(),
        }
    }
}
