//! Injectable option-set cache with uniform loading / loaded / failed states.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

use crate::domain::{OptionSet, OptionSetRef};

/// Why an option set could not be made available to a field.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OptionSetLoadError {
    #[error("Option set not found: {0}")]
    NotFound(OptionSetRef),

    #[error("Failed to load option set {reference}: {reason}")]
    Backend { reference: OptionSetRef, reason: String },
}

/// Request state of one option set.
#[derive(Debug, Clone)]
pub enum OptionSetState {
    Loading,
    Loaded(Arc<OptionSet>),
    Failed(OptionSetLoadError),
}

pub trait OptionSetCache: Send + Sync {
    fn get(&self, key: &OptionSetRef) -> Option<OptionSetState>;

    fn set(&self, key: OptionSetRef, state: OptionSetState);

    fn clear(&self);

    /// Whether the option set is loaded and usable.
    fn has(&self, key: &OptionSetRef) -> bool {
        matches!(self.get(key), Some(OptionSetState::Loaded(_)))
    }

    /// Mark `key` as loading unless it is already loading or loaded.
    /// Returns `true` when the caller should fetch it.
    fn begin_load(&self, key: &OptionSetRef) -> bool {
        match self.get(key) {
            Some(OptionSetState::Loading) | Some(OptionSetState::Loaded(_)) => false,
            Some(OptionSetState::Failed(_)) | None => {
                self.set(key.clone(), OptionSetState::Loading);
                true
            }
        }
    }
}

/// Process-local cache, one per form session.
#[derive(Debug, Default)]
pub struct InMemoryOptionSetCache {
    entries: RwLock<HashMap<OptionSetRef, OptionSetState>>,
}

impl InMemoryOptionSetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with already loaded option sets.
    pub fn with_loaded(sets: impl IntoIterator<Item = OptionSet>) -> Self {
        let cache = Self::new();
        for set in sets {
            cache.set(set.reference(), OptionSetState::Loaded(Arc::new(set)));
        }
        cache
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OptionSetCache for InMemoryOptionSetCache {
    fn get(&self, key: &OptionSetRef) -> Option<OptionSetState> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set(&self, key: OptionSetRef, state: OptionSetState) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, state);
    }

    fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
    }

    fn begin_load(&self, key: &OptionSetRef) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(OptionSetState::Loading) | Some(OptionSetState::Loaded(_)) => false,
            _ => {
                entries.insert(key.clone(), OptionSetState::Loading);
                true
            }
        }
    }
}
