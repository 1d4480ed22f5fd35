//! Persistence boundary for surveyor
//!
//! The survey core never talks to a database directly. It consumes three
//! store traits, implemented by the hosted backend in production and by
//! [`InMemoryStore`] locally.
//!
//! - `SurveyStore`: CRUD for survey configs
//! - `OptionSetStore`: rating scales and radio / multi-select / select option sets
//! - `ResponseStore`: submitted responses keyed by descriptive field id

pub mod error;
pub mod memory;
pub mod repository;

pub use error::PersistenceError;
pub use memory::{InMemoryStore, StoredResponse};
pub use repository::{OptionSetStore, ResponseMap, ResponseStore, SurveyStore};
