//! Default and option resolution
//!
//! - `defaults`: type/option-set inheritance for new fields
//! - `options`: what a field renders with right now
//! - `cache` / `loader`: option-set request state and fetching

pub mod cache;
pub mod defaults;
pub mod loader;
pub mod options;

pub use cache::{InMemoryOptionSetCache, OptionSetCache, OptionSetLoadError, OptionSetState};
pub use defaults::{resolve_field_defaults, resolve_for_request, DefaultsSource, FieldRequest, ResolvedDefaults};
pub use loader::{LoadOutcome, OptionSetLoader};
pub use options::{resolve_options, ResolvedOptions};
