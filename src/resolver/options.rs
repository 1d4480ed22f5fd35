//! Render-time option resolution.

use crate::domain::{Field, FieldOption};

use super::cache::{OptionSetCache, OptionSetState};

/// Options a field can render right now.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub options: Vec<FieldOption>,
    pub loading: bool,
    pub failed: bool,
}

impl ResolvedOptions {
    fn ready(options: Vec<FieldOption>) -> Self {
        Self {
            options,
            loading: false,
            failed: false,
        }
    }

    fn loading() -> Self {
        Self {
            loading: true,
            ..Default::default()
        }
    }

    fn failed() -> Self {
        Self {
            failed: true,
            ..Default::default()
        }
    }

    /// Options are final (neither loading nor failed).
    pub fn is_ready(&self) -> bool {
        !self.loading && !self.failed
    }

    pub fn default_option(&self) -> Option<&FieldOption> {
        self.options.iter().find(|o| o.is_default)
    }
}

/// Resolve the options `field` renders with.
///
/// An external option set wins over inline options whenever the field type
/// uses one and the reference is set. Order is preserved as stored.
pub fn resolve_options(field: &Field, cache: &dyn OptionSetCache) -> ResolvedOptions {
    let Some(reference) = field.option_set_ref() else {
        return ResolvedOptions::ready(field.options.clone());
    };

    match cache.get(&reference) {
        Some(OptionSetState::Loaded(set)) => ResolvedOptions::ready(set.options.clone()),
        Some(OptionSetState::Loading) => ResolvedOptions::loading(),
        // Never requested and requested-but-errored both render as failed.
        Some(OptionSetState::Failed(_)) | None => ResolvedOptions::failed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldType, OptionSet, OptionSetKind, OptionSetRef};
    use crate::resolver::cache::{InMemoryOptionSetCache, OptionSetLoadError};
    use std::sync::Arc;

    fn yes_no() -> Vec<FieldOption> {
        vec![FieldOption::new("Yes", "yes"), FieldOption::new("No", "no")]
    }

    #[test]
    fn test_inline_options_verbatim() {
        let cache = InMemoryOptionSetCache::new();
        let field = Field::new("f", FieldType::Radio, "Agree?").with_options(yes_no());

        let resolved = resolve_options(&field, &cache);
        assert!(resolved.is_ready());
        assert_eq!(resolved.options, yes_no());
    }

    #[test]
    fn test_loaded_option_set_replaces_inline() {
        let set = OptionSet::new(OptionSetKind::Rating, "rs1", "Scale").with_options(vec![
            FieldOption::new("High", "High"),
            FieldOption::new("Low", "Low"),
            FieldOption::new("Medium", "Medium").as_default(),
        ]);
        let cache = InMemoryOptionSetCache::with_loaded([set]);
        let field = Field::new("f", FieldType::Rating, "Rate")
            .with_options(yes_no())
            .with_option_set("rs1");

        let resolved = resolve_options(&field, &cache);
        let values: Vec<&str> = resolved.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["High", "Low", "Medium"]);
        assert_eq!(resolved.default_option().map(|o| o.value.as_str()), Some("Medium"));
    }

    #[test]
    fn test_loading_and_failed_states() {
        let cache = InMemoryOptionSetCache::new();
        let field = Field::new("f", FieldType::Rating, "Rate").with_option_set("rs1");
        let key = OptionSetRef::new(OptionSetKind::Rating, "rs1");

        assert!(resolve_options(&field, &cache).failed);

        cache.set(key.clone(), OptionSetState::Loading);
        let resolved = resolve_options(&field, &cache);
        assert!(resolved.loading);
        assert!(resolved.options.is_empty());

        cache.set(key.clone(), OptionSetState::Failed(OptionSetLoadError::NotFound(key)));
        assert!(resolve_options(&field, &cache).failed);
    }

    #[test]
    fn test_reference_for_other_kind_is_ignored() {
        // A stale rating reference on a radio field must not be used.
        let mut field = Field::new("f", FieldType::Radio, "Pick").with_options(yes_no());
        field.rating_scale_id = Some("rs1".into());
        let cache = InMemoryOptionSetCache::new();
        cache.set(
            OptionSetRef::new(OptionSetKind::Rating, "rs1"),
            OptionSetState::Loaded(Arc::new(OptionSet::new(OptionSetKind::Rating, "rs1", "S"))),
        );

        assert_eq!(resolve_options(&field, &cache).options, yes_no());
    }
}
