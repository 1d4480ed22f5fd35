//! Answer values and validation errors for one rendered survey.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::domain::{FieldOption, FieldValue, SurveyConfig};
use crate::resolver::{resolve_options, OptionSetCache};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormStateStore {
    values: HashMap<String, FieldValue>,
    errors: HashMap<String, String>,
    /// Fields whose option-set default has already been considered
    defaults_applied: HashSet<String>,
}

impl FormStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_value(&self, field_id: &str) -> Option<&FieldValue> {
        self.values.get(field_id)
    }

    /// Overwrite a field's value.
    pub fn set_field_value(&mut self, field_id: impl Into<String>, value: FieldValue) {
        self.values.insert(field_id.into(), value);
    }

    pub fn clear_value(&mut self, field_id: &str) -> Option<FieldValue> {
        self.values.remove(field_id)
    }

    pub fn values(&self) -> &HashMap<String, FieldValue> {
        &self.values
    }

    pub fn error(&self, field_id: &str) -> Option<&str> {
        self.errors.get(field_id).map(String::as_str)
    }

    pub fn errors(&self) -> &HashMap<String, String> {
        &self.errors
    }

    pub fn set_error(&mut self, field_id: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(field_id.into(), message.into());
    }

    pub fn clear_error(&mut self, field_id: &str) {
        self.errors.remove(field_id);
    }

    /// Replace every error at once.
    pub fn replace_errors(&mut self, errors: impl IntoIterator<Item = (String, String)>) {
        self.errors = errors.into_iter().collect();
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Clear values, errors and default bookkeeping.
    pub fn reset_form(&mut self) {
        self.values.clear();
        self.errors.clear();
        self.defaults_applied.clear();
    }

    /// Reset, then seed every field of `config`. Per field, the first that
    /// applies wins: the field's declared default, an empty list for
    /// multi-select types, the resolved default option if options are
    /// available now. Otherwise the field stays unset until
    /// [`Self::apply_option_default`] runs for it.
    pub fn initialize(&mut self, config: &SurveyConfig, cache: &dyn OptionSetCache) {
        self.reset_form();

        for (_, field) in config.fields_in_order() {
            if let Some(default_value) = &field.default_value {
                self.values.insert(field.id.clone(), default_value.clone());
                self.defaults_applied.insert(field.id.clone());
                continue;
            }
            if field.field_type.is_multi() {
                self.values.insert(field.id.clone(), FieldValue::List(Vec::new()));
                self.defaults_applied.insert(field.id.clone());
                continue;
            }
            let resolved = resolve_options(field, cache);
            if resolved.is_ready() {
                self.apply_option_default(&field.id, &resolved.options);
            }
        }

        debug!(
            "Initialized form state for survey {} ({} values seeded)",
            config.id,
            self.values.len()
        );
    }

    /// Seed a field from the default option of a (late-)loaded option set.
    ///
    /// Considered at most once per field per initialization, and never
    /// overrides a value that is already present. Returns whether a value
    /// was written.
    pub fn apply_option_default(&mut self, field_id: &str, options: &[FieldOption]) -> bool {
        if self.defaults_applied.contains(field_id) {
            return false;
        }
        self.defaults_applied.insert(field_id.to_string());

        if self.values.contains_key(field_id) {
            return false;
        }
        match options.iter().find(|o| o.is_default) {
            Some(option) => {
                self.values
                    .insert(field_id.to_string(), FieldValue::Text(option.value.clone()));
                true
            }
            None => false,
        }
    }

    pub fn default_applied(&self, field_id: &str) -> bool {
        self.defaults_applied.contains(field_id)
    }
}
