use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::config::{FormSettings, Settings, StorageSettings};
use crate::domain::{OptionSetRef, SurveyConfig};

const MAX_DEBOUNCE_MS: u64 = 60_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Cross-reference error: {0}")]
    CrossReference(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

fn collect(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_form(&settings.form) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_storage(&settings.storage) {
            errors.extend(e);
        }

        collect(errors)
    }

    fn validate_form(form: &FormSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if form.changed_by.trim().is_empty() {
            errors.push(ValidationError::MissingField("form.changed_by".to_string()));
        }

        if form.debounce_ms == 0 || form.debounce_ms > MAX_DEBOUNCE_MS {
            errors.push(ValidationError::InvalidValue {
                field: "form.debounce_ms".to_string(),
                reason: format!("Must be between 1 and {}", MAX_DEBOUNCE_MS),
            });
        }

        collect(errors)
    }

    fn validate_storage(storage: &StorageSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if storage.survey_dir.is_empty() {
            errors.push(ValidationError::MissingField("storage.survey_dir".to_string()));
        }

        if storage.option_set_dir.as_deref() == Some("") {
            errors.push(ValidationError::InvalidValue {
                field: "storage.option_set_dir".to_string(),
                reason: "Must not be empty when set".to_string(),
            });
        }

        collect(errors)
    }

    /// Lint a loaded survey: duplicate ids, unsupported field types, and
    /// option-set references missing from `known_sets` (when given).
    pub fn validate_survey(
        survey: &SurveyConfig,
        known_sets: Option<&HashSet<OptionSetRef>>,
    ) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut seen_sections = HashMap::new();
        let mut seen_fields = HashMap::new();

        if survey.title.trim().is_empty() {
            errors.push(ValidationError::MissingField("title".to_string()));
        }

        for (idx, section) in survey.sections.iter().enumerate() {
            if let Some(prev_idx) = seen_sections.insert(section.id.as_str(), idx) {
                errors.push(ValidationError::Duplicate(format!(
                    "Section id '{}' appears at indices {} and {}",
                    section.id, prev_idx, idx
                )));
            }
        }

        for (section, field) in survey.fields_in_order() {
            if let Some(prev_section) = seen_fields.insert(field.id.as_str(), section.id.as_str()) {
                errors.push(ValidationError::Duplicate(format!(
                    "Field id '{}' appears in sections '{}' and '{}'",
                    field.id, prev_section, section.id
                )));
            }

            if !field.field_type.is_supported() {
                errors.push(ValidationError::InvalidValue {
                    field: format!("{}.{}.type", section.id, field.id),
                    reason: format!("Unsupported field type '{}'", field.field_type),
                });
            }

            if let (Some(reference), Some(known)) = (field.option_set_ref(), known_sets) {
                if !known.contains(&reference) {
                    errors.push(ValidationError::CrossReference(format!(
                        "Field '{}' references unknown option set {}",
                        field.id, reference
                    )));
                }
            }
        }

        collect(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Field, FieldType, OptionSetKind, Section};

    fn settings() -> Settings {
        Settings {
            form: FormSettings {
                debounce_ms: 300,
                changed_by: "admin".to_string(),
            },
            storage: StorageSettings {
                survey_dir: "surveys".to_string(),
                option_set_dir: None,
            },
        }
    }

    #[test]
    fn test_valid_settings() {
        assert!(ConfigValidator::validate(&settings()).is_ok());
    }

    #[test]
    fn test_all_setting_errors_collected() {
        let mut s = settings();
        s.form.debounce_ms = 0;
        s.form.changed_by = " ".to_string();
        s.storage.survey_dir.clear();

        let errors = ConfigValidator::validate(&s).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_survey_lint() {
        let survey = SurveyConfig::with_id("c1", "Survey")
            .with_section(
                Section::new("s1", "One", 0)
                    .with_field(Field::new("f1", FieldType::parse("signature"), "Sign"))
                    .with_field(Field::new("f2", FieldType::Rating, "Rate").with_option_set("rs1")),
            )
            .with_section(Section::new("s1", "Two", 1).with_field(Field::new("f1", FieldType::Text, "Again")));

        let known: HashSet<OptionSetRef> = [OptionSetRef::new(OptionSetKind::Rating, "rs2")].into();
        let errors = ConfigValidator::validate_survey(&survey, Some(&known)).unwrap_err();

        assert!(errors.iter().any(|e| matches!(e, ValidationError::Duplicate(m) if m.contains("Section id 's1'"))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Duplicate(m) if m.contains("Field id 'f1'"))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidValue { reason, .. } if reason.contains("signature"))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::CrossReference(m) if m.contains("rating:rs1"))));

        assert!(ConfigValidator::validate_survey(&survey, None).unwrap_err().len() == 3);
    }
}
