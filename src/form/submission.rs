//! Validation and submission of a filled-in survey.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::slug::descriptive_key;
use crate::domain::{Field, FieldType, FieldValue, RuleKind, SurveyConfig, ValidationRule};
use crate::persistence::{PersistenceError, ResponseMap, ResponseStore};

use super::state::FormStateStore;

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

// ============================================================================
// Field validation
// ============================================================================

/// Why a single field failed. `Display` gives the default wording.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldValidationError {
    #[error("This field is required")]
    Required,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Must be at least {0} characters")]
    TooShort(usize),

    #[error("Must be at most {0} characters")]
    TooLong(usize),

    #[error("Select at least {0} options")]
    TooFewSelections(usize),

    #[error("Select at most {0} options")]
    TooManySelections(usize),
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.as_ref().is_some_and(|re| re.is_match(value))
}

fn is_unset(value: Option<&FieldValue>) -> bool {
    value.map_or(true, FieldValue::is_empty)
}

/// Check one declared rule. Rules other than `required` pass on empty values;
/// unknown rules and rules with an unusable bound always pass.
pub fn check_rule(rule: &ValidationRule, value: Option<&FieldValue>) -> Result<(), FieldValidationError> {
    if rule.kind == RuleKind::Required {
        return if is_unset(value) {
            Err(FieldValidationError::Required)
        } else {
            Ok(())
        };
    }

    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Ok(());
    };

    match (&rule.kind, value) {
        (RuleKind::Email, FieldValue::Text(text)) if !is_valid_email(text) => {
            Err(FieldValidationError::InvalidEmail)
        }
        (RuleKind::Min, FieldValue::Text(text)) => match rule.bound() {
            Some(min) if text.chars().count() < min => Err(FieldValidationError::TooShort(min)),
            _ => Ok(()),
        },
        (RuleKind::Max, FieldValue::Text(text)) => match rule.bound() {
            Some(max) if text.chars().count() > max => Err(FieldValidationError::TooLong(max)),
            _ => Ok(()),
        },
        (RuleKind::MinSelections, FieldValue::List(items)) => match rule.bound() {
            Some(min) if items.len() < min => Err(FieldValidationError::TooFewSelections(min)),
            _ => Ok(()),
        },
        (RuleKind::MaxSelections, FieldValue::List(items)) => match rule.bound() {
            Some(max) if items.len() > max => Err(FieldValidationError::TooManySelections(max)),
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

/// First failing check for `field`, already worded (a rule's own message wins).
pub fn validate_field(field: &Field, value: Option<&FieldValue>) -> Option<String> {
    if field.required && is_unset(value) {
        let message = field
            .validation
            .iter()
            .find(|r| r.kind == RuleKind::Required)
            .and_then(|r| r.message.clone());
        return Some(message.unwrap_or_else(|| FieldValidationError::Required.to_string()));
    }

    for rule in &field.validation {
        if let Err(e) = check_rule(rule, value) {
            return Some(rule.message.clone().unwrap_or_else(|| e.to_string()));
        }
    }

    if field.field_type == FieldType::Email {
        if let Some(text) = value.and_then(FieldValue::as_text) {
            if !text.is_empty() && !is_valid_email(text) {
                return Some(FieldValidationError::InvalidEmail.to_string());
            }
        }
    }

    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field_id: String,
    pub message: String,
}

/// Per-field failures in validation order.
#[derive(Debug, Clone, Default, Error, PartialEq, Eq)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field_id: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field_id == field_id)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }
}

/// Validate every field: sections by `order`, section fields, then subsection fields.
pub fn validate(config: &SurveyConfig, store: &FormStateStore) -> ValidationErrors {
    let errors = config
        .fields_in_order()
        .into_iter()
        .filter_map(|(_, field)| {
            validate_field(field, store.get_value(&field.id)).map(|message| FieldError {
                field_id: field.id.clone(),
                message,
            })
        })
        .collect();
    ValidationErrors { errors }
}

// ============================================================================
// Response mapping
// ============================================================================

/// Map stored answers to descriptive keys. Fields without a value are left
/// out. Colliding keys are last-write-wins; the collided keys are returned.
pub fn descriptive_responses(config: &SurveyConfig, store: &FormStateStore) -> (ResponseMap, Vec<String>) {
    let mut responses = ResponseMap::new();
    let mut collisions = Vec::new();
    let mut seen = HashSet::new();

    for (section, field) in config.fields_in_order() {
        let Some(value) = store.get_value(&field.id) else {
            continue;
        };
        let key = descriptive_key(&section.title, &field.label);
        if !seen.insert(key.clone()) {
            warn!(
                "Response key '{}' collides; field {} overwrites an earlier answer",
                key, field.id
            );
            if !collisions.contains(&key) {
                collisions.push(key.clone());
            }
        }
        responses.insert(key, value.clone());
    }

    (responses, collisions)
}

// ============================================================================
// Submit
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub instance_id: String,
    pub response_count: usize,
    /// Descriptive keys written by more than one field
    pub collisions: Vec<String>,
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Failed to store responses: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Validate, map and hand the responses to `responses`.
///
/// Validation failure replaces the store's errors. A persistence failure
/// leaves the store untouched; errors are only cleared once the responses
/// have been accepted.
pub async fn submit(
    config: &SurveyConfig,
    store: &mut FormStateStore,
    instance_id: &str,
    responses: &dyn ResponseStore,
) -> Result<SubmissionReceipt, SubmissionError> {
    let errors = validate(config, store);
    if !errors.is_empty() {
        store.replace_errors(errors.iter().map(|e| (e.field_id.clone(), e.message.clone())));
        return Err(SubmissionError::Validation(errors));
    }

    let (mapped, collisions) = descriptive_responses(config, store);
    let response_count = mapped.len();
    responses.add_survey_response(instance_id, mapped).await?;

    store.clear_errors();
    info!(
        "Submitted {} responses for survey {} (instance {})",
        response_count, config.id, instance_id
    );

    Ok(SubmissionReceipt {
        instance_id: instance_id.to_string(),
        response_count,
        collisions,
    })
}
