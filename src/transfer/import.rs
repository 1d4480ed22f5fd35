//! Import of exported survey documents.
//!
//! The raw JSON is checked structurally first and every problem is collected;
//! a document with any problem is rejected as a whole. Missing ids are
//! regenerated, and the imported survey always gets a fresh config id.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{generate_id, SurveyConfig};

use super::export::ExportDocument;

const TOKEN_LEN: usize = 9;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImportProblem {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Malformed document: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Import rejected with {} problem(s): {}", .problems.len(), summarize(.problems))]
pub struct ImportValidationError {
    pub problems: Vec<ImportProblem>,
}

fn summarize(problems: &[ImportProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<ImportProblem> for ImportValidationError {
    fn from(problem: ImportProblem) -> Self {
        Self {
            problems: vec![problem],
        }
    }
}

/// Short lowercase alphanumeric id for entities that arrive without one.
pub fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

// ============================================================================
// Structural checks
// ============================================================================

fn invalid(field: String, reason: &str) -> ImportProblem {
    ImportProblem::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

fn check_string(obj: &Map<String, Value>, key: &str, path: &str, required: bool, problems: &mut Vec<ImportProblem>) {
    match obj.get(key) {
        None if required => problems.push(ImportProblem::MissingField(format!("{path}{key}"))),
        None => {}
        Some(Value::String(_)) => {}
        Some(_) => problems.push(invalid(format!("{path}{key}"), "must be a string")),
    }
}

/// Returns the array under `key` when it is one.
fn check_array<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
    required: bool,
    problems: &mut Vec<ImportProblem>,
) -> Option<&'a Vec<Value>> {
    match obj.get(key) {
        None if required => {
            problems.push(ImportProblem::MissingField(format!("{path}{key}")));
            None
        }
        None => None,
        Some(Value::Array(items)) => Some(items),
        Some(_) => {
            problems.push(invalid(format!("{path}{key}"), "must be an array"));
            None
        }
    }
}

fn check_bool(obj: &Map<String, Value>, key: &str, path: &str, problems: &mut Vec<ImportProblem>) {
    if obj.get(key).is_some_and(|v| !v.is_boolean()) {
        problems.push(invalid(format!("{path}{key}"), "must be a boolean"));
    }
}

fn check_order(obj: &Map<String, Value>, path: &str, problems: &mut Vec<ImportProblem>) {
    let Some(order) = obj.get("order") else {
        return;
    };
    if order.as_u64().and_then(|n| u32::try_from(n).ok()).is_none() {
        problems.push(invalid(format!("{path}order"), "must be a non-negative integer"));
    }
}

fn check_options(obj: &Map<String, Value>, path: &str, problems: &mut Vec<ImportProblem>) {
    let Some(options) = check_array(obj, "options", path, false, problems) else {
        return;
    };
    for (idx, option) in options.iter().enumerate() {
        let option_path = format!("{path}options[{idx}]");
        let Some(opt) = option.as_object() else {
            problems.push(invalid(option_path, "must be an object"));
            continue;
        };
        let prefix = format!("{option_path}.");
        check_string(opt, "label", &prefix, true, problems);
        check_string(opt, "value", &prefix, true, problems);
        check_bool(opt, "isDefault", &prefix, problems);
    }
}

/// A non-empty string id, the only kind that survives normalization.
fn explicit_id(obj: &Map<String, Value>) -> Option<&str> {
    obj.get("id").and_then(Value::as_str).filter(|id| !id.is_empty())
}

fn check_fields<'a>(
    fields: &'a [Value],
    path: &str,
    seen_fields: &mut HashMap<&'a str, String>,
    problems: &mut Vec<ImportProblem>,
) {
    for (idx, field) in fields.iter().enumerate() {
        let field_path = format!("{path}fields[{idx}]");
        match field.as_object() {
            Some(obj) => {
                let prefix = format!("{field_path}.");
                check_string(obj, "id", &prefix, false, problems);
                check_string(obj, "type", &prefix, false, problems);
                check_string(obj, "label", &prefix, false, problems);
                check_bool(obj, "required", &prefix, problems);
                check_options(obj, &prefix, problems);

                if let Some(id) = explicit_id(obj) {
                    if let Some(prev) = seen_fields.insert(id, field_path.clone()) {
                        problems.push(ImportProblem::Duplicate(format!(
                            "Field id '{id}' appears at {prev} and {field_path}"
                        )));
                    }
                }
            }
            None => problems.push(invalid(field_path, "must be an object")),
        }
    }
}

/// Collect every structural problem of `doc`.
pub fn validate_document(doc: &Value) -> Vec<ImportProblem> {
    let mut problems = Vec::new();

    let Some(root) = doc.as_object() else {
        problems.push(ImportProblem::Malformed("document must be a JSON object".to_string()));
        return problems;
    };

    check_string(root, "title", "", true, &mut problems);
    check_string(root, "description", "", false, &mut problems);

    let Some(sections) = check_array(root, "sections", "", true, &mut problems) else {
        return problems;
    };

    let mut seen_ids: HashMap<&str, usize> = HashMap::new();
    let mut seen_fields: HashMap<&str, String> = HashMap::new();
    for (idx, section) in sections.iter().enumerate() {
        let path = format!("sections[{idx}].");
        let Some(obj) = section.as_object() else {
            problems.push(invalid(format!("sections[{idx}]"), "must be an object"));
            continue;
        };

        check_string(obj, "id", &path, false, &mut problems);
        if let Some(id) = explicit_id(obj) {
            if let Some(prev) = seen_ids.insert(id, idx) {
                problems.push(ImportProblem::Duplicate(format!(
                    "Section id '{id}' appears at indices {prev} and {idx}"
                )));
            }
        }
        check_string(obj, "title", &path, true, &mut problems);
        check_order(obj, &path, &mut problems);

        if let Some(fields) = check_array(obj, "fields", &path, true, &mut problems) {
            check_fields(fields, &path, &mut seen_fields, &mut problems);
        }

        if let Some(subsections) = check_array(obj, "subsections", &path, false, &mut problems) {
            for (sub_idx, subsection) in subsections.iter().enumerate() {
                let sub_path = format!("{path}subsections[{sub_idx}].");
                let Some(sub) = subsection.as_object() else {
                    problems.push(invalid(format!("{path}subsections[{sub_idx}]"), "must be an object"));
                    continue;
                };
                check_string(sub, "id", &sub_path, false, &mut problems);
                check_string(sub, "title", &sub_path, false, &mut problems);
                if let Some(fields) = check_array(sub, "fields", &sub_path, false, &mut problems) {
                    check_fields(fields, &sub_path, &mut seen_fields, &mut problems);
                }
            }
        }
    }

    problems
}

// ============================================================================
// Normalization
// ============================================================================

/// A missing or empty id gets a fresh token.
fn ensure_id(obj: &mut Map<String, Value>) {
    if explicit_id(obj).is_none() {
        obj.insert("id".to_string(), Value::String(random_token()));
    }
}

fn fill_field_ids(obj: &mut Map<String, Value>) {
    if let Some(Value::Array(fields)) = obj.get_mut("fields") {
        for field in fields.iter_mut().filter_map(Value::as_object_mut) {
            ensure_id(field);
        }
    }
}

/// Regenerate missing ids and default missing section orders to position.
/// Only called on documents that passed [`validate_document`].
fn fill_missing(doc: &mut Value) {
    let Some(Value::Array(sections)) = doc.get_mut("sections") else {
        return;
    };
    for (idx, section) in sections.iter_mut().enumerate() {
        let Some(obj) = section.as_object_mut() else {
            continue;
        };
        ensure_id(obj);
        if !obj.contains_key("order") {
            obj.insert("order".to_string(), Value::from(idx));
        }
        fill_field_ids(obj);
        if let Some(Value::Array(subsections)) = obj.get_mut("subsections") {
            for sub in subsections.iter_mut().filter_map(Value::as_object_mut) {
                ensure_id(sub);
                fill_field_ids(sub);
            }
        }
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Import an already-parsed document.
pub fn import_value(mut doc: Value) -> Result<SurveyConfig, ImportValidationError> {
    let problems = validate_document(&doc);
    if !problems.is_empty() {
        debug!("Rejecting import with {} problems", problems.len());
        return Err(ImportValidationError { problems });
    }

    fill_missing(&mut doc);
    let document: ExportDocument =
        serde_json::from_value(doc).map_err(|e| ImportProblem::Malformed(e.to_string()))?;

    let mut config = SurveyConfig::with_id(generate_id(), document.title);
    config.description = document.description;
    config.version = document.version;
    config.paginator_config = document.paginator_config;
    config.footer_config = document.footer_config;
    config.sections = document.sections;
    for section in &mut config.sections {
        section.refresh_type();
    }

    info!(
        "Imported survey '{}' as {} ({} sections, {} fields)",
        config.title,
        config.id,
        config.sections.len(),
        config.field_count()
    );
    Ok(config)
}

/// Load a stored survey. Same checks as [`import_value`], but a string `id`
/// on the document is kept instead of replaced.
pub fn restore_value(doc: Value) -> Result<SurveyConfig, ImportValidationError> {
    let id = doc.get("id").and_then(Value::as_str).map(String::from);
    let mut config = import_value(doc)?;
    if let Some(id) = id {
        config.id = id;
    }
    Ok(config)
}

/// Import a JSON string.
pub fn import_str(json: &str) -> Result<SurveyConfig, ImportValidationError> {
    let doc: Value = serde_json::from_str(json).map_err(|e| ImportProblem::Malformed(e.to_string()))?;
    import_value(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_ids_are_regenerated() {
        let config = import_value(json!({
            "title": "Imported",
            "sections": [{
                "title": "About Us",
                "fields": [{"type": "text", "label": "Name"}],
                "subsections": [{"title": "More", "fields": [{"label": "Age", "type": "number"}]}]
            }]
        }))
        .unwrap();

        let section = &config.sections[0];
        assert_eq!(section.id.len(), TOKEN_LEN);
        assert!(section.id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_eq!(section.section_type, "about-us-identifier");
        assert!(!section.fields[0].id.is_empty());
        assert!(!section.subsections[0].id.is_empty());
        assert!(!section.subsections[0].fields[0].id.is_empty());
    }

    #[test]
    fn test_all_problems_reported_together() {
        let err = import_value(json!({
            "title": 42,
            "sections": [
                {"id": 7, "title": "A", "fields": []},
                {"id": "s", "fields": {}},
                {"id": "s", "title": "C", "fields": ["oops"]},
                "not a section"
            ]
        }))
        .unwrap_err();

        assert!(err.problems.contains(&ImportProblem::InvalidValue {
            field: "title".into(),
            reason: "must be a string".into()
        }));
        assert!(err.problems.contains(&ImportProblem::InvalidValue {
            field: "sections[0].id".into(),
            reason: "must be a string".into()
        }));
        assert!(err.problems.contains(&ImportProblem::MissingField("sections[1].title".into())));
        assert!(err.problems.contains(&ImportProblem::InvalidValue {
            field: "sections[1].fields".into(),
            reason: "must be an array".into()
        }));
        assert!(err
            .problems
            .iter()
            .any(|p| matches!(p, ImportProblem::Duplicate(msg) if msg.contains("'s'"))));
        assert!(err.problems.contains(&ImportProblem::InvalidValue {
            field: "sections[2].fields[0]".into(),
            reason: "must be an object".into()
        }));
        assert!(err.problems.contains(&ImportProblem::InvalidValue {
            field: "sections[3]".into(),
            reason: "must be an object".into()
        }));
    }

    #[test]
    fn test_missing_sections_and_bad_json() {
        let err = import_value(json!({"title": "x"})).unwrap_err();
        assert_eq!(err.problems, vec![ImportProblem::MissingField("sections".into())]);

        let err = import_str("{not json").unwrap_err();
        assert!(matches!(err.problems.as_slice(), [ImportProblem::Malformed(_)]));
    }

    #[test]
    fn test_empty_ids_are_regenerated() {
        let config = import_value(json!({
            "title": "Imported",
            "sections": [
                {"id": "", "title": "A", "fields": [{"id": "", "label": "One"}, {"id": "", "label": "Two"}]},
                {"id": "", "title": "B", "fields": []}
            ]
        }))
        .unwrap();

        let a = &config.sections[0];
        assert!(!a.id.is_empty());
        assert_ne!(a.id, config.sections[1].id);
        assert!(!a.fields[0].id.is_empty());
        assert_ne!(a.fields[0].id, a.fields[1].id);
    }

    #[test]
    fn test_field_attribute_types_are_checked() {
        let err = import_value(json!({
            "title": "Typed",
            "sections": [{
                "title": "A",
                "order": -1,
                "fields": [{
                    "label": "Pick",
                    "required": "yes",
                    "options": [{"label": "Yes"}, {"label": "No", "value": "no", "isDefault": "true"}, 3]
                }]
            }]
        }))
        .unwrap_err();

        assert_eq!(
            err.problems,
            vec![
                invalid("sections[0].order".into(), "must be a non-negative integer"),
                invalid("sections[0].fields[0].required".into(), "must be a boolean"),
                ImportProblem::MissingField("sections[0].fields[0].options[0].value".into()),
                invalid("sections[0].fields[0].options[1].isDefault".into(), "must be a boolean"),
                invalid("sections[0].fields[0].options[2]".into(), "must be an object"),
            ]
        );
    }

    #[test]
    fn test_restore_keeps_stored_id() {
        let config = restore_value(json!({"id": "c9", "title": "T", "sections": []})).unwrap();
        assert_eq!(config.id, "c9");
    }

    #[test]
    fn test_import_assigns_fresh_config_id() {
        let doc = json!({"title": "T", "sections": []});
        let a = import_value(doc.clone()).unwrap();
        let b = import_value(doc).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.version, 1);
    }
}
