//! Survey import/export as portable JSON documents.

pub mod export;
pub mod import;

pub use export::{export_config, schema_json, to_json_string, ExportDocument};
pub use import::{import_str, import_value, restore_value, validate_document, ImportProblem, ImportValidationError};

/// Parse a YAML survey document into the JSON value the importer expects.
pub fn yaml_to_value(yaml: &str) -> Result<serde_json::Value, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}
