//! Externally stored option collections shared by reference across fields.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::field::FieldOption;

/// Which collection an option-set reference points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OptionSetKind {
    /// Rating scales (`ratingScaleId`)
    Rating,
    /// Radio option sets (`radioOptionSetId`)
    Radio,
    /// Multi-select option sets (`multiSelectOptionSetId`)
    #[serde(rename = "multiselect")]
    MultiSelect,
    /// Select option sets (`selectOptionSetId`)
    Select,
}

impl OptionSetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionSetKind::Rating => "rating",
            OptionSetKind::Radio => "radio",
            OptionSetKind::MultiSelect => "multiselect",
            OptionSetKind::Select => "select",
        }
    }
}

impl fmt::Display for OptionSetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed pointer from a field (or a defaults block) to an option set.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OptionSetRef {
    pub kind: OptionSetKind,
    pub id: String,
}

impl OptionSetRef {
    pub fn new(kind: OptionSetKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }
}

impl fmt::Display for OptionSetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// A named, ordered collection of selectable options (rating scale, radio set,
/// multi-select set or select set).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptionSet {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub kind: OptionSetKind,
    #[serde(default)]
    pub options: Vec<FieldOption>,
}

impl OptionSet {
    pub fn new(kind: OptionSetKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            kind,
            options: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = options;
        self
    }

    pub fn reference(&self) -> OptionSetRef {
        OptionSetRef::new(self.kind, self.id.clone())
    }

    /// First option flagged as the default, if any.
    pub fn default_option(&self) -> Option<&FieldOption> {
        self.options.iter().find(|o| o.is_default)
    }
}
