//! Field-level schema types: field types, options, validation rules, defaults.

use chrono::{DateTime, Utc};
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use super::option_set::{OptionSetKind, OptionSetRef};

// ============================================================================
// Field Type
// ============================================================================

/// Input type of a field. Unknown type names are preserved verbatim in
/// [`FieldType::Unsupported`] so they survive a load/save cycle and can be
/// rendered as a placeholder.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FieldType {
    #[default]
    Text,
    Textarea,
    Email,
    Number,
    Radio,
    Select,
    MultiSelect,
    MultiSelectDropdown,
    Rating,
    Unsupported(String),
}

impl FieldType {
    pub fn parse(name: &str) -> Self {
        match name {
            "text" => FieldType::Text,
            "textarea" => FieldType::Textarea,
            "email" => FieldType::Email,
            "number" => FieldType::Number,
            "radio" => FieldType::Radio,
            "select" => FieldType::Select,
            "multiselect" => FieldType::MultiSelect,
            "multiselectdropdown" => FieldType::MultiSelectDropdown,
            "rating" => FieldType::Rating,
            other => FieldType::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Email => "email",
            FieldType::Number => "number",
            FieldType::Radio => "radio",
            FieldType::Select => "select",
            FieldType::MultiSelect => "multiselect",
            FieldType::MultiSelectDropdown => "multiselectdropdown",
            FieldType::Rating => "rating",
            FieldType::Unsupported(name) => name,
        }
    }

    /// Whether answers are an ordered list of option values.
    pub fn is_multi(&self) -> bool {
        matches!(self, FieldType::MultiSelect | FieldType::MultiSelectDropdown)
    }

    /// Whether the field picks from options (inline or from an option set).
    pub fn is_selection(&self) -> bool {
        self.option_set_kind().is_some()
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, FieldType::Unsupported(_))
    }

    /// The option-set collection this field type may reference.
    pub fn option_set_kind(&self) -> Option<OptionSetKind> {
        match self {
            FieldType::Rating => Some(OptionSetKind::Rating),
            FieldType::Radio => Some(OptionSetKind::Radio),
            FieldType::MultiSelect | FieldType::MultiSelectDropdown => Some(OptionSetKind::MultiSelect),
            FieldType::Select => Some(OptionSetKind::Select),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(FieldType::parse(&name))
    }
}

impl JsonSchema for FieldType {
    fn schema_name() -> String {
        "FieldType".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

// ============================================================================
// Options, Rules, Values
// ============================================================================

/// One selectable choice.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldOption {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl FieldOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            is_default: false,
            color: None,
        }
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// Kind of a declared validation rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Required,
    Email,
    /// Minimum string length
    Min,
    /// Maximum string length
    Max,
    /// Minimum number of selected options
    MinSelections,
    /// Maximum number of selected options
    MaxSelections,
    /// Unknown rule, kept for round-tripping and otherwise ignored
    Other(String),
}

impl RuleKind {
    pub fn parse(name: &str) -> Self {
        match name {
            "required" => RuleKind::Required,
            "email" => RuleKind::Email,
            "min" => RuleKind::Min,
            "max" => RuleKind::Max,
            "minSelections" => RuleKind::MinSelections,
            "maxSelections" => RuleKind::MaxSelections,
            other => RuleKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RuleKind::Required => "required",
            RuleKind::Email => "email",
            RuleKind::Min => "min",
            RuleKind::Max => "max",
            RuleKind::MinSelections => "minSelections",
            RuleKind::MaxSelections => "maxSelections",
            RuleKind::Other(name) => name,
        }
    }
}

impl Serialize for RuleKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RuleKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(RuleKind::parse(&name))
    }
}

impl JsonSchema for RuleKind {
    fn schema_name() -> String {
        "RuleKind".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

/// A declared validation rule; `message` overrides the default wording.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationRule {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationRule {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            value: None,
            message: None,
        }
    }

    pub fn with_bound(mut self, bound: u64) -> Self {
        self.value = Some(Value::from(bound));
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Numeric bound for length/selection rules. Accepts numbers and numeric strings.
    pub fn bound(&self) -> Option<usize> {
        let raw = match self.value.as_ref()? {
            Value::Number(n) => n.as_u64()?,
            Value::String(s) => s.trim().parse::<u64>().ok()?,
            _ => return None,
        };
        usize::try_from(raw).ok()
    }
}

/// Entry of the append-only label audit trail: the label a field had before a change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelChange {
    pub label: String,
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
}

/// An answer: a single string, or an ordered list for multi-select fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            FieldValue::Text(_) => None,
        }
    }
}

// ============================================================================
// Field
// ============================================================================

/// A single question.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<FieldOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_scale_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radio_option_set_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_select_option_set_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_option_set_id: Option<String>,
    #[serde(default)]
    pub validation: Vec<ValidationRule>,
    #[serde(default)]
    pub label_history: Vec<LabelChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldValue>,
}

impl Field {
    pub fn new(id: impl Into<String>, field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field_type,
            label: label.into(),
            placeholder: None,
            required: false,
            options: Vec::new(),
            rating_scale_id: None,
            radio_option_set_id: None,
            multi_select_option_set_id: None,
            select_option_set_id: None,
            validation: Vec::new(),
            label_history: Vec::new(),
            default_value: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation.push(rule);
        self
    }

    pub fn with_option_set(mut self, id: impl Into<String>) -> Self {
        if let Some(kind) = self.field_type.option_set_kind() {
            *self.option_set_slot_mut(kind) = Some(id.into());
        }
        self
    }

    /// The external option set this field renders from, if its type uses one
    /// and the matching reference is set. `None` means inline options.
    pub fn option_set_ref(&self) -> Option<OptionSetRef> {
        let kind = self.field_type.option_set_kind()?;
        self.option_set_slot(kind)
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(|id| OptionSetRef::new(kind, id))
    }

    fn option_set_slot(&self, kind: OptionSetKind) -> &Option<String> {
        match kind {
            OptionSetKind::Rating => &self.rating_scale_id,
            OptionSetKind::Radio => &self.radio_option_set_id,
            OptionSetKind::MultiSelect => &self.multi_select_option_set_id,
            OptionSetKind::Select => &self.select_option_set_id,
        }
    }

    fn option_set_slot_mut(&mut self, kind: OptionSetKind) -> &mut Option<String> {
        match kind {
            OptionSetKind::Rating => &mut self.rating_scale_id,
            OptionSetKind::Radio => &mut self.radio_option_set_id,
            OptionSetKind::MultiSelect => &mut self.multi_select_option_set_id,
            OptionSetKind::Select => &mut self.select_option_set_id,
        }
    }

    /// Change the type and drop every option-set reference the new type can't use.
    pub fn set_field_type(&mut self, field_type: FieldType) {
        let keep = field_type.option_set_kind();
        for kind in [
            OptionSetKind::Rating,
            OptionSetKind::Radio,
            OptionSetKind::MultiSelect,
            OptionSetKind::Select,
        ] {
            if keep != Some(kind) {
                *self.option_set_slot_mut(kind) = None;
            }
        }
        self.field_type = field_type;
    }

    /// Point the field at an option set (`Some`) or back to inline options (`None`).
    /// Returns `false` when the field type takes no option set.
    pub fn set_option_set(&mut self, id: Option<String>) -> bool {
        match self.field_type.option_set_kind() {
            Some(kind) => {
                *self.option_set_slot_mut(kind) = id;
                true
            }
            None => false,
        }
    }

    /// Rename the field, recording the previous label in `label_history`.
    pub fn rename(&mut self, label: impl Into<String>, changed_by: &str) -> bool {
        let label = label.into();
        if label == self.label {
            return false;
        }
        let previous = std::mem::replace(&mut self.label, label);
        self.label_history.push(LabelChange {
            label: previous,
            changed_at: Utc::now(),
            changed_by: changed_by.to_string(),
        });
        true
    }

    /// Apply a partial update. Returns whether anything changed.
    pub fn apply_patch(&mut self, patch: FieldPatch, changed_by: &str) -> bool {
        let before = self.clone();

        if let Some(field_type) = patch.field_type {
            if field_type != self.field_type {
                self.set_field_type(field_type);
            }
        }
        if let Some(label) = patch.label {
            self.rename(label, changed_by);
        }
        if let Some(placeholder) = patch.placeholder {
            self.placeholder = placeholder;
        }
        if let Some(required) = patch.required {
            self.required = required;
        }
        if let Some(options) = patch.options {
            self.options = options;
        }
        if let Some(option_set_id) = patch.option_set_id {
            self.set_option_set(option_set_id);
        }
        if let Some(validation) = patch.validation {
            self.validation = validation;
        }
        if let Some(default_value) = patch.default_value {
            self.default_value = default_value;
        }

        *self != before
    }
}

/// Partial update of a [`Field`]. `None` leaves the attribute untouched; the
/// nested `Option`s allow clearing (`Some(None)`).
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPatch {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub placeholder: Option<Option<String>>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub options: Option<Vec<FieldOption>>,
    /// Option set for the field's (possibly new) type
    #[serde(default)]
    pub option_set_id: Option<Option<String>>,
    #[serde(default)]
    pub validation: Option<Vec<ValidationRule>>,
    #[serde(default)]
    pub default_value: Option<Option<FieldValue>>,
}

// ============================================================================
// Defaults
// ============================================================================

/// Defaults applied to fields created inside a section or subsection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_scale_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_scale_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radio_option_set_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radio_option_set_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_select_option_set_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_select_option_set_name: Option<String>,
}

impl FieldDefaults {
    pub fn for_type(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Change the default type, clearing the reference/name pairs that no
    /// longer match it.
    pub fn set_field_type(&mut self, field_type: Option<FieldType>) {
        let keep = field_type.as_ref().and_then(FieldType::option_set_kind);
        if keep != Some(OptionSetKind::Rating) {
            self.rating_scale_id = None;
            self.rating_scale_name = None;
        }
        if keep != Some(OptionSetKind::Radio) {
            self.radio_option_set_id = None;
            self.radio_option_set_name = None;
        }
        if keep != Some(OptionSetKind::MultiSelect) {
            self.multi_select_option_set_id = None;
            self.multi_select_option_set_name = None;
        }
        self.field_type = field_type;
    }

    /// Assign the option set for `kind`. Returns `false` for kinds defaults
    /// don't carry (select).
    pub fn set_option_set(&mut self, kind: OptionSetKind, id: Option<String>, name: Option<String>) -> bool {
        let (id_slot, name_slot) = match kind {
            OptionSetKind::Rating => (&mut self.rating_scale_id, &mut self.rating_scale_name),
            OptionSetKind::Radio => (&mut self.radio_option_set_id, &mut self.radio_option_set_name),
            OptionSetKind::MultiSelect => (
                &mut self.multi_select_option_set_id,
                &mut self.multi_select_option_set_name,
            ),
            OptionSetKind::Select => return false,
        };
        *id_slot = id;
        *name_slot = name;
        true
    }

    /// The reference stored for `field_type`, if any.
    pub fn reference_for(&self, field_type: &FieldType) -> Option<OptionSetRef> {
        let kind = field_type.option_set_kind()?;
        let id = match kind {
            OptionSetKind::Rating => self.rating_scale_id.as_deref(),
            OptionSetKind::Radio => self.radio_option_set_id.as_deref(),
            OptionSetKind::MultiSelect => self.multi_select_option_set_id.as_deref(),
            OptionSetKind::Select => None,
        }?;
        if id.is_empty() {
            return None;
        }
        Some(OptionSetRef::new(kind, id))
    }
}
