//! Field → UI description, and UI event → field value.
//!
//! The renderer is pure: it never touches the state store. The UI layer turns
//! a [`RenderedField`] into widgets and feeds user events back through
//! [`on_user_input`].

use serde::Serialize;
use thiserror::Error;

use crate::domain::{Field, FieldType, FieldValue, RuleKind};
use crate::resolver::ResolvedOptions;

use super::submission::check_rule;

/// The schema names a field type this renderer does not implement.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unsupported field type: {0}")]
pub struct UnsupportedFieldType(pub String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error(transparent)]
    Unsupported(#[from] UnsupportedFieldType),

    #[error("Event '{event}' does not apply to a {field_type} field")]
    EventMismatch { field_type: String, event: &'static str },
}

/// Raw UI event for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Typed text
    Text(String),
    /// Picked a single option
    Select(String),
    /// Toggled an option in a multi-select
    Toggle(String),
    /// Cleared the control
    Clear,
}

impl InputEvent {
    fn name(&self) -> &'static str {
        match self {
            InputEvent::Text(_) => "text",
            InputEvent::Select(_) => "select",
            InputEvent::Toggle(_) => "toggle",
            InputEvent::Clear => "clear",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextInputKind {
    Text,
    Email,
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedOption {
    pub value: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "control", rename_all = "camelCase")]
pub enum RenderedControl {
    TextInput { kind: TextInputKind, value: String },
    TextArea { value: String },
    RadioGroup { options: Vec<RenderedOption>, selected: Option<String> },
    Select { options: Vec<RenderedOption>, selected: Option<String> },
    MultiSelect { options: Vec<RenderedOption>, selected: Vec<String>, dropdown: bool },
    RatingDropdown { options: Vec<RenderedOption>, selected: Option<String> },
    /// Option set still loading
    Loading,
    /// Option set failed to load
    LoadFailed,
    /// Visible placeholder for a type this renderer does not implement
    Unsupported { field_type: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedField {
    pub field_id: String,
    pub label: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub control: RenderedControl,
}

fn single_selection(value: Option<&FieldValue>) -> Option<String> {
    value
        .and_then(FieldValue::as_text)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn render_options(resolved: &ResolvedOptions, is_selected: impl Fn(&str) -> bool) -> Vec<RenderedOption> {
    resolved
        .options
        .iter()
        .map(|o| RenderedOption {
            value: o.value.clone(),
            label: o.label.clone(),
            color: o.color.clone(),
            selected: is_selected(&o.value),
        })
        .collect()
}

/// Informational min/max selection check for multi-select fields.
pub fn selection_constraint_error(field: &Field, selected: &[String]) -> Option<String> {
    let value = FieldValue::List(selected.to_vec());
    field
        .validation
        .iter()
        .filter(|rule| matches!(rule.kind, RuleKind::MinSelections | RuleKind::MaxSelections))
        .find_map(|rule| {
            check_rule(rule, Some(&value))
                .err()
                .map(|e| rule.message.clone().unwrap_or_else(|| e.to_string()))
        })
}

/// Describe how `field` should be shown.
pub fn render(
    field: &Field,
    value: Option<&FieldValue>,
    error: Option<&str>,
    resolved: &ResolvedOptions,
) -> RenderedField {
    let mut error = error.map(String::from);

    let control = if field.field_type.is_selection() && resolved.loading {
        RenderedControl::Loading
    } else if field.field_type.is_selection() && resolved.failed {
        RenderedControl::LoadFailed
    } else {
        match &field.field_type {
            FieldType::Text | FieldType::Email | FieldType::Number => RenderedControl::TextInput {
                kind: match field.field_type {
                    FieldType::Email => TextInputKind::Email,
                    FieldType::Number => TextInputKind::Number,
                    _ => TextInputKind::Text,
                },
                value: single_selection(value).unwrap_or_default(),
            },
            FieldType::Textarea => RenderedControl::TextArea {
                value: single_selection(value).unwrap_or_default(),
            },
            FieldType::Radio | FieldType::Select | FieldType::Rating => {
                let selected = single_selection(value);
                let options = render_options(resolved, |v| selected.as_deref() == Some(v));
                match field.field_type {
                    FieldType::Radio => RenderedControl::RadioGroup { options, selected },
                    FieldType::Select => RenderedControl::Select { options, selected },
                    _ => RenderedControl::RatingDropdown { options, selected },
                }
            }
            FieldType::MultiSelect | FieldType::MultiSelectDropdown => {
                let selected: Vec<String> = value
                    .and_then(FieldValue::as_list)
                    .map(<[String]>::to_vec)
                    .unwrap_or_default();
                if error.is_none() {
                    error = selection_constraint_error(field, &selected);
                }
                RenderedControl::MultiSelect {
                    options: render_options(resolved, |v| selected.iter().any(|s| s == v)),
                    dropdown: field.field_type == FieldType::MultiSelectDropdown,
                    selected,
                }
            }
            FieldType::Unsupported(name) => RenderedControl::Unsupported {
                field_type: name.clone(),
            },
        }
    };

    RenderedField {
        field_id: field.id.clone(),
        label: field.label.clone(),
        required: field.required,
        placeholder: field.placeholder.clone(),
        error,
        control,
    }
}

/// Add `value` if absent, remove it if present; other selections keep their order.
pub fn toggle_selection(current: &[String], value: &str) -> Vec<String> {
    if current.iter().any(|v| v == value) {
        current.iter().filter(|v| *v != value).cloned().collect()
    } else {
        let mut next = current.to_vec();
        next.push(value.to_string());
        next
    }
}

/// Turn a UI event into the field's new value.
pub fn on_user_input(
    field: &Field,
    current: Option<&FieldValue>,
    event: InputEvent,
) -> Result<FieldValue, InputError> {
    let mismatch = |event: &InputEvent| InputError::EventMismatch {
        field_type: field.field_type.to_string(),
        event: event.name(),
    };

    match &field.field_type {
        FieldType::Unsupported(name) => Err(UnsupportedFieldType(name.clone()).into()),
        FieldType::Text | FieldType::Textarea | FieldType::Email | FieldType::Number => match event {
            InputEvent::Text(text) => Ok(FieldValue::Text(text)),
            InputEvent::Clear => Ok(FieldValue::Text(String::new())),
            other => Err(mismatch(&other)),
        },
        FieldType::Radio | FieldType::Select | FieldType::Rating => match event {
            InputEvent::Select(value) => Ok(FieldValue::Text(value)),
            InputEvent::Clear => Ok(FieldValue::Text(String::new())),
            other => Err(mismatch(&other)),
        },
        FieldType::MultiSelect | FieldType::MultiSelectDropdown => match event {
            InputEvent::Toggle(value) => {
                let current = current.and_then(FieldValue::as_list).unwrap_or_default();
                Ok(FieldValue::List(toggle_selection(current, &value)))
            }
            InputEvent::Clear => Ok(FieldValue::List(Vec::new())),
            other => Err(mismatch(&other)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldOption, ValidationRule};

    fn ready(options: Vec<FieldOption>) -> ResolvedOptions {
        ResolvedOptions {
            options,
            loading: false,
            failed: false,
        }
    }

    fn yes_no() -> Vec<FieldOption> {
        vec![FieldOption::new("Yes", "yes"), FieldOption::new("No", "no")]
    }

    #[test]
    fn test_inline_radio_renders_and_accepts_value() {
        let field = Field::new("f", FieldType::Radio, "Agree?").with_options(yes_no());

        let value = on_user_input(&field, None, InputEvent::Select("yes".into())).unwrap();
        assert_eq!(value, FieldValue::text("yes"));

        let rendered = render(&field, Some(&value), None, &ready(yes_no()));
        match rendered.control {
            RenderedControl::RadioGroup { options, selected } => {
                assert_eq!(options.len(), 2);
                assert!(options[0].selected);
                assert!(!options[1].selected);
                assert_eq!(selected.as_deref(), Some("yes"));
            }
            other => panic!("Expected radio group, got {:?}", other),
        }
    }

    #[test]
    fn test_toggle_twice_restores_list() {
        let field = Field::new("f", FieldType::MultiSelect, "Tags");
        let original = FieldValue::List(vec!["b".into(), "a".into(), "c".into()]);

        for option in ["a", "z"] {
            let once = on_user_input(&field, Some(&original), InputEvent::Toggle(option.into())).unwrap();
            let twice = on_user_input(&field, Some(&once), InputEvent::Toggle(option.into())).unwrap();
            assert_eq!(twice, original);
        }
    }

    #[test]
    fn test_toggle_preserves_relative_order() {
        assert_eq!(
            toggle_selection(&["a".into(), "b".into(), "c".into()], "b"),
            vec!["a".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_selection_constraints_are_informational() {
        let field = Field::new("f", FieldType::MultiSelect, "Tags")
            .with_options(yes_no())
            .with_rule(ValidationRule::new(RuleKind::MaxSelections).with_bound(1));
        let value = FieldValue::List(vec!["yes".into(), "no".into()]);

        let rendered = render(&field, Some(&value), None, &ready(yes_no()));
        assert_eq!(rendered.error.as_deref(), Some("Select at most 1 options"));
        match rendered.control {
            RenderedControl::MultiSelect { options, .. } => assert!(options.iter().all(|o| o.selected)),
            other => panic!("Expected multi select, got {:?}", other),
        }
    }

    #[test]
    fn test_loading_and_failed_controls() {
        let field = Field::new("f", FieldType::Rating, "Rate").with_option_set("rs1");
        let loading = ResolvedOptions {
            loading: true,
            ..Default::default()
        };
        let failed = ResolvedOptions {
            failed: true,
            ..Default::default()
        };

        assert_eq!(render(&field, None, None, &loading).control, RenderedControl::Loading);
        assert_eq!(render(&field, None, None, &failed).control, RenderedControl::LoadFailed);
    }

    #[test]
    fn test_unsupported_type_renders_placeholder() {
        let field = Field::new("f", FieldType::parse("signature"), "Sign");

        let rendered = render(&field, None, None, &ready(vec![]));
        assert_eq!(
            rendered.control,
            RenderedControl::Unsupported {
                field_type: "signature".into()
            }
        );
        assert_eq!(
            on_user_input(&field, None, InputEvent::Text("x".into())),
            Err(InputError::Unsupported(UnsupportedFieldType("signature".into())))
        );
    }

    #[test]
    fn test_event_mismatch() {
        let field = Field::new("f", FieldType::Text, "Name");
        assert!(matches!(
            on_user_input(&field, None, InputEvent::Toggle("x".into())),
            Err(InputError::EventMismatch { .. })
        ));
    }

    #[test]
    fn test_text_value_passes_through() {
        let field = Field::new("f", FieldType::Number, "Age");
        let value = on_user_input(&field, None, InputEvent::Text(" 42 ".into())).unwrap();
        assert_eq!(value, FieldValue::text(" 42 "));

        let rendered = render(&field, Some(&value), Some("bad"), &ready(vec![]));
        assert_eq!(rendered.error.as_deref(), Some("bad"));
        assert_eq!(
            rendered.control,
            RenderedControl::TextInput {
                kind: TextInputKind::Number,
                value: " 42 ".into()
            }
        );
    }
}
