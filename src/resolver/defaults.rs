//! Field default resolution along the request → subsection → section chain.
//!
//! Only the most specific level that names a field type applies, and it
//! brings its own option-set reference (or none) with it. Levels are never
//! merged: a subsection that picks `rating` without a rating scale yields
//! inline options even if the section carries a rating scale.

use tracing::debug;

use crate::domain::{Field, FieldDefaults, FieldType, OptionSetRef, Section, Subsection};

/// Where a resolution came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefaultsSource {
    Request,
    Subsection,
    Section,
    Fallback,
}

/// Effective type and option set for a field about to be created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedDefaults {
    pub field_type: FieldType,
    pub option_set_ref: Option<OptionSetRef>,
    pub source: DefaultsSource,
}

impl ResolvedDefaults {
    fn fallback() -> Self {
        Self {
            field_type: FieldType::Text,
            option_set_ref: None,
            source: DefaultsSource::Fallback,
        }
    }

    /// Build a new field carrying this resolution.
    pub fn build_field(&self, id: impl Into<String>, label: impl Into<String>) -> Field {
        let field = Field::new(id, self.field_type.clone(), label);
        match &self.option_set_ref {
            Some(reference) => field.with_option_set(reference.id.clone()),
            None => field,
        }
    }
}

/// Explicit choices made in the field-creation request itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldRequest {
    pub field_type: Option<FieldType>,
    pub option_set_id: Option<String>,
}

fn from_level(defaults: Option<&FieldDefaults>, source: DefaultsSource) -> Option<ResolvedDefaults> {
    let defaults = defaults?;
    let field_type = defaults.field_type.clone()?;
    Some(ResolvedDefaults {
        option_set_ref: defaults.reference_for(&field_type),
        field_type,
        source,
    })
}

/// Resolve the type and option set for a new field in `section` (optionally
/// inside `subsection`). Total: falls back to `text`.
pub fn resolve_field_defaults(section: &Section, subsection: Option<&Subsection>) -> ResolvedDefaults {
    resolve_for_request(&FieldRequest::default(), section, subsection)
}

/// Like [`resolve_field_defaults`], with the request's own choice taking precedence.
pub fn resolve_for_request(
    request: &FieldRequest,
    section: &Section,
    subsection: Option<&Subsection>,
) -> ResolvedDefaults {
    let resolved = request
        .field_type
        .clone()
        .map(|field_type| ResolvedDefaults {
            option_set_ref: field_type.option_set_kind().and_then(|kind| {
                request
                    .option_set_id
                    .as_deref()
                    .filter(|id| !id.is_empty())
                    .map(|id| OptionSetRef::new(kind, id))
            }),
            field_type,
            source: DefaultsSource::Request,
        })
        .or_else(|| from_level(subsection.and_then(|s| s.defaults.as_ref()), DefaultsSource::Subsection))
        .or_else(|| from_level(section.defaults.as_ref(), DefaultsSource::Section))
        .unwrap_or_else(ResolvedDefaults::fallback);

    debug!(
        section = %section.id,
        subsection = subsection.map(|s| s.id.as_str()).unwrap_or("-"),
        field_type = %resolved.field_type,
        source = ?resolved.source,
        "Resolved field defaults"
    );

    resolved
}
