//! Survey schema domain.
//!
//! Plain data for survey configs, sections, subsections, fields and option
//! sets, plus the admin-side editing operations on them.

pub mod field;
pub mod option_set;
pub mod slug;
pub mod survey;

pub use field::{
    Field, FieldDefaults, FieldOption, FieldPatch, FieldType, FieldValue, LabelChange, RuleKind,
    ValidationRule,
};
pub use option_set::{OptionSet, OptionSetKind, OptionSetRef};
pub use survey::{
    FooterConfig, FooterLink, PaginatorConfig, Section, Subsection, SurveyConfig, SurveyConfigPatch,
};

/// Fresh identifier for entities created by an admin action.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
