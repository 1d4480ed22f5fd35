//! Survey aggregate: config → sections → subsections → fields.
//!
//! The editing methods here are the admin-side mutations; new fields pick up
//! their type and option set through [`resolve_field_defaults`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::field::{Field, FieldDefaults, FieldPatch};
use super::generate_id;
use super::slug::section_type;
use crate::resolver::defaults::resolve_field_defaults;

// ============================================================================
// Subsection
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subsection {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<FieldDefaults>,
}

impl Subsection {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            fields: Vec::new(),
            defaults: None,
        }
    }

    pub fn with_defaults(mut self, defaults: FieldDefaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    pub fn field_mut(&mut self, field_id: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.id == field_id)
    }

    pub fn remove_field(&mut self, field_id: &str) -> Option<Field> {
        let idx = self.fields.iter().position(|f| f.id == field_id)?;
        Some(self.fields.remove(idx))
    }
}

// ============================================================================
// Section
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Derived from `title`, see [`section_type`]
    #[serde(rename = "type", default)]
    pub section_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub subsections: Vec<Subsection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<FieldDefaults>,
    #[serde(default)]
    pub order: u32,
}

impl Section {
    pub fn new(id: impl Into<String>, title: impl Into<String>, order: u32) -> Self {
        let title = title.into();
        Self {
            id: id.into(),
            section_type: section_type(&title),
            title,
            description: String::new(),
            fields: Vec::new(),
            subsections: Vec::new(),
            defaults: None,
            order,
        }
    }

    pub fn with_defaults(mut self, defaults: FieldDefaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_subsection(mut self, subsection: Subsection) -> Self {
        self.subsections.push(subsection);
        self
    }

    /// Retitle the section; the type follows the title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.refresh_type();
    }

    pub fn refresh_type(&mut self) {
        self.section_type = section_type(&self.title);
    }

    /// Create a field directly in the section using the section defaults.
    pub fn add_field(&mut self, label: impl Into<String>) -> &mut Field {
        let resolved = resolve_field_defaults(self, None);
        let field = resolved.build_field(generate_id(), label);
        self.fields.push(field);
        let idx = self.fields.len() - 1;
        &mut self.fields[idx]
    }

    pub fn add_subsection(&mut self, title: impl Into<String>) -> &mut Subsection {
        self.subsections.push(Subsection::new(generate_id(), title));
        let idx = self.subsections.len() - 1;
        &mut self.subsections[idx]
    }

    /// Create a field inside a subsection, resolving subsection then section defaults.
    pub fn add_subsection_field(&mut self, subsection_id: &str, label: impl Into<String>) -> Option<&mut Field> {
        let idx = self.subsections.iter().position(|s| s.id == subsection_id)?;
        let resolved = resolve_field_defaults(self, Some(&self.subsections[idx]));
        let field = resolved.build_field(generate_id(), label);
        let subsection = &mut self.subsections[idx];
        subsection.fields.push(field);
        subsection.fields.last_mut()
    }

    pub fn subsection(&self, subsection_id: &str) -> Option<&Subsection> {
        self.subsections.iter().find(|s| s.id == subsection_id)
    }

    pub fn subsection_mut(&mut self, subsection_id: &str) -> Option<&mut Subsection> {
        self.subsections.iter_mut().find(|s| s.id == subsection_id)
    }

    pub fn remove_subsection(&mut self, subsection_id: &str) -> Option<Subsection> {
        let idx = self.subsections.iter().position(|s| s.id == subsection_id)?;
        Some(self.subsections.remove(idx))
    }

    /// Section fields first, then each subsection's fields in order.
    pub fn fields_in_order(&self) -> impl Iterator<Item = &Field> {
        self.fields
            .iter()
            .chain(self.subsections.iter().flat_map(|s| s.fields.iter()))
    }

    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.fields_in_order().find(|f| f.id == field_id)
    }

    pub fn field_mut(&mut self, field_id: &str) -> Option<&mut Field> {
        self.fields
            .iter_mut()
            .chain(self.subsections.iter_mut().flat_map(|s| s.fields.iter_mut()))
            .find(|f| f.id == field_id)
    }

    pub fn remove_field(&mut self, field_id: &str) -> Option<Field> {
        if let Some(idx) = self.fields.iter().position(|f| f.id == field_id) {
            return Some(self.fields.remove(idx));
        }
        self.subsections.iter_mut().find_map(|s| s.remove_field(field_id))
    }
}

// ============================================================================
// Paginator / Footer
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginatorConfig {
    pub enabled: bool,
    /// Fields per page; `None` paginates by section
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields_per_page: Option<u32>,
    pub previous_label: String,
    pub next_label: String,
    pub submit_label: String,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            fields_per_page: None,
            previous_label: "Previous".to_string(),
            next_label: "Next".to_string(),
            submit_label: "Submit".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FooterConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub links: Vec<FooterLink>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FooterLink {
    pub label: String,
    pub url: String,
}

// ============================================================================
// Survey Config
// ============================================================================

fn default_version() -> u32 {
    1
}

/// Root aggregate of a survey definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyConfig {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub paginator_config: PaginatorConfig,
    #[serde(default)]
    pub footer_config: FooterConfig,
}

impl SurveyConfig {
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(generate_id(), title)
    }

    pub fn with_id(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            sections: Vec::new(),
            version: default_version(),
            paginator_config: PaginatorConfig::default(),
            footer_config: FooterConfig::default(),
        }
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Append a section after the current last one in render order.
    pub fn add_section(&mut self, title: impl Into<String>) -> &mut Section {
        let order = self
            .sections
            .iter()
            .map(|s| s.order.saturating_add(1))
            .max()
            .unwrap_or(0);
        self.sections.push(Section::new(generate_id(), title, order));
        let idx = self.sections.len() - 1;
        &mut self.sections[idx]
    }

    pub fn remove_section(&mut self, section_id: &str) -> Option<Section> {
        let idx = self.sections.iter().position(|s| s.id == section_id)?;
        Some(self.sections.remove(idx))
    }

    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    pub fn section_mut(&mut self, section_id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == section_id)
    }

    /// Sections by ascending `order`; ties keep their stored position.
    pub fn sorted_sections(&self) -> Vec<&Section> {
        let mut sections: Vec<&Section> = self.sections.iter().collect();
        sections.sort_by_key(|s| s.order);
        sections
    }

    /// Reassign `order` from the position of each id in `section_ids`.
    /// Every id must name an existing section; otherwise nothing changes.
    pub fn reorder_sections(&mut self, section_ids: &[&str]) -> bool {
        if section_ids.iter().any(|id| self.section(id).is_none()) {
            return false;
        }
        let listed = section_ids.len();
        let mut trailing = 0u32;
        for section in &mut self.sections {
            match section_ids.iter().position(|id| *id == section.id) {
                Some(pos) => section.order = u32::try_from(pos).unwrap_or(u32::MAX),
                None => {
                    section.order = u32::try_from(listed).unwrap_or(u32::MAX).saturating_add(trailing);
                    trailing += 1;
                }
            }
        }
        true
    }

    /// Every field paired with its section, in render/validation order.
    pub fn fields_in_order(&self) -> Vec<(&Section, &Field)> {
        self.sorted_sections()
            .into_iter()
            .flat_map(|section| section.fields_in_order().map(move |field| (section, field)))
            .collect()
    }

    pub fn field_count(&self) -> usize {
        self.sections.iter().map(|s| s.fields_in_order().count()).sum()
    }

    pub fn find_field(&self, field_id: &str) -> Option<&Field> {
        self.sections.iter().find_map(|s| s.field(field_id))
    }

    pub fn find_field_mut(&mut self, field_id: &str) -> Option<&mut Field> {
        self.sections.iter_mut().find_map(|s| s.field_mut(field_id))
    }

    /// Partially update a field anywhere in the survey.
    pub fn update_field(&mut self, field_id: &str, patch: FieldPatch, changed_by: &str) -> bool {
        self.find_field_mut(field_id)
            .map(|field| field.apply_patch(patch, changed_by))
            .unwrap_or(false)
    }

    pub fn remove_field(&mut self, field_id: &str) -> Option<Field> {
        self.sections.iter_mut().find_map(|s| s.remove_field(field_id))
    }

    pub fn apply_patch(&mut self, patch: SurveyConfigPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(sections) = patch.sections {
            self.sections = sections;
            for section in &mut self.sections {
                section.refresh_type();
            }
        }
        if let Some(version) = patch.version {
            self.version = version;
        }
        if let Some(paginator_config) = patch.paginator_config {
            self.paginator_config = paginator_config;
        }
        if let Some(footer_config) = patch.footer_config {
            self.footer_config = footer_config;
        }
    }
}

/// Partial update of a [`SurveyConfig`] as accepted by `update_survey_config`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyConfigPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sections: Option<Vec<Section>>,
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub paginator_config: Option<PaginatorConfig>,
    #[serde(default)]
    pub footer_config: Option<FooterConfig>,
}
