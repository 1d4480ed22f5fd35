use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{FooterConfig, PaginatorConfig, Section, SurveyConfig};

/// Portable survey document. Carries everything but the config id, which
/// the importing side assigns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub sections: Vec<Section>,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub paginator_config: PaginatorConfig,
    #[serde(default)]
    pub footer_config: FooterConfig,
}

fn default_version() -> u32 {
    1
}

impl From<&SurveyConfig> for ExportDocument {
    fn from(config: &SurveyConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            sections: config.sections.clone(),
            version: config.version,
            paginator_config: config.paginator_config.clone(),
            footer_config: config.footer_config.clone(),
        }
    }
}

pub fn export_config(config: &SurveyConfig) -> ExportDocument {
    ExportDocument::from(config)
}

/// Pretty-printed JSON export of `config`.
pub fn to_json_string(config: &SurveyConfig) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&export_config(config))
}

/// JSON Schema of the import/export document.
pub fn schema_json() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&schemars::schema_for!(ExportDocument))
}
