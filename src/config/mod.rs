use config::{Config, File};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub mod validator;

use crate::cli::Cli;
use crate::domain::{OptionSet, SurveyConfig, SurveyConfigPatch};
use crate::form::{survey_autosave, Debouncer};
use crate::persistence::{InMemoryStore, SurveyStore};
use crate::transfer::restore_value;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub form: FormSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormSettings {
    /// Quiet period before a debounced edit is written
    pub debounce_ms: u64,
    /// Recorded in label history for edits made through the CLI
    pub changed_by: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Directory of survey documents (`*.json`, `*.yaml`, `*.yml`)
    pub survey_dir: String,
    /// Directory of option-set documents; option sets are optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_set_dir: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    /// Create settings from CLI arguments (config file, then CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let config_path = &cli.config;
        let root = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let mut settings = Self::build(config_path.clone())?;
        settings.resolve_dirs(&root);

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        let root = Path::new(root);
        let mut settings = Self::build(root.join("surveyor"))?;
        settings.resolve_dirs(root);
        settings.validate()?;
        Ok(settings)
    }

    fn build(config_path: PathBuf) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::from(config_path).required(false))
            .set_default("form.debounce_ms", 300)?
            .set_default("form.changed_by", "admin")?
            .set_default("storage.survey_dir", "surveys")?
            .build()?;
        Ok(s.try_deserialize()?)
    }

    /// Relative storage directories are relative to the config file.
    fn resolve_dirs(&mut self, root: &Path) {
        let resolve = |dir: &str| -> String {
            let path = Path::new(dir);
            if path.is_absolute() {
                dir.to_string()
            } else {
                root.join(path).to_string_lossy().into_owned()
            }
        };
        self.storage.survey_dir = resolve(&self.storage.survey_dir);
        self.storage.option_set_dir = self.storage.option_set_dir.as_deref().map(resolve);
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.survey_dir {
            self.storage.survey_dir = dir.to_string_lossy().into_owned();
        }
        if let Some(dir) = &cli.option_set_dir {
            self.storage.option_set_dir = Some(dir.to_string_lossy().into_owned());
        }
        if let Some(changed_by) = &cli.changed_by {
            self.form.changed_by = changed_by.clone();
        }
        if let Some(debounce_ms) = cli.debounce_ms {
            self.form.debounce_ms = debounce_ms;
        }
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        validator::ConfigValidator::validate(self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })
    }

    /// Quiet period for debounced edits.
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.form.debounce_ms)
    }

    /// Debounced survey autosave on `store`, windowed by `form.debounce_ms`.
    pub fn survey_autosave(&self, store: Arc<dyn SurveyStore>) -> Debouncer<String, SurveyConfigPatch> {
        survey_autosave(store, self.autosave_delay())
    }

    pub fn to_toml_string(&self) -> Result<String, anyhow::Error> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Every survey document in `storage.survey_dir`, sorted by file name.
    pub fn load_surveys(&self) -> Result<Vec<SurveyConfig>, anyhow::Error> {
        let mut surveys = Vec::new();
        for path in document_paths(&self.storage.survey_dir)? {
            let doc = read_document(&path)?;
            let survey = restore_value(doc)
                .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
            surveys.push(survey);
        }
        Ok(surveys)
    }

    /// Every option-set document in `storage.option_set_dir`.
    pub fn load_option_sets(&self) -> Result<Vec<OptionSet>, anyhow::Error> {
        let Some(dir) = &self.storage.option_set_dir else {
            return Ok(Vec::new());
        };
        let mut sets = Vec::new();
        for path in document_paths(dir)? {
            let set: OptionSet = serde_json::from_value(read_document(&path)?)
                .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
            sets.push(set);
        }
        Ok(sets)
    }

    /// Load surveys and option sets from disk into `store`.
    pub async fn seed_store(&self, store: &InMemoryStore) -> Result<(usize, usize), anyhow::Error> {
        let surveys = self.load_surveys()?;
        let sets = self.load_option_sets()?;
        let counts = (surveys.len(), sets.len());

        for survey in surveys {
            store.add_survey_config(survey).await?;
        }
        for set in sets {
            store.insert_option_set(set).await;
        }

        info!(
            "Loaded {} surveys and {} option sets from {}",
            counts.0, counts.1, self.storage.survey_dir
        );
        Ok(counts)
    }
}

fn document_paths(dir: &str) -> Result<Vec<PathBuf>, anyhow::Error> {
    let pattern = format!("{}/*", dir);
    let mut paths = Vec::new();
    for entry in glob::glob(&pattern)? {
        match entry {
            Ok(path) => {
                if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                    if matches!(ext, "json" | "yaml" | "yml") {
                        paths.push(path);
                    }
                }
            }
            Err(e) => warn!("Failed to read glob entry: {}", e),
        }
    }
    paths.sort();
    Ok(paths)
}

/// Read a JSON or YAML document into a JSON value, by file extension.
pub fn read_document(path: &Path) -> Result<Value, anyhow::Error> {
    let content = std::fs::read_to_string(path)?;
    let doc = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&content)?,
        _ => serde_json::from_str(&content)?,
    };
    Ok(doc)
}
