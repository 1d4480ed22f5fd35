//! Store traits consumed by the survey core.
//!
//! The hosted backend implements these; [`super::InMemoryStore`] is the
//! process-local implementation used by the CLI and tests.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::domain::{FieldValue, OptionSet, OptionSetKind, SurveyConfig, SurveyConfigPatch};
use crate::persistence::error::PersistenceError;

/// Answers keyed by descriptive field id (`section_field`).
pub type ResponseMap = BTreeMap<String, FieldValue>;

/// CRUD for survey definitions
#[async_trait]
pub trait SurveyStore: Send + Sync {
    /// Get a survey config by id
    async fn get_survey_config(&self, id: &str) -> Result<Option<SurveyConfig>, PersistenceError>;

    /// List all survey configs
    async fn list_survey_configs(&self) -> Result<Vec<SurveyConfig>, PersistenceError>;

    /// Store a new survey config, returning its id
    async fn add_survey_config(&self, config: SurveyConfig) -> Result<String, PersistenceError>;

    /// Apply a partial update, returning the updated config
    async fn update_survey_config(
        &self,
        id: &str,
        patch: SurveyConfigPatch,
    ) -> Result<SurveyConfig, PersistenceError>;

    /// Delete a survey config; `false` if it did not exist
    async fn delete_survey_config(&self, id: &str) -> Result<bool, PersistenceError>;
}

/// Read access to option sets and rating scales. `Ok(None)` is the not-found signal.
#[async_trait]
pub trait OptionSetStore: Send + Sync {
    async fn get_option_set(
        &self,
        kind: OptionSetKind,
        id: &str,
    ) -> Result<Option<OptionSet>, PersistenceError>;

    async fn get_rating_scale(&self, id: &str) -> Result<Option<OptionSet>, PersistenceError> {
        self.get_option_set(OptionSetKind::Rating, id).await
    }

    async fn get_radio_option_set(&self, id: &str) -> Result<Option<OptionSet>, PersistenceError> {
        self.get_option_set(OptionSetKind::Radio, id).await
    }

    async fn get_multi_select_option_set(&self, id: &str) -> Result<Option<OptionSet>, PersistenceError> {
        self.get_option_set(OptionSetKind::MultiSelect, id).await
    }

    async fn get_select_option_set(&self, id: &str) -> Result<Option<OptionSet>, PersistenceError> {
        self.get_option_set(OptionSetKind::Select, id).await
    }
}

/// Sink for submitted responses
#[async_trait]
pub trait ResponseStore: Send + Sync {
    async fn add_survey_response(
        &self,
        instance_id: &str,
        responses: ResponseMap,
    ) -> Result<(), PersistenceError>;
}
