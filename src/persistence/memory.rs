use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::{OptionSet, OptionSetKind, SurveyConfig, SurveyConfigPatch};
use crate::persistence::error::PersistenceError;
use crate::persistence::repository::{OptionSetStore, ResponseMap, ResponseStore, SurveyStore};

/// One stored submission.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResponse {
    pub instance_id: String,
    pub responses: ResponseMap,
    pub submitted_at: DateTime<Utc>,
}

/// Process-local implementation of every store trait.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    surveys: Arc<RwLock<Vec<SurveyConfig>>>,
    option_sets: Arc<RwLock<HashMap<(OptionSetKind, String), OptionSet>>>,
    responses: Arc<RwLock<Vec<StoredResponse>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_option_set(&self, set: OptionSet) {
        let mut sets = self.option_sets.write().await;
        sets.insert((set.kind, set.id.clone()), set);
    }

    /// All responses stored for a survey instance, oldest first.
    pub async fn responses_for(&self, instance_id: &str) -> Vec<StoredResponse> {
        let responses = self.responses.read().await;
        responses
            .iter()
            .filter(|r| r.instance_id == instance_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SurveyStore for InMemoryStore {
    async fn get_survey_config(&self, id: &str) -> Result<Option<SurveyConfig>, PersistenceError> {
        let surveys = self.surveys.read().await;
        Ok(surveys.iter().find(|s| s.id == id).cloned())
    }

    async fn list_survey_configs(&self) -> Result<Vec<SurveyConfig>, PersistenceError> {
        Ok(self.surveys.read().await.clone())
    }

    async fn add_survey_config(&self, config: SurveyConfig) -> Result<String, PersistenceError> {
        let mut surveys = self.surveys.write().await;
        if surveys.iter().any(|s| s.id == config.id) {
            return Err(PersistenceError::Duplicate {
                entity_type: "survey_config".to_string(),
                id: config.id,
            });
        }
        let id = config.id.clone();
        info!("Stored survey config '{}' ({})", config.title, id);
        surveys.push(config);
        Ok(id)
    }

    async fn update_survey_config(
        &self,
        id: &str,
        patch: SurveyConfigPatch,
    ) -> Result<SurveyConfig, PersistenceError> {
        let mut surveys = self.surveys.write().await;
        let survey = surveys
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| PersistenceError::not_found("survey_config", id))?;
        survey.apply_patch(patch);
        debug!("Updated survey config {}", id);
        Ok(survey.clone())
    }

    async fn delete_survey_config(&self, id: &str) -> Result<bool, PersistenceError> {
        let mut surveys = self.surveys.write().await;
        let before = surveys.len();
        surveys.retain(|s| s.id != id);
        Ok(surveys.len() != before)
    }
}

#[async_trait]
impl OptionSetStore for InMemoryStore {
    async fn get_option_set(
        &self,
        kind: OptionSetKind,
        id: &str,
    ) -> Result<Option<OptionSet>, PersistenceError> {
        let sets = self.option_sets.read().await;
        Ok(sets.get(&(kind, id.to_string())).cloned())
    }
}

#[async_trait]
impl ResponseStore for InMemoryStore {
    async fn add_survey_response(
        &self,
        instance_id: &str,
        responses: ResponseMap,
    ) -> Result<(), PersistenceError> {
        let mut stored = self.responses.write().await;
        stored.push(StoredResponse {
            instance_id: instance_id.to_string(),
            responses,
            submitted_at: Utc::now(),
        });
        Ok(())
    }
}
