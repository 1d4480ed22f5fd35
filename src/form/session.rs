//! One rendered survey: the active config, its answers and the option-set cache.

use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::{FieldValue, OptionSetRef, SurveyConfig};
use crate::persistence::ResponseStore;
use crate::resolver::{resolve_options, LoadOutcome, OptionSetCache, OptionSetLoader};

use super::renderer::{on_user_input, render, InputError, InputEvent, RenderedField};
use super::state::FormStateStore;
use super::submission::{submit, SubmissionError, SubmissionReceipt};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error(transparent)]
    Input(#[from] InputError),
}

/// Owned by a single task. Dropping the session drops its cache handle, which
/// turns any option-set fetch still in flight into a no-op.
pub struct FormSession {
    config: SurveyConfig,
    store: FormStateStore,
    cache: Arc<dyn OptionSetCache>,
}

impl FormSession {
    pub fn new(config: SurveyConfig, cache: Arc<dyn OptionSetCache>) -> Self {
        let mut store = FormStateStore::new();
        store.initialize(&config, cache.as_ref());
        Self { config, store, cache }
    }

    pub fn config(&self) -> &SurveyConfig {
        &self.config
    }

    pub fn store(&self) -> &FormStateStore {
        &self.store
    }

    pub fn cache(&self) -> &Arc<dyn OptionSetCache> {
        &self.cache
    }

    /// Swap in a config. The form is re-initialized only when the survey
    /// identity changed; returns whether that happened.
    pub fn load_config(&mut self, config: SurveyConfig) -> bool {
        let changed = config.id != self.config.id;
        self.config = config;
        if changed {
            info!("Active survey changed to {}", self.config.id);
            self.store.initialize(&self.config, self.cache.as_ref());
        }
        changed
    }

    /// Reset signal: clear and re-seed without reloading the config.
    pub fn reset(&mut self) {
        self.store.initialize(&self.config, self.cache.as_ref());
    }

    /// Distinct option sets referenced by the survey, in field order.
    pub fn option_set_refs(&self) -> Vec<OptionSetRef> {
        let mut seen = HashSet::new();
        self.config
            .fields_in_order()
            .into_iter()
            .filter_map(|(_, field)| field.option_set_ref())
            .filter(|key| seen.insert(key.clone()))
            .collect()
    }

    /// Apply option-set defaults that became available since the last call.
    /// Returns how many fields got a value.
    pub fn sync_option_defaults(&mut self) -> usize {
        let mut applied = 0;
        for (_, field) in self.config.fields_in_order() {
            if self.store.default_applied(&field.id) {
                continue;
            }
            let resolved = resolve_options(field, self.cache.as_ref());
            if resolved.is_ready() && self.store.apply_option_default(&field.id, &resolved.options) {
                applied += 1;
            }
        }
        if applied > 0 {
            debug!("Applied {} late option defaults", applied);
        }
        applied
    }

    /// Fetch every referenced option set, then apply late defaults.
    pub async fn load_option_sets(&mut self, loader: &OptionSetLoader) -> Vec<LoadOutcome> {
        let outcomes = loader.load_all(&self.cache, self.option_set_refs()).await;
        self.sync_option_defaults();
        outcomes
    }

    /// Background variant of [`Self::load_option_sets`]; call
    /// [`Self::sync_option_defaults`] once the handles complete.
    pub fn spawn_option_set_loads(&self, loader: &OptionSetLoader) -> Vec<JoinHandle<LoadOutcome>> {
        loader.spawn_all(&self.cache, self.option_set_refs())
    }

    pub fn render_field(&self, field_id: &str) -> Option<RenderedField> {
        let field = self.config.find_field(field_id)?;
        Some(render(
            field,
            self.store.get_value(field_id),
            self.store.error(field_id),
            &resolve_options(field, self.cache.as_ref()),
        ))
    }

    /// Render every field in display order.
    pub fn render_all(&self) -> Vec<RenderedField> {
        self.config
            .fields_in_order()
            .into_iter()
            .map(|(_, field)| {
                render(
                    field,
                    self.store.get_value(&field.id),
                    self.store.error(&field.id),
                    &resolve_options(field, self.cache.as_ref()),
                )
            })
            .collect()
    }

    /// Apply a UI event to a field and clear that field's error.
    pub fn handle_input(&mut self, field_id: &str, event: InputEvent) -> Result<(), SessionError> {
        let field = self
            .config
            .find_field(field_id)
            .ok_or_else(|| SessionError::UnknownField(field_id.to_string()))?;
        let value = on_user_input(field, self.store.get_value(field_id), event)?;
        self.store.set_field_value(field_id, value);
        self.store.clear_error(field_id);
        Ok(())
    }

    /// Set a prepared value directly, bypassing UI events.
    pub fn set_value(&mut self, field_id: &str, value: FieldValue) -> Result<(), SessionError> {
        if self.config.find_field(field_id).is_none() {
            return Err(SessionError::UnknownField(field_id.to_string()));
        }
        self.store.set_field_value(field_id, value);
        self.store.clear_error(field_id);
        Ok(())
    }

    pub async fn submit(
        &mut self,
        instance_id: &str,
        responses: &dyn ResponseStore,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        submit(&self.config, &mut self.store, instance_id, responses).await
    }
}
