//! Per-key debouncing on tokio timers.
//!
//! Each `schedule` restarts the key's window. When a window elapses without a
//! new `schedule`, the latest value is handed to the sink exactly once.
//! Must be used from inside a tokio runtime.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::domain::SurveyConfigPatch;
use crate::persistence::SurveyStore;

type Sink<K, V> = Arc<dyn Fn(K, V) + Send + Sync>;

/// What happens to pending values when a debouncer is shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    Flush,
    Discard,
}

struct Pending<V> {
    value: V,
    generation: u64,
    handle: JoinHandle<()>,
}

struct Inner<K, V> {
    pending: HashMap<K, Pending<V>>,
    next_generation: u64,
}

fn lock<K, V>(inner: &Mutex<Inner<K, V>>) -> MutexGuard<'_, Inner<K, V>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Debouncer<K, V> {
    delay: Duration,
    inner: Arc<Mutex<Inner<K, V>>>,
    sink: Sink<K, V>,
}

impl<K, V> Debouncer<K, V>
where
    K: Clone + Eq + Hash + Send + 'static,
    V: Send + 'static,
{
    pub fn new(delay: Duration, sink: impl Fn(K, V) + Send + Sync + 'static) -> Self {
        Self {
            delay,
            inner: Arc::new(Mutex::new(Inner {
                pending: HashMap::new(),
                next_generation: 0,
            })),
            sink: Arc::new(sink),
        }
    }

    /// Replace the pending value for `key` and restart its window.
    pub fn schedule(&self, key: K, value: V) {
        let mut inner = lock(&self.inner);
        let generation = inner.next_generation;
        inner.next_generation += 1;

        if let Some(previous) = inner.pending.remove(&key) {
            previous.handle.abort();
        }

        let delay = self.delay;
        let shared = Arc::clone(&self.inner);
        let sink = Arc::clone(&self.sink);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let due = {
                let mut inner = lock(&shared);
                match inner.pending.get(&task_key) {
                    // A newer schedule replaced this one while we waited for the lock.
                    Some(p) if p.generation == generation => inner.pending.remove(&task_key),
                    _ => None,
                }
            };
            if let Some(pending) = due {
                sink(task_key, pending.value);
            }
        });

        inner.pending.insert(
            key,
            Pending {
                value,
                generation,
                handle,
            },
        );
    }

    /// Deliver every pending value now.
    pub fn flush(&self) {
        let due: Vec<(K, V)> = {
            let mut inner = lock(&self.inner);
            inner
                .pending
                .drain()
                .map(|(key, pending)| {
                    pending.handle.abort();
                    (key, pending.value)
                })
                .collect()
        };
        debug!("Flushing {} debounced values", due.len());
        for (key, value) in due {
            (self.sink)(key, value);
        }
    }

    /// Drop every pending value without delivering it.
    pub fn discard(&self) {
        let mut inner = lock(&self.inner);
        for (_, pending) in inner.pending.drain() {
            pending.handle.abort();
        }
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.inner).pending.len()
    }

    pub fn shutdown(self, teardown: Teardown) {
        match teardown {
            Teardown::Flush => self.flush(),
            Teardown::Discard => self.discard(),
        }
    }
}

impl<K, V> Drop for Debouncer<K, V> {
    fn drop(&mut self) {
        let mut inner = lock(&self.inner);
        for (_, pending) in inner.pending.drain() {
            pending.handle.abort();
        }
    }
}

/// Debounced survey autosave: rapid edits to one survey collapse into a
/// single `update_survey_config` call.
pub fn survey_autosave(
    store: Arc<dyn SurveyStore>,
    delay: Duration,
) -> Debouncer<String, SurveyConfigPatch> {
    Debouncer::new(delay, move |survey_id: String, patch: SurveyConfigPatch| {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            match store.update_survey_config(&survey_id, patch).await {
                Ok(config) => debug!("Autosaved survey {} (version {})", survey_id, config.version),
                Err(e) => error!("Autosave of survey {} failed: {}", survey_id, e),
            }
        });
    })
}
