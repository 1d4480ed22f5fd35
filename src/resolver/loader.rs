//! Fetch option sets into a cache.
//!
//! The loader only holds a weak handle on the cache while a fetch is in
//! flight. When the owning view is torn down (the cache dropped), the
//! completed fetch is discarded instead of written.

use futures::future::join_all;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::OptionSetRef;
use crate::persistence::OptionSetStore;

use super::cache::{OptionSetCache, OptionSetLoadError, OptionSetState};

/// Result of one load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// Already loading or loaded, nothing fetched
    Skipped,
    Failed(OptionSetLoadError),
    /// The cache was dropped before or during the fetch
    Discarded,
}

#[derive(Clone)]
pub struct OptionSetLoader {
    store: Arc<dyn OptionSetStore>,
}

impl OptionSetLoader {
    pub fn new(store: Arc<dyn OptionSetStore>) -> Self {
        Self { store }
    }

    /// Fetch one option set into the cache behind `cache`.
    pub async fn load(&self, cache: Weak<dyn OptionSetCache>, key: OptionSetRef) -> LoadOutcome {
        {
            let Some(live) = cache.upgrade() else {
                return LoadOutcome::Discarded;
            };
            if !live.begin_load(&key) {
                return LoadOutcome::Skipped;
            }
        }
        self.fetch(cache, key).await
    }

    /// Fetch a key already marked loading and store the result.
    async fn fetch(&self, cache: Weak<dyn OptionSetCache>, key: OptionSetRef) -> LoadOutcome {
        debug!("Fetching option set {}", key);
        let state = match self.store.get_option_set(key.kind, &key.id).await {
            Ok(Some(set)) => OptionSetState::Loaded(Arc::new(set)),
            Ok(None) => OptionSetState::Failed(OptionSetLoadError::NotFound(key.clone())),
            Err(e) => OptionSetState::Failed(OptionSetLoadError::Backend {
                reference: key.clone(),
                reason: e.to_string(),
            }),
        };

        let Some(live) = cache.upgrade() else {
            debug!("View torn down, dropping fetched option set {}", key);
            return LoadOutcome::Discarded;
        };

        let outcome = match &state {
            OptionSetState::Failed(e) => {
                warn!("{}", e);
                LoadOutcome::Failed(e.clone())
            }
            _ => LoadOutcome::Loaded,
        };
        live.set(key, state);
        outcome
    }

    /// Load every key concurrently and wait for all of them.
    pub async fn load_all(
        &self,
        cache: &Arc<dyn OptionSetCache>,
        keys: impl IntoIterator<Item = OptionSetRef>,
    ) -> Vec<LoadOutcome> {
        let weak = Arc::downgrade(cache);
        join_all(keys.into_iter().map(|key| self.load(weak.clone(), key))).await
    }

    /// Fire-and-forget variant of [`Self::load_all`]. Keys are marked
    /// loading before this returns, so a render right after the call shows
    /// them as loading. Keys already loading or loaded get no task.
    pub fn spawn_all(
        &self,
        cache: &Arc<dyn OptionSetCache>,
        keys: impl IntoIterator<Item = OptionSetRef>,
    ) -> Vec<JoinHandle<LoadOutcome>> {
        let weak = Arc::downgrade(cache);
        keys.into_iter()
            .filter(|key| cache.begin_load(key))
            .map(|key| {
                let loader = self.clone();
                let weak = weak.clone();
                tokio::spawn(async move { loader.fetch(weak, key).await })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OptionSet, OptionSetKind};
    use crate::persistence::{InMemoryStore, PersistenceError};
    use crate::resolver::cache::InMemoryOptionSetCache;
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl OptionSetStore for BrokenStore {
        async fn get_option_set(
            &self,
            _kind: OptionSetKind,
            _id: &str,
        ) -> Result<Option<OptionSet>, PersistenceError> {
            Err(PersistenceError::Backend("connection refused".into()))
        }
    }

    async fn store_with_scale() -> Arc<InMemoryStore> {
        let store = InMemoryStore::new();
        store
            .insert_option_set(OptionSet::new(OptionSetKind::Rating, "rs1", "Agreement"))
            .await;
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_load_populates_cache() {
        let loader = OptionSetLoader::new(store_with_scale().await);
        let cache: Arc<dyn OptionSetCache> = Arc::new(InMemoryOptionSetCache::new());
        let key = OptionSetRef::new(OptionSetKind::Rating, "rs1");

        let outcomes = loader.load_all(&cache, [key.clone(), key.clone()]).await;
        assert!(outcomes.contains(&LoadOutcome::Loaded));
        assert!(outcomes.contains(&LoadOutcome::Skipped));
        assert!(cache.has(&key));
    }

    #[tokio::test]
    async fn test_missing_set_is_failed() {
        let loader = OptionSetLoader::new(store_with_scale().await);
        let cache: Arc<dyn OptionSetCache> = Arc::new(InMemoryOptionSetCache::new());
        let key = OptionSetRef::new(OptionSetKind::Radio, "nope");

        let outcome = loader.load(Arc::downgrade(&cache), key.clone()).await;
        assert_eq!(outcome, LoadOutcome::Failed(OptionSetLoadError::NotFound(key.clone())));
        assert!(matches!(cache.get(&key), Some(OptionSetState::Failed(_))));
    }

    #[tokio::test]
    async fn test_backend_error_is_failed() {
        let loader = OptionSetLoader::new(Arc::new(BrokenStore));
        let cache: Arc<dyn OptionSetCache> = Arc::new(InMemoryOptionSetCache::new());
        let key = OptionSetRef::new(OptionSetKind::Rating, "rs1");

        let outcome = loader.load(Arc::downgrade(&cache), key).await;
        assert!(matches!(outcome, LoadOutcome::Failed(OptionSetLoadError::Backend { .. })));
    }

    #[tokio::test]
    async fn test_dropped_cache_is_noop() {
        let loader = OptionSetLoader::new(store_with_scale().await);
        let cache: Arc<dyn OptionSetCache> = Arc::new(InMemoryOptionSetCache::new());
        let weak = Arc::downgrade(&cache);
        drop(cache);

        let outcome = loader
            .load(weak, OptionSetRef::new(OptionSetKind::Rating, "rs1"))
            .await;
        assert_eq!(outcome, LoadOutcome::Discarded);
    }

    #[tokio::test]
    async fn test_spawn_all() {
        let loader = OptionSetLoader::new(store_with_scale().await);
        let cache: Arc<dyn OptionSetCache> = Arc::new(InMemoryOptionSetCache::new());
        let key = OptionSetRef::new(OptionSetKind::Rating, "rs1");

        let handles = loader.spawn_all(&cache, [key.clone(), key.clone()]);
        assert_eq!(handles.len(), 1);
        assert!(matches!(cache.get(&key), Some(OptionSetState::Loading)));

        for handle in handles {
            assert_eq!(handle.await.unwrap(), LoadOutcome::Loaded);
        }
        assert!(cache.has(&key));
        assert!(loader.spawn_all(&cache, [key]).is_empty());
    }
}
