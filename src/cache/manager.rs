//! Cache manager that dispatches to the configured backend.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::memory::MemoryCache;
use crate::cache::{CacheError, DisabledStore, ResponseStore};
use crate::config::settings::{CacheBackend, CacheConfig};

/// Response cache in front of the upstream price and market APIs.
///
/// Owned by [`AppState`](crate::state::AppState); there is no global instance.
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn ResponseStore>,
    config: CacheConfig,
}

impl CacheManager {
    pub fn new(config: CacheConfig) -> Self {
        let store: Arc<dyn ResponseStore> = if Self::wants_store(&config) {
            Arc::new(MemoryCache::new(&config.memory))
        } else {
            Arc::new(DisabledStore)
        };

        Self { store, config }
    }

    /// Use a caller-provided store instead of the configured backend.
    pub fn with_store(store: Arc<dyn ResponseStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    fn wants_store(config: &CacheConfig) -> bool {
        config.enabled && config.backend == CacheBackend::Memory
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        Self::wants_store(&self.config)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: Option<u64>,
    ) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.store
            .put(key, bytes, ttl_seconds.map(Duration::from_secs))
            .await
    }

    /// Return the cached value for `key`, or run `fetch` and cache its result.
    ///
    /// Cache failures are logged and bypassed; only `fetch` errors propagate.
    /// Failed fetches are never cached.
    pub async fn get_or_fetch_json<T, E, F, Fut>(
        &self,
        key: &str,
        ttl_seconds: Option<u64>,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let backend = self.store.name();
        match self.get_json::<T>(key).await {
            Ok(Some(value)) => {
                tracing::debug!(cache_key = key, backend, "response cache hit");
                return Ok(value);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(cache_key = key, backend, error = %e, "response cache read failed"),
        }

        let value = fetch().await?;

        if let Err(e) = self.set_json(key, &value, ttl_seconds).await {
            tracing::warn!(cache_key = key, backend, error = %e, "response cache write failed");
        }

        Ok(value)
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct BrokenStore;

    #[async_trait]
    impl ResponseStore for BrokenStore {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::Unavailable {
                backend: "broken",
                message: "down".to_string(),
            })
        }

        async fn put(&self, _key: &str, _value: Vec<u8>, _ttl: Option<Duration>) -> Result<(), CacheError> {
            Err(CacheError::Unavailable {
                backend: "broken",
                message: "down".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_store_failures_fall_through_to_fetch() {
        let cache = CacheManager::with_store(Arc::new(BrokenStore), CacheConfig::default());
        let value: Result<u32, &str> = cache.get_or_fetch_json("k", None, || async { Ok(3) }).await;
        assert_eq!(value, Ok(3));
    }

    #[tokio::test]
    async fn test_get_or_fetch_caches_success_only() {
        let cache = CacheManager::new(CacheConfig::default());
        let calls = AtomicUsize::new(0);

        let failed: Result<u32, &str> = cache
            .get_or_fetch_json("k", Some(30), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("boom")
            })
            .await;
        assert!(failed.is_err());

        for _ in 0..3 {
            let value: Result<u32, &str> = cache
                .get_or_fetch_json("k", Some(30), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await;
            assert_eq!(value, Ok(7));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_fetches() {
        let cache = CacheManager::new(CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        });
        assert!(!cache.is_enabled());

        cache.set_json("k", &1u8, None).await.unwrap();
        assert_eq!(cache.get_json::<u8>("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_none_backend_is_disabled() {
        let cache = CacheManager::new(CacheConfig {
            backend: CacheBackend::None,
            ..CacheConfig::default()
        });
        assert!(!cache.is_enabled());
    }
}
