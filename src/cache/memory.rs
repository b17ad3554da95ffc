//! In-process response store on `cached::TimedSizedCache`.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cached::{Cached, TimedSizedCache};

use crate::cache::{CacheError, ResponseStore};
use crate::config::settings::MemoryCacheConfig;

struct Slot {
    expires_at: Instant,
    value: Vec<u8>,
}

/// In-memory cache with size limit, backend-wide lifespan and per-entry TTL.
pub struct MemoryCache {
    store: Mutex<TimedSizedCache<String, Slot>>,
    max_ttl: Duration,
}

impl MemoryCache {
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let max_ttl = Duration::from_secs(config.ttl_seconds);
        let store = TimedSizedCache::with_size_and_lifespan(config.max_size, max_ttl);
        Self {
            store: Mutex::new(store),
            max_ttl,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, TimedSizedCache<String, Slot>>, CacheError> {
        self.store
            .lock()
            .map_err(|e| CacheError::Unavailable {
                backend: "memory",
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl ResponseStore for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut store = self.lock()?;
        let now = Instant::now();

        let expired = match store.cache_get(key) {
            Some(slot) if slot.expires_at > now => return Ok(Some(slot.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            store.cache_remove(key);
        }
        Ok(None)
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError> {
        let ttl = ttl.map_or(self.max_ttl, |ttl| ttl.min(self.max_ttl));

        let mut store = self.lock()?;
        store.cache_set(
            key.to_string(),
            Slot {
                expires_at: Instant::now() + ttl,
                value,
            },
        );
        Ok(())
    }

}
