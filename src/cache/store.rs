//! Storage backends behind [`CacheManager`](crate::cache::CacheManager).

use std::time::Duration;

use async_trait::async_trait;

use crate::cache::CacheError;

/// Byte store for serialized upstream responses.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store a response. `ttl` is clamped to the backend's own lifespan.
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError>;
}

/// Store used when `cache.enabled = false` or `backend = "none"`; every
/// lookup misses and every write is discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledStore;

#[async_trait]
impl ResponseStore for DisabledStore {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _value: Vec<u8>, _ttl: Option<Duration>) -> Result<(), CacheError> {
        Ok(())
    }
}
