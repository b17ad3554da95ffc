//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cache::CacheManager;
use crate::config::{Secrets, Settings};
use crate::error::AppResult;
use crate::external::{LaunchpadStore, PostgrestStore, build_http_client};
use crate::realtime::ChangeFeed;
use crate::services::Services;

/// Application state containing all shared services and resources.
///
/// Cloning is cheap; everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// All edge-function services
    pub services: Services,
    /// Secret lookup for credential checks
    pub secrets: Secrets,
    /// Fan-out of database change events
    pub feed: ChangeFeed,
    pub settings: Arc<Settings>,
    /// Cancelled on shutdown; ends long-lived responses such as SSE streams
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Production state: Supabase-backed store and the configured cache.
    pub fn new(settings: Settings, secrets: Secrets) -> AppResult<Self> {
        let http = build_http_client(&settings.upstreams)?;
        let store = Arc::new(PostgrestStore::new(http, secrets.clone(), &settings.functions));
        Self::with_store(settings, secrets, store)
    }

    /// State with an explicit [`LaunchpadStore`].
    pub fn with_store(
        settings: Settings,
        secrets: Secrets,
        store: Arc<dyn LaunchpadStore>,
    ) -> AppResult<Self> {
        let cache = CacheManager::new(settings.cache.clone());
        let services = Services::new(&settings, secrets.clone(), cache, store)?;
        let feed = ChangeFeed::new(settings.realtime.channel_capacity);

        Ok(Self {
            services,
            secrets,
            feed,
            settings: Arc::new(settings),
            shutdown: CancellationToken::new(),
        })
    }
}
