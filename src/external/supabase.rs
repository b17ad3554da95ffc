//! Supabase PostgREST access used by the edge functions.
//!
//! [`LaunchpadStore`] is the seam: handlers talk to the trait, production
//! wires [`PostgrestStore`], tests wire [`MemoryStore`].

use std::sync::Mutex;

use async_trait::async_trait;
use jiff::Timestamp;
use reqwest::header::{CONTENT_RANGE, HeaderMap};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::client::send;
use crate::config::secrets::names;
use crate::config::{FunctionsConfig, Secrets};
use crate::error::{AppError, AppResult};

const SERVICE: &str = "supabase";

/// Pre-generated vanity keypairs for one suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VanityCounts {
    /// Keypairs not yet handed out
    pub available: u64,
    /// All keypairs generated for the suffix
    pub total: u64,
}

/// One row of the agent views table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub agent_id: Uuid,
    pub viewer_id: Option<Uuid>,
    pub source: Option<String>,
    pub viewed_at: Timestamp,
}

#[async_trait]
pub trait LaunchpadStore: Send + Sync {
    async fn vanity_counts(&self, suffix: &str) -> AppResult<VanityCounts>;

    async fn record_view(&self, view: &AgentView) -> AppResult<()>;
}

/// [`LaunchpadStore`] over the Supabase REST API with the service-role key.
///
/// `SUPABASE_URL` and `SUPABASE_SERVICE_ROLE_KEY` are resolved on every
/// call.
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    http: reqwest::Client,
    secrets: Secrets,
    vanity_table: String,
    views_table: String,
}

impl PostgrestStore {
    pub fn new(http: reqwest::Client, secrets: Secrets, config: &FunctionsConfig) -> Self {
        Self {
            http,
            secrets,
            vanity_table: config.vanity_table.clone(),
            views_table: config.views_table.clone(),
        }
    }

    fn table_url(&self, table: &str) -> AppResult<(String, String)> {
        let base = self.secrets.require(names::SUPABASE_URL)?;
        let key = self.secrets.require(names::SUPABASE_SERVICE_ROLE_KEY)?;
        Ok((format!("{}/rest/v1/{}", base.trim_end_matches('/'), table), key))
    }

    async fn count(&self, filters: &[(&str, String)]) -> AppResult<u64> {
        let (url, key) = self.table_url(&self.vanity_table)?;
        let mut query: Vec<(&str, String)> = vec![("select", "id".to_string())];
        query.extend(filters.iter().cloned());

        let request = self
            .http
            .head(&url)
            .query(&query)
            .header("apikey", key.as_str())
            .bearer_auth(&key)
            .header("Prefer", "count=exact");

        let response = send(SERVICE, request).await?;
        parse_total(response.headers())
    }
}

/// Total row count from a `Content-Range: 0-24/3573` (or `*/0`) header.
fn parse_total(headers: &HeaderMap) -> AppResult<u64> {
    headers
        .get(CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|range| range.rsplit_once('/'))
        .and_then(|(_, total)| total.parse::<u64>().ok())
        .ok_or_else(|| AppError::upstream(SERVICE, "response has no exact count"))
}

#[async_trait]
impl LaunchpadStore for PostgrestStore {
    async fn vanity_counts(&self, suffix: &str) -> AppResult<VanityCounts> {
        let by_suffix = ("suffix", format!("eq.{suffix}"));
        let total = self.count(std::slice::from_ref(&by_suffix)).await?;
        let available = self
            .count(&[by_suffix, ("used", "eq.false".to_string())])
            .await?;
        Ok(VanityCounts { available, total })
    }

    async fn record_view(&self, view: &AgentView) -> AppResult<()> {
        let (url, key) = self.table_url(&self.views_table)?;
        let request = self
            .http
            .post(&url)
            .header("apikey", key.as_str())
            .bearer_auth(&key)
            .header("Prefer", "return=minimal")
            .json(view);

        send(SERVICE, request).await?;
        Ok(())
    }
}

/// In-process [`LaunchpadStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    keypairs: Mutex<Vec<(String, bool)>>,
    views: Mutex<Vec<AgentView>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `total` keypairs for `suffix`, `used` of which are handed out.
    pub fn with_keypairs(self, suffix: &str, total: u64, used: u64) -> Self {
        if let Ok(mut keypairs) = self.keypairs.lock() {
            keypairs.extend((0..total).map(|i| (suffix.to_string(), i < used)));
        }
        self
    }

    pub fn views(&self) -> Vec<AgentView> {
        self.views.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LaunchpadStore for MemoryStore {
    async fn vanity_counts(&self, suffix: &str) -> AppResult<VanityCounts> {
        let keypairs = self
            .keypairs
            .lock()
            .map_err(|_| AppError::upstream(SERVICE, "store lock poisoned"))?;
        let matching = keypairs.iter().filter(|(s, _)| s == suffix);
        let total = matching.clone().count() as u64;
        let available = matching.filter(|(_, used)| !used).count() as u64;
        Ok(VanityCounts { available, total })
    }

    async fn record_view(&self, view: &AgentView) -> AppResult<()> {
        self.views
            .lock()
            .map_err(|_| AppError::upstream(SERVICE, "store lock poisoned"))?
            .push(view.clone());
        Ok(())
    }
}
