use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `GET /health`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "status": "degraded",
    "version": "0.1.0",
    "timestamp": "2025-01-01T12:00:00Z",
    "missing_secrets": ["TWITTER_BEARER_TOKEN"],
    "realtime_subscribers": 3,
    "response_cache": true
}))]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: jiff::Timestamp,
    /// Secrets whose functions currently answer 500.
    pub missing_secrets: Vec<String>,
    /// Open `/functions/v1/realtime` streams.
    pub realtime_subscribers: usize,
    pub response_cache: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// The process is up but at least one function lacks its secret.
    Degraded,
}

impl HealthStatus {
    pub fn from_missing(missing_secrets: &[String]) -> Self {
        if missing_secrets.is_empty() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        }
    }
}
