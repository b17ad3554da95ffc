//! Launchpad bookkeeping backed by Supabase: vanity keypair stock and
//! agent page views.

use std::sync::Arc;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppResult;
use crate::external::{AgentView, LaunchpadStore};
use crate::utils::privy_user_id_to_uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VanityProgress {
    #[schema(example = "tuna")]
    pub suffix: String,
    #[schema(example = 7)]
    pub available: u64,
    #[schema(example = 12)]
    pub total: u64,
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: Timestamp,
}

#[derive(Clone)]
pub struct LaunchpadService {
    store: Arc<dyn LaunchpadStore>,
}

impl LaunchpadService {
    pub fn new(store: Arc<dyn LaunchpadStore>) -> Self {
        Self { store }
    }

    pub async fn vanity_progress(&self, suffix: &str) -> AppResult<VanityProgress> {
        let counts = self.store.vanity_counts(suffix).await?;
        Ok(VanityProgress {
            suffix: suffix.to_string(),
            available: counts.available,
            total: counts.total,
            timestamp: Timestamp::now(),
        })
    }

    /// Record an agent page view. `viewer` may be a UUID or a Privy user id;
    /// the latter is mapped to its stable UUID.
    pub async fn record_view(
        &self,
        agent_id: Uuid,
        viewer: Option<&str>,
        source: Option<String>,
    ) -> AppResult<()> {
        let viewer_id = viewer.map(|v| Uuid::parse_str(v).unwrap_or_else(|_| privy_user_id_to_uuid(v)));
        let view = AgentView {
            agent_id,
            viewer_id,
            source,
            viewed_at: Timestamp::now(),
        };
        self.store.record_view(&view).await?;
        tracing::debug!(%agent_id, "agent view recorded");
        Ok(())
    }
}
