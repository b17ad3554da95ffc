//! Health check endpoint handlers.

use axum::{Json, extract::State};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::HEALTH_TAG;
use crate::api::dto::{HealthResponse, HealthStatus};
use crate::config::CacheBackend;
use crate::config::secrets::names;
use crate::state::AppState;

const CHECKED_SECRETS: &[&str] = &[
    names::PRICE_API_KEY,
    names::HELIUS_RPC_URL,
    names::TWITTER_BEARER_TOKEN,
    names::VANITY_SECRET,
    names::SUPABASE_URL,
    names::SUPABASE_ANON_KEY,
    names::SUPABASE_SERVICE_ROLE_KEY,
    names::DB_WEBHOOK_SECRET,
];

pub fn health_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(health_check))
}

/// Liveness check.
///
/// Always 200 while the process serves requests; `degraded` lists the
/// secrets whose functions would currently answer 500.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    ),
    tag = HEALTH_TAG
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let missing_secrets: Vec<String> = CHECKED_SECRETS
        .iter()
        .filter(|name| state.secrets.get(name).is_none())
        .map(|name| name.to_string())
        .collect();

    Json(HealthResponse {
        status: HealthStatus::from_missing(&missing_secrets),
        version: state.settings.application.version.clone(),
        timestamp: jiff::Timestamp::now(),
        missing_secrets,
        realtime_subscribers: state.feed.subscriber_count(),
        response_cache: state.settings.cache.enabled
            && state.settings.cache.backend != CacheBackend::None,
    })
}
