//! Edge-function handlers under `/functions/v1`.
//!
//! Extractor order is part of the contract: method routing runs first
//! (405), then credentials (401/500), then input validation (400).

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::Value;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use uuid::Uuid;

use crate::api::doc::FUNCTIONS_TAG;
use crate::api::dto::{
    ApiResponse, ErrorResponse, SocialPostsQuery, SolanaRpcRequest, SolanaRpcResult,
    TokenMarketQuery, TrackViewRequest, TrackViewResult, UnauthorizedResponse,
    VanityProgressQuery, WebhookResult,
};
use crate::api::handlers::realtime;
use crate::api::middleware::{ApiKey, VanitySecret, WebhookSecret};
use crate::error::{AppError, AppResult};
use crate::realtime::ChangeEvent;
use crate::services::{SocialPosts, SolPriceQuote, TokenMarket, VanityProgress};
use crate::state::AppState;
use crate::utils::validate::{
    ValidatedJson, ValidatedQuery, is_base58, is_solana_address, is_x_username, required_param,
};

/// Register every edge function.
pub fn function_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(sol_price))
        .routes(routes!(token_market))
        .routes(routes!(solana_rpc))
        .routes(routes!(social_posts))
        .routes(routes!(vanity_progress))
        .routes(routes!(track_view))
        .routes(routes!(db_webhook))
        .routes(routes!(realtime::realtime))
}

/// GET /sol-price - Current SOL/USD price.
#[utoipa::path(
    get,
    path = "/sol-price",
    tag = FUNCTIONS_TAG,
    responses(
        (status = 200, description = "SOL price", body = ApiResponse<SolPriceQuote>),
        (status = 500, description = "Price API unavailable or not configured", body = ErrorResponse)
    )
)]
pub async fn sol_price(State(state): State<AppState>) -> AppResult<Json<ApiResponse<SolPriceQuote>>> {
    let quote = state.services.market.sol_price().await?;
    Ok(Json(ApiResponse::ok(quote)))
}

/// GET /token-market - Trading pairs for a token mint.
#[utoipa::path(
    get,
    path = "/token-market",
    tag = FUNCTIONS_TAG,
    params(TokenMarketQuery),
    responses(
        (status = 200, description = "Token market data", body = ApiResponse<TokenMarket>),
        (status = 400, description = "Missing or invalid address", body = ErrorResponse),
        (status = 500, description = "Dexscreener unavailable", body = ErrorResponse)
    )
)]
pub async fn token_market(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<TokenMarketQuery>,
) -> AppResult<Json<ApiResponse<TokenMarket>>> {
    let address = required_param(query.address, "address")?;
    if !is_solana_address(&address) {
        return Err(AppError::bad_request(format!("Invalid Solana address: {address}")));
    }

    let market = state.services.market.token_market(&address).await?;
    Ok(Json(ApiResponse::ok(market)))
}

/// POST /solana-rpc - Forward a JSON-RPC call to the Solana node.
#[utoipa::path(
    post,
    path = "/solana-rpc",
    tag = FUNCTIONS_TAG,
    request_body = SolanaRpcRequest,
    security(("apikey" = [])),
    responses(
        (status = 200, description = "RPC result", body = ApiResponse<SolanaRpcResult>),
        (status = 400, description = "Missing method", body = ErrorResponse),
        (status = 401, description = "Missing or wrong api key", body = UnauthorizedResponse),
        (status = 500, description = "RPC node failed or not configured", body = ErrorResponse)
    )
)]
pub async fn solana_rpc(
    _key: ApiKey,
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<SolanaRpcRequest>,
) -> AppResult<Json<ApiResponse<SolanaRpcResult>>> {
    let method = required_param(body.method, "method")?;
    let params = body.params.unwrap_or_else(|| Value::Array(Vec::new()));

    let result = state.services.rpc.call(&method, &params).await?;
    Ok(Json(ApiResponse::ok(SolanaRpcResult { result })))
}

/// GET /social-posts - Recent posts by an X account.
#[utoipa::path(
    get,
    path = "/social-posts",
    tag = FUNCTIONS_TAG,
    params(SocialPostsQuery),
    security(("apikey" = [])),
    responses(
        (status = 200, description = "Recent posts", body = ApiResponse<SocialPosts>),
        (status = 400, description = "Missing or invalid username or limit", body = ErrorResponse),
        (status = 401, description = "Missing or wrong api key", body = UnauthorizedResponse),
        (status = 500, description = "X API failed or not configured", body = ErrorResponse)
    )
)]
pub async fn social_posts(
    _key: ApiKey,
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<SocialPostsQuery>,
) -> AppResult<Json<ApiResponse<SocialPosts>>> {
    let username = required_param(query.username, "username")?;
    let username = username.trim_start_matches('@').to_string();
    if !is_x_username(&username) {
        return Err(AppError::bad_request(format!("Invalid username: {username}")));
    }

    let posts = state.services.social.recent_posts(&username, query.limit).await?;
    Ok(Json(ApiResponse::ok(posts)))
}

/// GET /vanity-progress - Available and total vanity keypairs for a suffix.
#[utoipa::path(
    get,
    path = "/vanity-progress",
    tag = FUNCTIONS_TAG,
    params(VanityProgressQuery),
    security(("vanitySecret" = [])),
    responses(
        (status = 200, description = "Keypair stock", body = ApiResponse<VanityProgress>),
        (status = 400, description = "Missing or invalid suffix", body = ErrorResponse),
        (status = 401, description = "Missing or wrong x-vanity-secret", body = UnauthorizedResponse),
        (status = 500, description = "Store failed or not configured", body = ErrorResponse)
    )
)]
pub async fn vanity_progress(
    _secret: VanitySecret,
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<VanityProgressQuery>,
) -> AppResult<Json<ApiResponse<VanityProgress>>> {
    let suffix = required_param(query.suffix, "suffix")?;
    if !is_base58(&suffix) {
        return Err(AppError::bad_request(format!("Invalid suffix: {suffix}")));
    }

    let progress = state.services.launchpad.vanity_progress(&suffix).await?;
    Ok(Json(ApiResponse::ok(progress)))
}

/// POST /track-view - Record an agent page view.
#[utoipa::path(
    post,
    path = "/track-view",
    tag = FUNCTIONS_TAG,
    request_body = TrackViewRequest,
    security(("apikey" = [])),
    responses(
        (status = 200, description = "View recorded", body = ApiResponse<TrackViewResult>),
        (status = 400, description = "Missing or invalid agent_id", body = ErrorResponse),
        (status = 401, description = "Missing or wrong api key", body = UnauthorizedResponse),
        (status = 500, description = "Store failed or not configured", body = ErrorResponse)
    )
)]
pub async fn track_view(
    _key: ApiKey,
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<TrackViewRequest>,
) -> AppResult<Json<ApiResponse<TrackViewResult>>> {
    let agent_id = required_param(body.agent_id, "agent_id")?;
    let agent_id = Uuid::parse_str(&agent_id)
        .map_err(|_| AppError::bad_request(format!("Invalid agent_id: {agent_id}")))?;
    let viewer = body.viewer_id.filter(|v| !v.trim().is_empty());

    state
        .services
        .launchpad
        .record_view(agent_id, viewer.as_deref(), body.source)
        .await?;
    Ok(Json(ApiResponse::ok(TrackViewResult { recorded: true })))
}

/// POST /db-webhook - Receive a Supabase database webhook and fan it out.
#[utoipa::path(
    post,
    path = "/db-webhook",
    tag = FUNCTIONS_TAG,
    request_body = ChangeEvent,
    security(("webhookSecret" = [])),
    responses(
        (status = 200, description = "Change published", body = ApiResponse<WebhookResult>),
        (status = 400, description = "Malformed payload", body = ErrorResponse),
        (status = 401, description = "Missing or wrong x-webhook-secret", body = UnauthorizedResponse),
        (status = 500, description = "Webhook secret not configured", body = ErrorResponse)
    )
)]
pub async fn db_webhook(
    _secret: WebhookSecret,
    State(state): State<AppState>,
    payload: Result<Json<ChangeEvent>, JsonRejection>,
) -> AppResult<Json<ApiResponse<WebhookResult>>> {
    let Json(event) = payload?;
    if event.table.trim().is_empty() {
        return Err(AppError::missing_param("table"));
    }

    tracing::info!(table = %event.table, operation = %event.operation, "database change received");
    let delivered = state.feed.publish(event);
    Ok(Json(ApiResponse::ok(WebhookResult { delivered })))
}
