//! Router configuration for the API.
//!
//! This module provides centralized route registration and middleware
//! configuration for the application.

use std::time::Duration;

use axum::{Json, Router, middleware, routing::get};
use tower_http::catch_panic::CatchPanicLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{
    cors_middleware, method_not_allowed_middleware, not_found, panic_response, timeout_middleware,
    trace_middleware,
};
use crate::state::AppState;

pub const FUNCTIONS_PREFIX: &str = "/functions/v1/";

/// Edge functions and the HTTP method each accepts.
pub const FUNCTIONS: &[(&str, &str)] = &[
    ("sol-price", "GET"),
    ("token-market", "GET"),
    ("solana-rpc", "POST"),
    ("social-posts", "GET"),
    ("vanity-progress", "GET"),
    ("track-view", "POST"),
    ("db-webhook", "POST"),
    ("realtime", "GET"),
];

pub fn function_methods(name: &str) -> Option<&'static str> {
    FUNCTIONS
        .iter()
        .find(|(function, _)| *function == name)
        .map(|(_, methods)| *methods)
}

/// Routes plus their OpenAPI document.
pub fn api_router() -> OpenApiRouter<AppState> {
    OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/functions/v1", handlers::functions::function_routes())
        .merge(handlers::health::health_routes())
}

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Last added runs first:
/// 1. Trace - `x-request-id` plus the request span and access log
/// 2. CORS - headers on every response, `OPTIONS` short-circuit
/// 3. 405 envelope - rewrites the router's bodiless 405
/// 4. Deadline - `server.request_timeout` elapsed becomes a 500 envelope
/// 5. Panic catcher - a panicking handler becomes a 500 envelope
pub fn create_router(state: AppState) -> Router {
    let (router, openapi) = api_router().split_for_parts();
    let deadline = Duration::from_secs(state.settings.server.request_timeout);

    router
        .route(
            "/openapi.json",
            get(move || {
                let doc = openapi.clone();
                async move { Json(doc) }
            }),
        )
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(deadline, timeout_middleware))
        .layer(middleware::from_fn(method_not_allowed_middleware))
        .layer(middleware::from_fn(cors_middleware))
        .layer(middleware::from_fn(trace_middleware))
        .with_state(state)
}
