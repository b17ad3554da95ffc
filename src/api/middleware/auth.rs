//! Credential extractors.
//!
//! Each extractor checks one header against one secret. A missing server
//! secret is a configuration error (500), never a 401, so it is resolved
//! before the header is looked at.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use crate::config::secrets::names;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub const APIKEY_HEADER: &str = "apikey";
pub const VANITY_SECRET_HEADER: &str = "x-vanity-secret";
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn check(state: &AppState, secret: &str, candidate: Option<&str>) -> AppResult<()> {
    state.secrets.require(secret)?;
    match candidate {
        Some(candidate) if state.secrets.verify(secret, candidate)? => Ok(()),
        _ => {
            tracing::debug!(secret, "credential rejected");
            Err(AppError::Unauthorized)
        }
    }
}

/// Caller presented the project anon key, as `apikey: <key>` or
/// `Authorization: Bearer <key>`.
#[derive(Debug, Clone, Copy)]
pub struct ApiKey;

impl FromRequestParts<AppState> for ApiKey {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> AppResult<Self> {
        let candidate = header_value(&parts.headers, APIKEY_HEADER).or_else(|| {
            header_value(&parts.headers, header::AUTHORIZATION.as_str())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::trim)
        });
        check(state, names::SUPABASE_ANON_KEY, candidate)?;
        Ok(ApiKey)
    }
}

/// `x-vanity-secret` matches `VANITY_SECRET`.
#[derive(Debug, Clone, Copy)]
pub struct VanitySecret;

impl FromRequestParts<AppState> for VanitySecret {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> AppResult<Self> {
        let candidate = header_value(&parts.headers, VANITY_SECRET_HEADER);
        check(state, names::VANITY_SECRET, candidate)?;
        Ok(VanitySecret)
    }
}

/// `x-webhook-secret` matches `DB_WEBHOOK_SECRET`.
#[derive(Debug, Clone, Copy)]
pub struct WebhookSecret;

impl FromRequestParts<AppState> for WebhookSecret {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> AppResult<Self> {
        let candidate = header_value(&parts.headers, WEBHOOK_SECRET_HEADER);
        check(state, names::DB_WEBHOOK_SECRET, candidate)?;
        Ok(WebhookSecret)
    }
}
