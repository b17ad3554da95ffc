//! Validating request extractors and shared input checks.

use std::sync::LazyLock;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use regex::Regex;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Base58 alphabet, 32 to 44 characters (an ed25519 public key).
static SOLANA_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").unwrap_or_else(|e| panic!("invalid regex: {e}"))
});

/// X handles: letters, digits and underscore, at most 15 characters.
static X_USERNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]{1,15}$").unwrap_or_else(|e| panic!("invalid regex: {e}"))
});

pub fn is_solana_address(value: &str) -> bool {
    SOLANA_ADDRESS.is_match(value)
}

pub fn is_x_username(value: &str) -> bool {
    X_USERNAME.is_match(value)
}

/// Every character is in the base58 alphabet, so a public key can end with it.
pub fn is_base58(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l'))
}

/// Take a required, non-blank parameter out of an `Option`.
pub fn required_param(value: Option<String>, name: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::missing_param(name))
}

/// Query string extractor that runs `validator` rules and rejects with
/// [`AppError::BadRequest`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> AppResult<Self> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

/// JSON body extractor that runs `validator` rules and rejects with
/// [`AppError::BadRequest`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}
