//! Request deadline.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;

/// Answers with the 500 envelope when the handler has not produced a
/// response within `limit`. An event stream counts as answered once its
/// headers are out.
pub async fn timeout_middleware(
    State(limit): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => AppError::Internal {
            source: anyhow::anyhow!("{path} timed out after {limit:?}"),
        }
        .into_response(),
    }
}
