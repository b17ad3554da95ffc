//! Error handler for converting AppError to HTTP responses.
//!
//! Every failure leaves the server as a JSON envelope: errors returned by
//! handlers and extractors, the router's own 404/405, and panics.

use std::any::Any;

use axum::{
    Json,
    body::Body,
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::dto::{ErrorResponse, UnauthorizedResponse};
use crate::error::AppError;

impl IntoResponse for AppError {
    /// # Status Code Mapping
    /// - BadRequest → 400
    /// - Unauthorized → 401 (`{"error":"Unauthorized"}`)
    /// - NotFound → 404
    /// - MethodNotAllowed → 405
    /// - Configuration, Upstream, Internal → 500
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);

        match &self {
            AppError::Unauthorized => {
                return (status, Json(UnauthorizedResponse::default())).into_response();
            }
            AppError::Configuration { key } => {
                tracing::error!(key = %key, "function misconfigured");
            }
            AppError::Upstream {
                service,
                message,
                status: upstream_status,
                ..
            } => {
                tracing::error!(service = %service, status = ?upstream_status, message = %message, "upstream failure");
            }
            AppError::Internal { source } => {
                tracing::error!(error = ?source, "internal error");
            }
            _ => {}
        }

        let body = match &self {
            AppError::Upstream {
                service,
                status,
                body,
                ..
            } => ErrorResponse::new(self.to_string()).with_details(json!({
                "service": service,
                "status": status,
                "body": body,
            })),
            _ => ErrorResponse::new(self.to_string()),
        };

        let mut response = (status, Json(body)).into_response();
        if let AppError::MethodNotAllowed { allowed, .. } = &self {
            if let Ok(value) = HeaderValue::from_str(allowed) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }
        response
    }
}

/// Maps an AppError variant to its corresponding HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        AppError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AppError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Rewrites the router's bodiless 405 into the error envelope.
pub async fn method_not_allowed_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let response = next.run(request).await;

    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    if is_json {
        return response;
    }

    let allowed = response
        .headers()
        .get(header::ALLOW)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    AppError::MethodNotAllowed { method, allowed }.into_response()
}

/// Router fallback for unknown paths.
pub async fn not_found(request: Request) -> AppError {
    AppError::NotFound {
        path: request.uri().path().to_string(),
    }
}

/// Response for a panic caught by `CatchPanicLayer`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal error")),
    )
        .into_response()
}
