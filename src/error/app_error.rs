use axum::extract::rejection::{JsonRejection, QueryRejection};
use thiserror::Error;

/// Maximum number of upstream body bytes kept for diagnostics.
const UPSTREAM_BODY_LIMIT: usize = 512;

/// Error type shared by every edge function.
///
/// Each variant maps to exactly one HTTP status and is rendered as the
/// `{ "success": false, "error": ... }` envelope by the API layer.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid request input
    #[error("{message}")]
    BadRequest { message: String },

    /// Missing or incorrect caller credential
    #[error("Unauthorized")]
    Unauthorized,

    /// The function does not accept this HTTP verb
    #[error("Method {method} not allowed; expected {allowed}")]
    MethodNotAllowed { method: String, allowed: String },

    /// A server-side secret required by the function is absent
    #[error("Server misconfigured: {key} is not set")]
    Configuration { key: String },

    /// The third-party API failed or returned something unusable
    #[error("{service} request failed: {message}")]
    Upstream {
        service: String,
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },

    /// Route does not exist
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
        }
    }

    pub fn missing_param(name: &str) -> Self {
        AppError::BadRequest {
            message: format!("Missing required parameter: {name}"),
        }
    }

    pub fn configuration(key: impl Into<String>) -> Self {
        AppError::Configuration { key: key.into() }
    }

    /// Upstream failure without an HTTP response (connect, timeout, decode).
    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Upstream {
            service: service.into(),
            message: message.into(),
            status: None,
            body: None,
        }
    }

    /// Upstream answered with a non-success status; the body is kept,
    /// truncated, for diagnostics.
    pub fn upstream_status(service: impl Into<String>, status: u16, body: &str) -> Self {
        let mut body = body.trim().to_string();
        if body.len() > UPSTREAM_BODY_LIMIT {
            let mut cut = UPSTREAM_BODY_LIMIT;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        AppError::Upstream {
            service: service.into(),
            message: format!("upstream responded with status {status}"),
            status: Some(status),
            body: if body.is_empty() { None } else { Some(body) },
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{field}: invalid value"),
                })
            })
            .collect();
        messages.sort();
        AppError::BadRequest {
            message: messages.join("; "),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;
