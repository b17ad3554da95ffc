use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryErrorKind {
    Transport,
    Http,
    Decode,
    Timeout,
    Validation,
    Cancelled,
    TypeMismatch,
}

impl QueryErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryErrorKind::Transport => "transport",
            QueryErrorKind::Http => "http",
            QueryErrorKind::Decode => "decode",
            QueryErrorKind::Timeout => "timeout",
            QueryErrorKind::Validation => "validation",
            QueryErrorKind::Cancelled => "cancelled",
            QueryErrorKind::TypeMismatch => "type_mismatch",
        }
    }
}

impl fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a query fetch.
///
/// Cheap to clone: every caller joined to one in-flight fetch receives a copy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct QueryError {
    kind: QueryErrorKind,
    message: Arc<str>,
}

impl QueryError {
    pub fn new(kind: QueryErrorKind, message: impl Into<Arc<str>>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<Arc<str>>) -> Self {
        Self::new(QueryErrorKind::Transport, message)
    }

    pub fn http(message: impl Into<Arc<str>>) -> Self {
        Self::new(QueryErrorKind::Http, message)
    }

    pub fn decode(message: impl Into<Arc<str>>) -> Self {
        Self::new(QueryErrorKind::Decode, message)
    }

    pub fn timeout(message: impl Into<Arc<str>>) -> Self {
        Self::new(QueryErrorKind::Timeout, message)
    }

    pub fn validation(message: impl Into<Arc<str>>) -> Self {
        Self::new(QueryErrorKind::Validation, message)
    }

    pub fn cancelled(message: impl Into<Arc<str>>) -> Self {
        Self::new(QueryErrorKind::Cancelled, message)
    }

    pub(crate) fn type_mismatch<T>(key: &impl fmt::Display) -> Self {
        Self::new(
            QueryErrorKind::TypeMismatch,
            format!(
                "cached value for {key} is not a {}",
                std::any::type_name::<T>()
            ),
        )
    }

    pub fn kind(&self) -> QueryErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
