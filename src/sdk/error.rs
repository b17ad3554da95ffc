//! SDK error types.

use std::time::Duration;

use thiserror::Error;

use crate::query::QueryError;

pub type ClientResult<T> = Result<T, ClientError>;

/// Failure of one SDK call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(String),

    /// The function answered with a non-success status.
    #[error("function returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Worth retrying: network trouble, timeouts and server-side failures.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) | ClientError::Timeout { .. } => true,
            ClientError::Api { status, .. } => *status >= 500 || *status == 429,
            ClientError::Decode(_) | ClientError::InvalidConfig(_) => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ClientError::Decode(error.to_string())
        } else {
            ClientError::Transport(error.to_string())
        }
    }
}

impl From<ClientError> for QueryError {
    fn from(error: ClientError) -> Self {
        let message = error.to_string();
        match error {
            ClientError::Transport(_) => QueryError::transport(message),
            ClientError::Api { .. } => QueryError::http(message),
            ClientError::Decode(_) => QueryError::decode(message),
            ClientError::Timeout { .. } => QueryError::timeout(message),
            ClientError::InvalidConfig(_) => QueryError::validation(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryErrorKind;

    #[test]
    fn test_query_error_kinds() {
        let cases = [
            (ClientError::Transport("refused".into()), QueryErrorKind::Transport),
            (
                ClientError::Api {
                    status: 400,
                    message: "Missing required parameter: suffix".into(),
                },
                QueryErrorKind::Http,
            ),
            (ClientError::Decode("eof".into()), QueryErrorKind::Decode),
            (
                ClientError::Timeout {
                    after: Duration::from_secs(10),
                },
                QueryErrorKind::Timeout,
            ),
            (ClientError::InvalidConfig("no secret".into()), QueryErrorKind::Validation),
        ];

        for (error, kind) in cases {
            let query_error: QueryError = error.into();
            assert_eq!(query_error.kind(), kind);
        }
    }

    #[test]
    fn test_api_message_survives_conversion() {
        let error: QueryError = ClientError::Api {
            status: 401,
            message: "Unauthorized".into(),
        }
        .into();
        assert!(error.message().contains("401"));
        assert!(error.message().contains("Unauthorized"));
    }

    #[test]
    fn test_retryable() {
        assert!(ClientError::Transport("reset".into()).is_retryable());
        assert!(ClientError::Api { status: 503, message: String::new() }.is_retryable());
        assert!(ClientError::Api { status: 429, message: String::new() }.is_retryable());
        assert!(!ClientError::Api { status: 400, message: String::new() }.is_retryable());
        assert!(!ClientError::Decode("bad".into()).is_retryable());
        assert!(ClientError::Api { status: 401, message: String::new() }.is_unauthorized());
    }
}
