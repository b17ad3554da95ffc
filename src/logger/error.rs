//! Error types for the logger

use thiserror::Error;

/// Errors that can occur while configuring or running the logger
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Rotation error: {message}")]
    Rotation { message: String },

    #[error("Failed to reload log filter: {message}")]
    Reload { message: String },
}

impl LoggerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn rotation(message: impl Into<String>) -> Self {
        Self::Rotation {
            message: message.into(),
        }
    }

    pub fn reload(message: impl Into<String>) -> Self {
        Self::Reload {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoggerError>;
