//! Errors raised while loading or validating settings.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required configuration file {} does not exist", .0.display())]
    MissingFile(PathBuf),

    #[error("configuration could not be deserialized: {0}")]
    Deserialize(String),

    /// A setting holds a value the server cannot run with.
    #[error("invalid `{field}`: {message}")]
    Invalid { field: String, message: String },

    #[error("unknown environment `{0}` (expected development, test, staging or production)")]
    UnknownEnvironment(String),

    #[error(
        "LAUNCHPAD_CONFIG_DIR and LAUNCHPAD_CONFIG_FILE cannot both be set; \
         use the directory for layered configuration or the file for a single source"
    )]
    ConflictingSources,

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Dotted path of the offending setting, if this is a validation failure.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::Invalid { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_carries_field() {
        let err = ConfigError::invalid("server.port", "must not be 0");
        assert_eq!(err.field(), Some("server.port"));
        assert_eq!(err.to_string(), "invalid `server.port`: must not be 0");
        assert_eq!(ConfigError::ConflictingSources.field(), None);
    }

    #[test]
    fn test_missing_file_message() {
        let err = ConfigError::MissingFile(PathBuf::from("config/default.toml"));
        assert!(err.to_string().contains("config/default.toml"));
    }
}
