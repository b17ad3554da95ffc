//! Deployment environment, selecting the `{environment}.toml` layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Staging,
    Production,
}

impl Environment {
    pub const ENV_VAR: &'static str = "LAUNCHPAD_APP_ENV";

    pub const ALL: [Environment; 4] = [
        Environment::Development,
        Environment::Test,
        Environment::Staging,
        Environment::Production,
    ];

    /// Reads `LAUNCHPAD_APP_ENV`; unset or unrecognised values fall back to
    /// development.
    pub fn from_env() -> Self {
        match std::env::var(Self::ENV_VAR) {
            Ok(raw) => raw.parse().unwrap_or_else(|e: ConfigError| {
                tracing::warn!(error = %e, "ignoring {}", Self::ENV_VAR);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    fn short_name(&self) -> Option<&'static str> {
        match self {
            Environment::Development => Some("dev"),
            Environment::Staging => Some("stage"),
            Environment::Production => Some("prod"),
            Environment::Test => None,
        }
    }

    /// File name of this environment's configuration layer.
    pub fn config_file_name(&self) -> String {
        format!("{}.toml", self.as_str())
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|env| env.as_str() == wanted || env.short_name() == Some(wanted.as_str()))
            .ok_or_else(|| ConfigError::UnknownEnvironment(s.to_string()))
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_and_short_names() {
        for env in Environment::ALL {
            assert_eq!(env.as_str().parse::<Environment>().unwrap(), env);
            if let Some(short) = env.short_name() {
                assert_eq!(short.parse::<Environment>().unwrap(), env);
            }
        }
    }

    #[test]
    fn test_parse_ignores_case_and_whitespace() {
        assert_eq!(" Production ".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("STAGE".parse::<Environment>().unwrap(), Environment::Staging);
    }

    #[test]
    fn test_unknown_environment() {
        match "qa".parse::<Environment>() {
            Err(ConfigError::UnknownEnvironment(raw)) => assert_eq!(raw, "qa"),
            other => panic!("expected UnknownEnvironment, got {other:?}"),
        }
    }

    #[test]
    fn test_config_file_name() {
        assert_eq!(Environment::Staging.config_file_name(), "staging.toml");
        assert_eq!(Environment::default(), Environment::Development);
        assert!(Environment::Production.is_production());
        assert!(!Environment::Test.is_production());
    }
}
