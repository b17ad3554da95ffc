//! Configuration validation logic
//!
//! Validation methods for every configuration section, so a bad value fails
//! at startup instead of on the first request that needs it.

use crate::config::error::ConfigError;
use crate::config::settings::{
    CacheBackend, CacheConfig, FileSettings, FunctionsConfig, LoggerSettings, RealtimeConfig,
    ServerConfig, Settings, UpstreamsConfig,
};
use crate::logger::{LogFormat, VALID_LOG_LEVELS, base_level};

impl ServerConfig {
    /// Validate server configuration
    ///
    /// # Validation Rules
    /// - Port must be between 1 and 65535
    /// - Request timeout must be greater than 0
    /// - Keep-alive timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::invalid(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::invalid(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::invalid(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if let Err(e) = self.format.parse::<LogFormat>() {
            return Err(ConfigError::invalid("logger.file.format", e.to_string()));
        }

        if self.rotation.max_size == 0 || self.rotation.max_files == 0 {
            return Err(ConfigError::invalid(
                "logger.file.rotation",
                "Rotation max_size and max_files must be greater than 0.",
            ));
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    ///
    /// The leading directive must be a plain level; per-target directives
    /// (`hyper=warn`) are passed through to `EnvFilter` unchecked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = base_level(&self.level).to_ascii_lowercase();

        if !VALID_LOG_LEVELS.contains(&base.as_str()) {
            return Err(ConfigError::Invalid {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::invalid(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        self.file.validate()
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.backend == CacheBackend::Memory {
            if self.memory.max_size == 0 {
                return Err(ConfigError::invalid(
                    "cache.memory.max_size",
                    "Memory cache max_size must be greater than 0.",
                ));
            }
            if self.memory.ttl_seconds == 0 {
                return Err(ConfigError::invalid(
                    "cache.memory.ttl_seconds",
                    "Memory cache ttl_seconds must be greater than 0.",
                ));
            }
        }
        Ok(())
    }
}

impl UpstreamsConfig {
    /// Every base URL must be absolute http(s).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let urls = [
            ("upstreams.price_url", &self.price_url),
            ("upstreams.dexscreener_url", &self.dexscreener_url),
            ("upstreams.twitter_api_url", &self.twitter_api_url),
        ];

        for (field, url) in urls {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    field: field.to_string(),
                    message: format!("'{url}' is not an absolute http(s) URL."),
                });
            }
        }

        if self.price_key_header.trim().is_empty() {
            return Err(ConfigError::invalid(
                "upstreams.price_key_header",
                "Price API key header name must not be empty.",
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(ConfigError::invalid(
                "upstreams.timeout_seconds",
                "Upstream timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl FunctionsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(10..=100).contains(&self.social_posts_default_limit) {
            return Err(ConfigError::Invalid {
                field: "functions.social_posts_default_limit".to_string(),
                message: format!(
                    "Default limit {} is outside the accepted range 10..=100.",
                    self.social_posts_default_limit
                ),
            });
        }

        for (field, table) in [
            ("functions.vanity_table", &self.vanity_table),
            ("functions.views_table", &self.views_table),
        ] {
            if table.trim().is_empty() {
                return Err(ConfigError::invalid(field, "Table name must not be empty."));
            }
        }

        Ok(())
    }
}

impl RealtimeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::invalid(
                "realtime.channel_capacity",
                "Channel capacity must be greater than 0.",
            ));
        }
        if self.keep_alive_seconds == 0 {
            return Err(ConfigError::invalid(
                "realtime.keep_alive_seconds",
                "Keep-alive interval must be greater than 0 seconds.",
            ));
        }
        Ok(())
    }
}

impl Settings {
    /// Validate all configuration settings, returning the first failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logger.validate()?;
        self.cache.validate()?;
        self.upstreams.validate()?;
        self.functions.validate()?;
        self.realtime.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: Result<(), ConfigError>) -> String {
        let err = result.expect_err("expected validation error");
        err.field().expect("error names a field").to_string()
    }

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_server_port_zero() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert_eq!(field_of(settings.validate()), "server.port");
    }

    #[test]
    fn test_server_request_timeout_zero() {
        let mut settings = Settings::default();
        settings.server.request_timeout = 0;
        assert_eq!(field_of(settings.validate()), "server.request_timeout");
    }

    #[test]
    fn test_logger_directives_accepted() {
        let mut settings = Settings::default();
        settings.logger.level = "warn,launchpad_edge::query=trace".to_string();
        assert!(settings.validate().is_ok());

        settings.logger.level = "verbose".to_string();
        assert_eq!(field_of(settings.validate()), "logger.level");
    }

    #[test]
    fn test_logger_requires_an_output() {
        let mut settings = Settings::default();
        settings.logger.console.enabled = false;
        assert_eq!(field_of(settings.validate()), "logger");
    }

    #[test]
    fn test_disabled_cache_skips_memory_checks() {
        let mut settings = Settings::default();
        settings.cache.memory.max_size = 0;
        assert_eq!(field_of(settings.validate()), "cache.memory.max_size");

        settings.cache.enabled = false;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_relative_upstream_url_rejected() {
        let mut settings = Settings::default();
        settings.upstreams.dexscreener_url = "api.dexscreener.com".to_string();
        assert_eq!(field_of(settings.validate()), "upstreams.dexscreener_url");
    }

    #[test]
    fn test_social_posts_limit_range() {
        let mut settings = Settings::default();
        settings.functions.social_posts_default_limit = 5;
        assert_eq!(
            field_of(settings.validate()),
            "functions.social_posts_default_limit"
        );
    }

    #[test]
    fn test_realtime_capacity_zero() {
        let mut settings = Settings::default();
        settings.realtime.channel_capacity = 0;
        assert_eq!(field_of(settings.validate()), "realtime.channel_capacity");
    }
}
