//! Configuration merger for CLI arguments and config files
//!
//! Loads settings through [`ConfigLoader`] (honoring `--config` and `--env`)
//! and applies the command-line overrides on top.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Environment, settings::Settings};

/// Applies CLI overrides to file-based configuration.
///
/// Precedence, highest first: `serve` flags, global `-v`/`-q`, environment
/// variables, configuration files.
pub struct ConfigurationMerger {
    base_config: Settings,
    environment: Environment,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings, environment: Environment) -> Self {
        Self {
            base_config,
            environment,
        }
    }

    /// Load the base configuration selected by `--config` and `--env`.
    ///
    /// # Errors
    /// Returns ConfigError if configuration loading or validation fails
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new()?;
        if let Some(path) = &cli.config {
            loader = loader.with_config_file(path);
        }
        if let Some(env) = cli.env {
            loader = loader.with_environment(env.into());
        }

        let environment = loader.environment();
        Ok(Self::new(loader.load()?, environment))
    }

    /// Apply the CLI overrides and validate the result.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(Commands::Serve {
            host,
            port,
            log_level,
            ..
        }) = &cli.command
        {
            if let Some(host_addr) = host {
                config.server.host = host_addr.clone();
            }
            if let Some(port_num) = port {
                config.server.port = *port_num;
            }
            if let Some(level) = log_level {
                config.logger.level = (*level).into();
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }

    /// Environment the base configuration was loaded for.
    pub fn environment(&self) -> Environment {
        self.environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn merger() -> ConfigurationMerger {
        ConfigurationMerger::new(Settings::default(), Environment::Test)
    }

    fn merge(args: &[&str]) -> Settings {
        let cli = Cli::try_parse_from(args).unwrap();
        merger().merge_cli_args(&cli).unwrap()
    }

    #[test]
    fn test_no_flags_keeps_base() {
        assert_eq!(merge(&["launchpad-edge"]), Settings::default());
        assert_eq!(merger().environment(), Environment::Test);
    }

    #[test]
    fn test_verbose_and_quiet_flags() {
        assert_eq!(merge(&["launchpad-edge", "--verbose"]).logger.level, "debug");
        assert_eq!(merge(&["launchpad-edge", "--quiet"]).logger.level, "error");
    }

    #[test]
    fn test_serve_host_and_port() {
        let merged = merge(&["launchpad-edge", "serve", "--host", "0.0.0.0", "--port", "8080"]);
        assert_eq!(merged.server.host, "0.0.0.0");
        assert_eq!(merged.server.port, 8080);
    }

    #[test]
    fn test_command_log_level_overrides_global() {
        let merged = merge(&["launchpad-edge", "--verbose", "serve", "--log-level", "warn"]);
        assert_eq!(merged.logger.level, "warn");
    }

    #[test]
    fn test_derive_uuid_ignores_server_overrides() {
        let merged = merge(&["launchpad-edge", "derive-uuid", "did:privy:abc"]);
        assert_eq!(merged.server, Settings::default().server);
    }

    #[test]
    fn test_invalid_merged_config_is_rejected() {
        let mut base = Settings::default();
        base.realtime.channel_capacity = 0;
        let cli = Cli::try_parse_from(["launchpad-edge"]).unwrap();
        assert!(
            ConfigurationMerger::new(base, Environment::Development)
                .merge_cli_args(&cli)
                .is_err()
        );
    }
}
