//! Layered settings loading.
//!
//! Sources, lowest precedence first:
//! 1. `default.toml` (required)
//! 2. `{environment}.toml`
//! 3. `local.toml`
//! 4. `LAUNCHPAD_*` variables, `__` separating nested keys
//!    (`LAUNCHPAD_SERVER__PORT` sets `server.port`)
//!
//! `LAUNCHPAD_CONFIG_FILE` (or `--config`) replaces the three files with one.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

const CONFIG_DIR_ENV: &str = "LAUNCHPAD_CONFIG_DIR";
const CONFIG_FILE_ENV: &str = "LAUNCHPAD_CONFIG_FILE";
const DEFAULT_CONFIG_DIR: &str = "config";
const ENV_PREFIX: &str = "LAUNCHPAD";
const ENV_SEPARATOR: &str = "__";

/// One TOML layer and whether startup fails without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    pub path: PathBuf,
    pub required: bool,
}

impl ConfigLayer {
    fn required(path: PathBuf) -> Self {
        Self { path, required: true }
    }

    fn optional(path: PathBuf) -> Self {
        Self {
            path,
            required: false,
        }
    }
}

#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// Replaces the layered directory when set.
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Reads `LAUNCHPAD_CONFIG_DIR`, `LAUNCHPAD_CONFIG_FILE` and
    /// `LAUNCHPAD_APP_ENV`; the first two are mutually exclusive.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from);
        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_dir.is_some() && config_file.is_some() {
            return Err(ConfigError::ConflictingSources);
        }

        Ok(Self {
            config_dir: config_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            config_file,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Load a single file instead of the layered directory (CLI `--config`).
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Override the environment read from `LAUNCHPAD_APP_ENV` (CLI `--env`).
    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Files consulted by [`load`](Self::load), in merge order.
    pub fn layers(&self) -> Vec<ConfigLayer> {
        match &self.config_file {
            Some(file) => vec![ConfigLayer::required(file.clone())],
            None => vec![
                ConfigLayer::required(self.config_dir.join("default.toml")),
                ConfigLayer::optional(self.config_dir.join(self.environment.config_file_name())),
                ConfigLayer::optional(self.config_dir.join("local.toml")),
            ],
        }
    }

    /// Merge every layer plus `LAUNCHPAD_*` overrides, then validate.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let settings: Settings = self
            .build_config()?
            .try_deserialize()
            .map_err(|e| ConfigError::Deserialize(e.to_string()))?;

        settings.validate()?;
        tracing::debug!(environment = %self.environment, "configuration loaded");
        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = self
            .layers()
            .into_iter()
            .try_fold(Config::builder(), |builder, layer| Self::add_layer(builder, &layer))?;

        Self::add_env_source(builder).build().map_err(ConfigError::from)
    }

    fn add_layer(
        builder: ConfigBuilder<DefaultState>,
        layer: &ConfigLayer,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if layer.required && !layer.path.exists() {
            return Err(ConfigError::MissingFile(layer.path.clone()));
        }

        Ok(builder.add_source(
            File::from(layer.path.as_path())
                .format(FileFormat::Toml)
                .required(layer.required),
        ))
    }

    fn add_env_source(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: None,
            environment: AppEnvironment::default(),
        })
    }
}
