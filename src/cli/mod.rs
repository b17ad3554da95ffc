//! Command-line interface
//!
//! - Argument parsing with clap
//! - Configuration merging (CLI args + config files)
//! - Command execution: `serve` and `derive-uuid`

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::execute_command;
pub use parser::{Cli, Commands, Environment, LogLevel};

use crate::config::settings::Settings;
use crate::logger::{LogLevelHandle, init_logger};

/// Initialize the global logger from settings.
///
/// # Errors
/// Returns error if the logger configuration is invalid or a global
/// subscriber is already installed
pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<LogLevelHandle> {
    let logger_config = settings
        .logger
        .clone()
        .into_logger_config()
        .map_err(|e| anyhow::anyhow!("Logger configuration error: {e}"))?;

    init_logger(logger_config).map_err(|e| anyhow::anyhow!("Logger initialization error: {e}"))
}
