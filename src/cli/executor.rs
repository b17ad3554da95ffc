//! Command executor for dispatching CLI commands
//!
//! This module provides the main entry point for executing CLI commands
//! after parsing.

use super::handlers::{DeriveUuidCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use super::{ConfigurationMerger, init_logger_from_settings};
use crate::config::Secrets;

/// Execute the parsed command.
///
/// `derive-uuid` needs no configuration; `serve` loads and merges it,
/// initializes logging (except for dry runs, which only print) and runs
/// the server until shutdown.
///
/// # Errors
/// Returns validation, configuration, logger or server errors
pub async fn execute_command(cli: &Cli) -> anyhow::Result<()> {
    cli.validate().map_err(|msg| anyhow::anyhow!("Invalid arguments: {msg}"))?;

    match cli.effective_command() {
        Commands::DeriveUuid { privy_user_id } => {
            DeriveUuidCommandHandler::new(privy_user_id).execute()
        }
        Commands::Serve { dry_run, .. } => {
            let merger = ConfigurationMerger::from_cli(cli)
                .map_err(|e| anyhow::anyhow!("Configuration error: {e}"))?;
            let settings = merger
                .merge_cli_args(cli)
                .map_err(|e| anyhow::anyhow!("Configuration merge error: {e}"))?;
            let handler = ServeCommandHandler::new(settings, Secrets::from_env(), merger.environment());

            if dry_run {
                return handler.execute(true).await;
            }

            // Keep the handle alive for the server's lifetime.
            let _log_handle = init_logger_from_settings(handler.config())?;
            handler.execute(false).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[tokio::test]
    async fn test_execute_derive_uuid() {
        let cli = Cli::try_parse_from(["launchpad-edge", "derive-uuid", "did:privy:abc"]).unwrap();
        assert!(execute_command(&cli).await.is_ok());
    }

    #[tokio::test]
    async fn test_execute_rejects_invalid_args() {
        let cli = Cli {
            command: Some(Commands::DeriveUuid {
                privy_user_id: "  ".to_string(),
            }),
            config: None,
            env: None,
            verbose: false,
            quiet: false,
        };
        let err = execute_command(&cli).await.unwrap_err();
        assert!(err.to_string().contains("Invalid arguments"));
    }
}
