//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Edge-function proxy server for the agent token launchpad
#[derive(Parser, Debug)]
#[command(name = "launchpad-edge")]
#[command(about = "Edge-function proxy server for the agent token launchpad")]
#[command(long_about = "
launchpad-edge serves the launchpad edge functions under /functions/v1/:
price feeds, token markets, Solana RPC, social posts, vanity keypair
progress, view tracking and the realtime change stream.

Secrets (PRICE_API_KEY, HELIUS_RPC_URL, TWITTER_BEARER_TOKEN, VANITY_SECRET,
SUPABASE_URL, SUPABASE_ANON_KEY, SUPABASE_SERVICE_ROLE_KEY, DB_WEBHOOK_SECRET)
are read from the environment on every request.

EXAMPLES:
    # Start the server with default configuration
    launchpad-edge serve

    # Start server on custom host and port
    launchpad-edge serve --host 0.0.0.0 --port 8080

    # Use custom configuration file
    launchpad-edge --config /path/to/config.toml serve

    # Check configuration and secrets without starting the server
    launchpad-edge serve --dry-run

    # Print the UUID a Privy user id maps to
    launchpad-edge derive-uuid did:privy:clx0abc
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Load this single TOML file instead of the layered configuration
    /// directory. The file must exist and be readable.
    ///
    /// Example: --config /etc/launchpad-edge/production.toml
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects which `{environment}.toml` layer is loaded, overriding
    /// LAUNCHPAD_APP_ENV.
    ///
    /// Available values: development (dev), test, staging (stage), production (prod)
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the edge-function server (default)
    ///
    /// Examples:
    ///   launchpad-edge serve                           # Start with defaults
    ///   launchpad-edge serve --host 0.0.0.0 --port 80 # Bind to all interfaces on port 80
    ///   launchpad-edge serve --dry-run                 # Validate config without starting
    Serve {
        /// Host address to bind to
        ///
        /// Use 127.0.0.1 for localhost only, or 0.0.0.0 to accept connections
        /// from any interface.
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override
        ///
        /// Takes precedence over the configuration file and the global
        /// --verbose/--quiet flags.
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration, report which secrets are set, and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the deterministic UUID for a Privy user id
    DeriveUuid {
        /// Privy user id, e.g. did:privy:clx0abc
        #[arg(value_name = "PRIVY_USER_ID", value_parser = super::validation::validate_privy_user_id)]
        privy_user_id: String,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Serve {
            host: None,
            port: None,
            log_level: None,
            dry_run: false,
        }
    }
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

/// Log level options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl Cli {
    /// The command to run; `serve` when none was given.
    pub fn effective_command(&self) -> Commands {
        self.command.clone().unwrap_or_default()
    }

    /// Checks that hold even when the struct is built without clap.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(Commands::DeriveUuid { privy_user_id }) = &self.command
            && privy_user_id.trim().is_empty()
        {
            return Err("Privy user id cannot be empty".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }

        Ok(())
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => "error".to_string(),
            LogLevel::Warn => "warn".to_string(),
            LogLevel::Info => "info".to_string(),
            LogLevel::Debug => "debug".to_string(),
            LogLevel::Trace => "trace".to_string(),
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_flag() {
        let err = Cli::try_parse_from(["launchpad-edge", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["launchpad-edge", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_default_is_serve() {
        let cli = Cli::try_parse_from(["launchpad-edge"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.effective_command(), Commands::default());
        assert!(!cli.verbose);
        assert!(!cli.quiet);
        assert!(cli.config.is_none());
        assert!(cli.env.is_none());
    }

    #[test]
    fn test_serve_command() {
        let cli = Cli::try_parse_from([
            "launchpad-edge",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--log-level",
            "warning",
        ])
        .unwrap();
        assert_eq!(
            cli.effective_command(),
            Commands::Serve {
                host: Some("0.0.0.0".to_string()),
                port: Some(8080),
                log_level: Some(LogLevel::Warn),
                dry_run: false,
            }
        );
    }

    #[test]
    fn test_derive_uuid_command() {
        let cli = Cli::try_parse_from(["launchpad-edge", "derive-uuid", "did:privy:abc"]).unwrap();
        assert_eq!(
            cli.effective_command(),
            Commands::DeriveUuid {
                privy_user_id: "did:privy:abc".to_string()
            }
        );
        assert!(cli.validate().is_ok());

        let err = Cli::try_parse_from(["launchpad-edge", "derive-uuid", " "]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let cli = Cli {
            command: Some(Commands::DeriveUuid {
                privy_user_id: String::new(),
            }),
            config: None,
            env: None,
            verbose: false,
            quiet: false,
        };
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_derive_uuid_requires_id() {
        let err = Cli::try_parse_from(["launchpad-edge", "derive-uuid"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_env_aliases() {
        let cli = Cli::try_parse_from(["launchpad-edge", "--env", "stage"]).unwrap();
        assert_eq!(cli.env, Some(Environment::Staging));
        assert_eq!(
            crate::config::Environment::from(Environment::Production),
            crate::config::Environment::Production
        );
    }

    #[test]
    fn test_conflicting_verbose_quiet() {
        let err = Cli::try_parse_from(["launchpad-edge", "--verbose", "--quiet"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
