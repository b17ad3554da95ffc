//! Serve command handler
//!
//! Handles the serve command including dry-run validation and server startup.

use crate::config::secrets::names;
use crate::config::{Environment, Secrets, Settings};
use crate::external::build_http_client;
use crate::server::Server;

/// Every secret an edge function may look up.
pub const SECRET_NAMES: &[&str] = &[
    names::PRICE_API_KEY,
    names::HELIUS_RPC_URL,
    names::TWITTER_BEARER_TOKEN,
    names::VANITY_SECRET,
    names::SUPABASE_URL,
    names::SUPABASE_ANON_KEY,
    names::SUPABASE_SERVICE_ROLE_KEY,
    names::DB_WEBHOOK_SECRET,
];

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
    secrets: Secrets,
    environment: Environment,
}

impl ServeCommandHandler {
    pub fn new(config: Settings, secrets: Secrets, environment: Environment) -> Self {
        Self {
            config,
            secrets,
            environment,
        }
    }

    /// Run the server, or with `dry_run` only validate and report.
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - Server startup errors (if not dry-run)
    pub async fn execute(self, dry_run: bool) -> anyhow::Result<()> {
        if dry_run {
            return self.validate_only();
        }

        Server::new(self.config, self.secrets)
            .with_environment(self.environment)
            .run()
            .await
    }

    /// Validate configuration without starting the server.
    ///
    /// Missing secrets are reported, not fatal: each one only disables the
    /// functions that need it.
    pub fn validate_only(&self) -> anyhow::Result<()> {
        self.config.validate()?;
        build_http_client(&self.config.upstreams)
            .map_err(|e| anyhow::anyhow!("Upstream HTTP client configuration is invalid: {e}"))?;

        println!("✓ Configuration is valid ({})", self.environment.as_str());
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!("✓ Upstream HTTP client builds");

        for (name, configured) in self.secret_report() {
            let mark = if configured { '✓' } else { '✗' };
            let status = if configured { "set" } else { "missing" };
            println!("{mark} {name}: {status}");
        }

        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }

    /// Which secrets currently resolve to a non-blank value.
    pub fn secret_report(&self) -> Vec<(&'static str, bool)> {
        SECRET_NAMES
            .iter()
            .map(|name| (*name, self.secrets.get(name).is_some()))
            .collect()
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
