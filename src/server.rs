//! Server module for managing HTTP server lifecycle
//!
//! This module handles server initialization, startup, and graceful shutdown.

use tokio::net::TcpListener;
use tokio::signal;

use crate::api::routes::create_router;
use crate::config::{Environment, Secrets, Settings};
use crate::state::AppState;

/// HTTP server manager
pub struct Server {
    settings: Settings,
    secrets: Secrets,
    environment: Environment,
}

impl Server {
    /// Create a new server with the given settings
    pub fn new(settings: Settings, secrets: Secrets) -> Self {
        Self {
            settings,
            secrets,
            environment: Environment::from_env(),
        }
    }

    /// Report `environment` instead of the one read from `LAUNCHPAD_APP_ENV`.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Start the server and run until shutdown signal
    ///
    /// # Errors
    /// - HTTP client initialization errors
    /// - Address binding errors
    /// - Server runtime errors
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(
            app_name = %self.settings.application.name,
            app_version = %self.settings.application.version,
            environment = %self.environment.as_str(),
            "Application starting"
        );

        if self.environment.is_production()
            && matches!(self.settings.logger.level.as_str(), "debug" | "trace")
        {
            tracing::warn!(
                level = %self.settings.logger.level,
                "Verbose logging is enabled in production"
            );
        }

        tracing::info!(
            host = %self.settings.server.host,
            port = %self.settings.server.port,
            request_timeout = %self.settings.server.request_timeout,
            "Server configuration loaded"
        );

        tracing::info!(
            enabled = %self.settings.cache.enabled,
            backend = ?self.settings.cache.backend,
            sol_price_ttl = %self.settings.functions.sol_price_ttl_seconds,
            token_market_ttl = %self.settings.functions.token_market_ttl_seconds,
            "Response cache configured"
        );

        let address = self.settings.server.address();
        let state = AppState::new(self.settings, self.secrets)
            .map_err(|e| anyhow::anyhow!("Failed to create application state: {e}"))?;
        let shutdown = state.shutdown.clone();
        tracing::info!("Application state created");

        let router = create_router(state);
        tracing::info!("Router configured");

        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;

        tracing::info!(address = %address, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                // Open event streams would otherwise hold the shutdown open.
                shutdown.cancel();
            })
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
