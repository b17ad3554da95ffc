//! Configuration management
//!
//! Layered configuration loading with support for:
//! - TOML configuration files
//! - Environment variable overrides
//! - Multiple environment configurations (development, test, staging, production)
//!
//! # Configuration Priority (lowest to highest)
//! 1. `default.toml` - Base default configuration
//! 2. `{environment}.toml` - Environment-specific configuration
//! 3. `local.toml` - Local overrides (not committed to version control)
//! 4. `LAUNCHPAD_*` environment variables
//!
//! Secrets are resolved separately through [`secrets::Secrets`].

pub mod environment;
pub mod error;
pub mod loader;
pub mod secrets;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::{ConfigLayer, ConfigLoader};
pub use secrets::{EnvSecrets, SecretSource, Secrets, StaticSecrets};
pub use settings::{
    ApplicationConfig, CacheBackend, CacheConfig, FunctionsConfig, LoggerSettings,
    MemoryCacheConfig, RealtimeConfig, ServerConfig, Settings, UpstreamsConfig,
};
