//! Configuration settings structures for launchpad-edge
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables. Secrets are deliberately absent; see
//! [`crate::config::secrets`].

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig, RotationConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "launchpad-edge".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    54321
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/launchpad-edge.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_max_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_max_files() -> usize {
    5
}

fn default_cache_ttl() -> u64 {
    60
}

fn default_cache_max_size() -> usize {
    1000
}

fn default_price_url() -> String {
    "https://pro-api.coingecko.com/api/v3/simple/price".to_string()
}

fn default_price_key_header() -> String {
    "x-cg-pro-api-key".to_string()
}

fn default_dexscreener_url() -> String {
    "https://api.dexscreener.com".to_string()
}

fn default_twitter_api_url() -> String {
    "https://api.twitter.com/2".to_string()
}

fn default_upstream_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("launchpad-edge/{}", crate::pkg_version())
}

fn default_sol_price_ttl() -> u64 {
    30
}

fn default_token_market_ttl() -> u64 {
    60
}

fn default_social_posts_limit() -> u32 {
    10
}

fn default_vanity_table() -> String {
    "vanity_keypairs".to_string()
}

fn default_views_table() -> String {
    "agent_views".to_string()
}

fn default_channel_capacity() -> usize {
    256
}

fn default_keep_alive_seconds() -> u64 {
    15
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// Axum HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds a handler may take before the request fails with a 500
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl ServerConfig {
    /// Get the full server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// Size rotation settings for file logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationSettings {
    /// Maximum file size in bytes before rotation
    #[serde(default = "default_max_size")]
    pub max_size: u64,

    /// Maximum number of rotated files to keep
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            max_files: default_max_files(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub path: String,

    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,

    #[serde(default)]
    pub rotation: RotationSettings,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
            rotation: RotationSettings::default(),
        }
    }
}

/// Logger configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level or `EnvFilter` directives, e.g. "info,launchpad_edge::query=debug"
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert the file representation into the runtime [`LoggerConfig`].
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console = ConsoleConfig::new(self.console.enabled, self.console.colored);
        let file = self.file.into_file_config()?;

        LoggerConfig::new(console, file, self.level)
            .map_err(|e| ConfigError::invalid("logger", e.to_string()))
    }
}

impl FileSettings {
    pub fn into_file_config(self) -> Result<FileConfig, ConfigError> {
        let format = self
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::invalid("logger.file.format", e.to_string()))?;
        let rotation = RotationConfig::new(self.rotation.max_size, self.rotation.max_files)
            .map_err(|e| ConfigError::invalid("logger.file.rotation", e.to_string()))?;

        FileConfig::new(
            self.enabled,
            PathBuf::from(self.path),
            self.append,
            format,
            rotation,
        )
        .map_err(|e| ConfigError::invalid("logger.file", e.to_string()))
    }
}

// ============================================================================
// Cache Configuration
// ============================================================================

/// Response cache backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    None,
}

/// Memory cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCacheConfig {
    /// Maximum number of entries in the cache
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,

    /// Upper bound on entry lifetime in seconds; per-entry TTLs are clamped to it
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_size: default_cache_max_size(),
            ttl_seconds: default_cache_ttl(),
        }
    }
}

/// Server-side response cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub backend: CacheBackend,

    #[serde(default)]
    pub memory: MemoryCacheConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            backend: CacheBackend::default(),
            memory: MemoryCacheConfig::default(),
        }
    }
}

// ============================================================================
// Upstream APIs
// ============================================================================

/// Base URLs and client settings for the third-party APIs the proxies call.
///
/// Credentials and the RPC / Supabase URLs come from the environment at
/// request time and are not listed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamsConfig {
    #[serde(default = "default_price_url")]
    pub price_url: String,

    /// Header carrying `PRICE_API_KEY`
    #[serde(default = "default_price_key_header")]
    pub price_key_header: String,

    #[serde(default = "default_dexscreener_url")]
    pub dexscreener_url: String,

    #[serde(default = "default_twitter_api_url")]
    pub twitter_api_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl UpstreamsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            price_url: default_price_url(),
            price_key_header: default_price_key_header(),
            dexscreener_url: default_dexscreener_url(),
            twitter_api_url: default_twitter_api_url(),
            timeout_seconds: default_upstream_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

// ============================================================================
// Edge functions
// ============================================================================

/// Per-function tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionsConfig {
    /// Response cache TTL for `sol-price`, seconds
    #[serde(default = "default_sol_price_ttl")]
    pub sol_price_ttl_seconds: u64,

    /// Response cache TTL for `token-market`, seconds
    #[serde(default = "default_token_market_ttl")]
    pub token_market_ttl_seconds: u64,

    /// `limit` used by `social-posts` when the caller omits it
    #[serde(default = "default_social_posts_limit")]
    pub social_posts_default_limit: u32,

    /// PostgREST table holding pre-generated vanity keypairs
    #[serde(default = "default_vanity_table")]
    pub vanity_table: String,

    /// PostgREST table receiving `track-view` rows
    #[serde(default = "default_views_table")]
    pub views_table: String,
}

impl Default for FunctionsConfig {
    fn default() -> Self {
        Self {
            sol_price_ttl_seconds: default_sol_price_ttl(),
            token_market_ttl_seconds: default_token_market_ttl(),
            social_posts_default_limit: default_social_posts_limit(),
            vanity_table: default_vanity_table(),
            views_table: default_views_table(),
        }
    }
}

// ============================================================================
// Realtime
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Broadcast buffer per subscriber before it starts lagging
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// SSE keep-alive comment interval, seconds
    #[serde(default = "default_keep_alive_seconds")]
    pub keep_alive_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            keep_alive_seconds: default_keep_alive_seconds(),
        }
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logger: LoggerSettings,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub upstreams: UpstreamsConfig,

    #[serde(default)]
    pub functions: FunctionsConfig,

    #[serde(default)]
    pub realtime: RealtimeConfig,
}
