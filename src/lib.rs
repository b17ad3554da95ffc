//! Launchpad edge library
//!
//! Edge-function proxies for the agent token launchpad, the cached query
//! client behind its data hooks, realtime cache invalidation and the SDK
//! that calls the functions.

use shadow_rs::shadow;
shadow!(build);

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod external;
pub mod logger;
pub mod query;
pub mod realtime;
pub mod sdk;
pub mod server;
pub mod services;
pub mod state;
pub mod utils;

pub use state::AppState;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
