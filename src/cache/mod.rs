//! Server-side response cache for the edge functions.
//!
//! Backends:
//! - `memory`: in-process, `cached::TimedSizedCache`
//! - `none`: [`DisabledStore`], every lookup misses
//!
//! # Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! backend = "memory"  # or "none"
//!
//! [cache.memory]
//! max_size = 1000
//! ttl_seconds = 300
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let price: SolPrice = cache
//!     .get_or_fetch_json("sol-price", Some(30), || upstream.sol_price())
//!     .await?;
//! ```

mod error;
mod manager;
mod memory;
mod store;

pub use error::CacheError;
pub use manager::CacheManager;
pub use memory::MemoryCache;
pub use store::{DisabledStore, ResponseStore};

pub use crate::config::settings::{CacheBackend, CacheConfig, MemoryCacheConfig};
