//! Cached query resource.
//!
//! [`QueryClient`] is an explicit, cloneable store of fetched values keyed by
//! [`QueryKey`]. It deduplicates concurrent fetches per key, tracks staleness,
//! serves cached data when a refresh fails, polls observed queries and
//! garbage-collects entries nobody observes.
//!
//! ```ignore
//! let client = QueryClient::default();
//! let key = QueryKey::new("sol-price");
//! let state = client
//!     .query(&key, client.defaults(), || sdk.sol_price())
//!     .await;
//! println!("{}", state.data.price);
//! ```

mod client;
mod entry;
mod error;
mod key;
mod observer;
mod options;
mod state;


pub use client::QueryClient;
pub use error::{QueryError, QueryErrorKind};
pub use key::{KeyFilter, QueryKey};
pub use observer::QueryObserver;
pub use options::{DEFAULT_GC_TIME, DEFAULT_STALE_TIME, QueryOptions};
pub use state::QueryState;
