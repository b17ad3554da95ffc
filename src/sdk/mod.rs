//! Client SDK for the launchpad edge functions.
//!
//! - `client` - typed calls to every function plus the public agent tables
//! - `queries` - the same resources behind a [`QueryClient`](crate::query::QueryClient)
//! - `realtime` - the change-event stream
//! - `outbox` - fire-and-forget view telemetry
//!
//! ```ignore
//! let client = LaunchpadClient::builder("https://abc.supabase.co", anon_key).build()?;
//! let queries = LaunchpadQueries::new(client.clone(), QueryClient::default());
//! let listener = queries.listen(cancel.clone()).await?;
//! let price = queries.sol_price().await;
//! ```

mod client;
mod error;
mod outbox;
mod queries;
mod realtime;

pub use client::{Agent, DEFAULT_TIMEOUT, LaunchpadClient, LaunchpadClientBuilder};
pub use error::{ClientError, ClientResult};
pub use outbox::{DeadLetter, OutboxConfig, TelemetryOutbox, TelemetrySink};
pub use queries::{LaunchpadQueries, default_rules, keys};
pub use realtime::{RealtimeClient, SseDecoder, SseFrame, decode_events};
