//! Realtime invalidation.
//!
//! Row changes arrive as [`ChangeEvent`]s (from the database webhook, the
//! SSE feed, or any other stream) and an [`InvalidationListener`] turns them
//! into cache invalidations or direct cache writes on a
//! [`QueryClient`](crate::query::QueryClient). Delivery is best effort; an
//! observer with a `refetch_interval` still converges when events are lost.

mod event;
mod feed;
mod listener;

pub use event::{ChangeEvent, ChangeOperation};
pub use feed::ChangeFeed;
pub use listener::{InvalidationListener, InvalidationRule, RuleBuilder};
