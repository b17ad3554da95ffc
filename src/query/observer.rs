use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::query::client::downcast;
use crate::query::entry::{ErasedResult, FetchOutcome, QueryEntry};
use crate::query::{QueryError, QueryKey, QueryState};

type ErasedFetcher = Arc<dyn Fn() -> BoxFuture<'static, ErasedResult> + Send + Sync>;

/// A live subscription to one query, created by
/// [`QueryClient::observe`](crate::query::QueryClient::observe).
///
/// While it exists the entry is exempt from gc and, if configured, polled.
/// Dropping it stops polling and, for the last observer, starts the gc
/// countdown.
pub struct QueryObserver<T> {
    entry: Arc<QueryEntry>,
    fetcher: ErasedFetcher,
    placeholder: Arc<T>,
    version: watch::Receiver<u64>,
    cancel: CancellationToken,
}

impl<T> QueryObserver<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new(
        entry: Arc<QueryEntry>,
        fetcher: ErasedFetcher,
        placeholder: Arc<T>,
        cancel: CancellationToken,
    ) -> Self {
        let version = entry.subscribe();
        Self {
            entry,
            fetcher,
            placeholder,
            version,
            cancel,
        }
    }

    pub fn key(&self) -> &QueryKey {
        self.entry.key()
    }

    /// Current snapshot, without fetching.
    pub fn state(&self) -> QueryState<T> {
        self.entry.snapshot(|| Arc::clone(&self.placeholder))
    }

    /// Refetch if stale, then return the snapshot. Never fails.
    pub async fn read(&self) -> QueryState<T> {
        let fetcher = &self.fetcher;
        if let FetchOutcome::Pending(pending) = self.entry.fetch(false, || fetcher()) {
            if let Err(error) = pending.await {
                tracing::debug!(key = %self.entry.key(), %error, "observer read failed, serving fallback");
            }
        }
        self.state()
    }

    /// Fetch regardless of freshness. Joins a fetch that is already running.
    pub async fn refetch(&self) -> Result<Arc<T>, QueryError> {
        let fetcher = &self.fetcher;
        let value = match self.entry.fetch(true, || fetcher()) {
            FetchOutcome::Fresh(value) => value,
            FetchOutcome::Pending(pending) => pending.await?,
        };
        downcast(self.entry.key(), value)
    }

    /// Wait until the entry changes: a fetch starts or ends, data is written,
    /// or the entry is invalidated.
    pub async fn changed(&mut self) {
        // The entry owns the sender and we hold the entry, so this only
        // returns once a new version is published.
        let _ = self.version.changed().await;
    }
}

impl<T> Drop for QueryObserver<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.entry.remove_observer();
    }
}

impl<T> std::fmt::Debug for QueryObserver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryObserver")
            .field("key", self.entry.key())
            .finish_non_exhaustive()
    }
}
