//! The query cache store.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::query::entry::{ErasedResult, ErasedValue, FetchOutcome, QueryEntry};
use crate::query::{KeyFilter, QueryError, QueryKey, QueryObserver, QueryOptions, QueryState};

/// Shared, cloneable cache of query results.
///
/// Every clone sees the same entries. Create one per process (or per test)
/// and pass it to whoever needs it.
#[derive(Clone, Default)]
pub struct QueryClient {
    inner: Arc<ClientInner>,
}

#[derive(Default)]
struct ClientInner {
    entries: DashMap<QueryKey, Arc<QueryEntry>>,
    defaults: QueryOptions,
}

pub(crate) fn erase<T, E, Fut>(future: Fut) -> BoxFuture<'static, ErasedResult>
where
    T: Send + Sync + 'static,
    E: Into<QueryError>,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    async move {
        future
            .await
            .map(|value| Arc::new(value) as ErasedValue)
            .map_err(Into::into)
    }
    .boxed()
}

pub(crate) fn downcast<T>(key: &QueryKey, value: ErasedValue) -> Result<Arc<T>, QueryError>
where
    T: Send + Sync + 'static,
{
    value
        .downcast::<T>()
        .map_err(|_| QueryError::type_mismatch::<T>(key))
}

impl QueryClient {
    pub fn new(defaults: QueryOptions) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                entries: DashMap::new(),
                defaults,
            }),
        }
    }

    /// Options used when a caller has no specific requirements.
    pub fn defaults(&self) -> QueryOptions {
        self.inner.defaults
    }

    /// Existing entry for `key` as is, or a new one with the client defaults.
    fn entry_or_default(&self, key: &QueryKey) -> Arc<QueryEntry> {
        let entry = self
            .inner
            .entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(QueryEntry::new(key.clone(), &self.inner.defaults)));
        Arc::clone(entry.value())
    }

    pub(crate) fn entry(&self, key: &QueryKey, options: &QueryOptions) -> Arc<QueryEntry> {
        if let Some(entry) = self.inner.entries.get(key) {
            entry.apply_options(options);
            return Arc::clone(entry.value());
        }

        let entry = self
            .inner
            .entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(QueryEntry::new(key.clone(), options)));
        entry.apply_options(options);
        Arc::clone(entry.value())
    }

    /// Return the cached value if fresh; otherwise join the in-flight fetch
    /// for `key` or start one. Errors propagate.
    pub async fn fetch_query<T, E, F, Fut>(
        &self,
        key: &QueryKey,
        options: QueryOptions,
        fetcher: F,
    ) -> Result<Arc<T>, QueryError>
    where
        T: Send + Sync + 'static,
        E: Into<QueryError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let entry = self.entry(key, &options);
        let value = match entry.fetch(false, || erase(fetcher())) {
            FetchOutcome::Fresh(value) => value,
            FetchOutcome::Pending(pending) => pending.await?,
        };
        downcast(key, value)
    }

    /// Fetch like [`fetch_query`](Self::fetch_query) but never fail.
    ///
    /// A failed fetch falls back to the cached value when there is one; with
    /// nothing cached the state carries `T::default()` as a placeholder plus
    /// the error.
    pub async fn query<T, E, F, Fut>(
        &self,
        key: &QueryKey,
        options: QueryOptions,
        fetcher: F,
    ) -> QueryState<T>
    where
        T: Default + Send + Sync + 'static,
        E: Into<QueryError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let entry = self.entry(key, &options);
        if let FetchOutcome::Pending(pending) = entry.fetch(false, || erase(fetcher())) {
            if let Err(error) = pending.await {
                tracing::debug!(%key, %error, "query failed, serving fallback");
            }
        }
        entry.snapshot(|| Arc::new(T::default()))
    }

    /// Register an observer for `key`.
    ///
    /// A stale entry is fetched right away in the background. With
    /// `refetch_interval` set, the entry is polled until the observer is
    /// dropped.
    pub fn observe<T, E, F, Fut>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        fetcher: F,
        placeholder: T,
    ) -> QueryObserver<T>
    where
        T: Send + Sync + 'static,
        E: Into<QueryError>,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let entry = self.entry(&key, &options);
        entry.add_observer();

        let fetcher: Arc<dyn Fn() -> BoxFuture<'static, ErasedResult> + Send + Sync> =
            Arc::new(move || erase(fetcher()));

        // The spawned fetch keeps running without a caller awaiting it.
        let _ = entry.fetch(false, || fetcher());

        let cancel = CancellationToken::new();
        if let Some(every) = options.refetch_interval {
            spawn_poller(Arc::clone(&entry), Arc::clone(&fetcher), every, cancel.clone());
        }

        QueryObserver::new(entry, fetcher, Arc::new(placeholder), cancel)
    }

    /// Cached value for `key`, without fetching. `None` when absent or when
    /// stored with a different type.
    pub fn get_query_data<T>(&self, key: &QueryKey) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let entry = self.inner.entries.get(key)?;
        entry.data()?.downcast::<T>().ok()
    }

    /// Store `value` for `key` as if it had just been fetched. The stale and
    /// gc windows already registered for `key` are kept.
    pub fn set_query_data<T>(&self, key: &QueryKey, value: T)
    where
        T: Send + Sync + 'static,
    {
        let entry = self.entry_or_default(key);
        entry.set_data(Arc::new(value));
    }

    /// Mark every matching entry stale. Never fetches; observers see the
    /// change and decide whether to refetch.
    pub fn invalidate(&self, filter: &KeyFilter) -> usize {
        let mut count = 0;
        for entry in self.inner.entries.iter() {
            if filter.matches(entry.key()) {
                entry.value().invalidate();
                count += 1;
            }
        }
        if count > 0 {
            tracing::debug!(?filter, count, "invalidated queries");
        }
        count
    }

    /// Drop one entry. Observers of it keep their detached copy.
    pub fn remove(&self, key: &QueryKey) -> bool {
        self.inner.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.inner.entries.clear();
    }

    /// Evict entries unobserved for at least their gc window with no fetch in flight.
    pub fn gc(&self) -> usize {
        let now = Instant::now();
        let evicted = AtomicUsize::new(0);
        self.inner.entries.retain(|key, entry| {
            let keep = !entry.is_collectable(now);
            if !keep {
                tracing::trace!(%key, "evicting query");
                evicted.fetch_add(1, Ordering::Relaxed);
            }
            keep
        });
        evicted.into_inner()
    }

    /// Run [`gc`](Self::gc) every `every` until `cancel` fires.
    pub fn spawn_gc(&self, every: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = client.gc();
                        if evicted > 0 {
                            tracing::debug!(evicted, remaining = client.len(), "query gc");
                        }
                    }
                }
            }
        })
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.inner
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_fetching())
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.inner
            .entries
            .get(key)
            .is_none_or(|entry| entry.is_stale())
    }

    pub fn observer_count(&self, key: &QueryKey) -> usize {
        self.inner
            .entries
            .get(key)
            .map_or(0, |entry| entry.observer_count())
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("entries", &self.len())
            .field("defaults", &self.inner.defaults)
            .finish()
    }
}

fn spawn_poller(
    entry: Arc<QueryEntry>,
    fetcher: Arc<dyn Fn() -> BoxFuture<'static, ErasedResult> + Send + Sync>,
    every: Duration,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if let FetchOutcome::Pending(pending) = entry.fetch(true, || fetcher()) {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    result = pending => {
                        if let Err(error) = result {
                            tracing::debug!(key = %entry.key(), %error, "poll failed");
                        }
                    }
                }
            }
        }

        tracing::trace!(key = %entry.key(), "poller stopped");
    });
}
