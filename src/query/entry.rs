//! One cache slot: value, error, staleness bookkeeping and the in-flight fetch.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use jiff::Timestamp;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::query::{QueryError, QueryKey, QueryOptions, QueryState};

pub(crate) type ErasedValue = Arc<dyn Any + Send + Sync>;
pub(crate) type ErasedResult = Result<ErasedValue, QueryError>;
pub(crate) type SharedFetch = Shared<BoxFuture<'static, ErasedResult>>;

static NEXT_FETCH_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) enum FetchOutcome {
    /// Fresh cached value, no I/O needed
    Fresh(ErasedValue),
    /// Joined or started fetch
    Pending(SharedFetch),
}

struct InFlight {
    id: u64,
    future: SharedFetch,
}

struct EntryState {
    data: Option<ErasedValue>,
    data_updated_at: Option<Instant>,
    updated_at: Option<Timestamp>,
    error: Option<QueryError>,
    in_flight: Option<InFlight>,
    /// Bumped by every invalidation
    invalidated_epoch: u64,
    /// `invalidated_epoch` as it was when the current value's fetch started
    fetched_epoch: u64,
    stale_time: Duration,
    gc_time: Duration,
    unobserved_since: Option<Instant>,
}

impl EntryState {
    fn is_stale(&self, now: Instant) -> bool {
        match self.data_updated_at {
            None => true,
            Some(_) if self.fetched_epoch < self.invalidated_epoch => true,
            Some(at) => now.saturating_duration_since(at) >= self.stale_time,
        }
    }
}

pub(crate) struct QueryEntry {
    key: QueryKey,
    state: Mutex<EntryState>,
    observers: AtomicUsize,
    version: watch::Sender<u64>,
}

impl QueryEntry {
    pub(crate) fn new(key: QueryKey, options: &QueryOptions) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            key,
            state: Mutex::new(EntryState {
                data: None,
                data_updated_at: None,
                updated_at: None,
                error: None,
                in_flight: None,
                invalidated_epoch: 0,
                fetched_epoch: 0,
                stale_time: options.stale_time,
                gc_time: options.gc_time,
                unobserved_since: Some(Instant::now()),
            }),
            observers: AtomicUsize::new(0),
            version,
        }
    }

    pub(crate) fn key(&self) -> &QueryKey {
        &self.key
    }

    // A panic while holding the lock only ever interrupts plain field writes.
    fn lock(&self) -> MutexGuard<'_, EntryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn notify(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Latest options win for the windows stored on the entry.
    pub(crate) fn apply_options(&self, options: &QueryOptions) {
        let mut state = self.lock();
        state.stale_time = options.stale_time;
        state.gc_time = options.gc_time;
    }

    pub(crate) fn is_stale(&self) -> bool {
        self.lock().is_stale(Instant::now())
    }

    pub(crate) fn is_fetching(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    pub(crate) fn data(&self) -> Option<ErasedValue> {
        self.lock().data.clone()
    }

    /// Return the fresh value, join the running fetch, or start a new one.
    ///
    /// `start` builds the fetch future and is called outside the entry lock.
    /// With `force`, a fresh value does not short-circuit (an in-flight fetch
    /// is still joined).
    pub(crate) fn fetch<S>(self: &Arc<Self>, force: bool, start: S) -> FetchOutcome
    where
        S: FnOnce() -> BoxFuture<'static, ErasedResult>,
    {
        {
            let state = self.lock();
            if !force && !state.is_stale(Instant::now()) {
                if let Some(data) = &state.data {
                    return FetchOutcome::Fresh(Arc::clone(data));
                }
            }
            if let Some(in_flight) = &state.in_flight {
                return FetchOutcome::Pending(in_flight.future.clone());
            }
        }

        let future = start();

        let mut state = self.lock();
        if let Some(in_flight) = &state.in_flight {
            // Lost the race to another caller; `future` has not been polled.
            return FetchOutcome::Pending(in_flight.future.clone());
        }

        let id = NEXT_FETCH_ID.fetch_add(1, Ordering::Relaxed);
        let epoch = state.invalidated_epoch;
        let entry = Arc::clone(self);

        tracing::debug!(key = %self.key, fetch_id = id, "query fetch started");

        let handle = tokio::spawn(async move {
            let result = match AssertUnwindSafe(future).catch_unwind().await {
                Ok(result) => result,
                Err(_) => Err(QueryError::cancelled("query fetcher panicked")),
            };
            entry.complete(id, epoch, &result);
            result
        });

        let shared = async move {
            handle
                .await
                .unwrap_or_else(|e| Err(QueryError::cancelled(format!("fetch task aborted: {e}"))))
        }
        .boxed()
        .shared();

        state.in_flight = Some(InFlight {
            id,
            future: shared.clone(),
        });
        drop(state);
        self.notify();

        FetchOutcome::Pending(shared)
    }

    /// A new value restarts the gc window of an unobserved entry.
    fn restart_gc_window(&self, state: &mut EntryState, now: Instant) {
        if self.observers.load(Ordering::SeqCst) == 0 {
            state.unobserved_since = Some(now);
        }
    }

    fn complete(&self, id: u64, epoch: u64, result: &ErasedResult) {
        {
            let mut state = self.lock();
            match result {
                Ok(value) => {
                    let now = Instant::now();
                    state.data = Some(Arc::clone(value));
                    state.data_updated_at = Some(now);
                    state.updated_at = Some(Timestamp::now());
                    state.fetched_epoch = epoch;
                    state.error = None;
                    self.restart_gc_window(&mut state, now);
                }
                Err(error) => {
                    tracing::debug!(key = %self.key, fetch_id = id, %error, "query fetch failed");
                    state.error = Some(error.clone());
                }
            }
            if state.in_flight.as_ref().is_some_and(|f| f.id == id) {
                state.in_flight = None;
            }
        }
        self.notify();
    }

    pub(crate) fn set_data(&self, value: ErasedValue) {
        {
            let mut state = self.lock();
            let now = Instant::now();
            state.data = Some(value);
            state.data_updated_at = Some(now);
            state.updated_at = Some(Timestamp::now());
            state.fetched_epoch = state.invalidated_epoch;
            state.error = None;
            self.restart_gc_window(&mut state, now);
        }
        self.notify();
    }

    pub(crate) fn invalidate(&self) {
        self.lock().invalidated_epoch += 1;
        self.notify();
    }

    pub(crate) fn add_observer(&self) {
        self.observers.fetch_add(1, Ordering::SeqCst);
        self.lock().unobserved_since = None;
    }

    pub(crate) fn remove_observer(&self) {
        let mut state = self.lock();
        if self.observers.fetch_sub(1, Ordering::SeqCst) == 1 {
            state.unobserved_since = Some(Instant::now());
        }
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.observers.load(Ordering::SeqCst)
    }

    /// Unobserved for at least `gc_time` with nothing in flight.
    pub(crate) fn is_collectable(&self, now: Instant) -> bool {
        let state = self.lock();
        if self.observers.load(Ordering::SeqCst) > 0 || state.in_flight.is_some() {
            return false;
        }
        state
            .unobserved_since
            .is_some_and(|since| now.saturating_duration_since(since) >= state.gc_time)
    }

    /// Typed view of the entry; `placeholder` is used while no value of type
    /// `T` is cached.
    pub(crate) fn snapshot<T, P>(&self, placeholder: P) -> QueryState<T>
    where
        T: Send + Sync + 'static,
        P: FnOnce() -> Arc<T>,
    {
        let state = self.lock();
        let is_fetching = state.in_flight.is_some();
        let is_stale = state.is_stale(Instant::now());

        let typed = state.data.clone().map(|data| data.downcast::<T>());
        let (data, is_placeholder, error) = match typed {
            Some(Ok(data)) => (data, false, None),
            Some(Err(_)) => (
                placeholder(),
                true,
                Some(QueryError::type_mismatch::<T>(&self.key)),
            ),
            None => (placeholder(), true, state.error.clone()),
        };

        QueryState {
            is_loading: is_placeholder && is_fetching,
            is_fetching,
            is_stale,
            is_placeholder,
            error,
            updated_at: if is_placeholder { None } else { state.updated_at },
            data,
        }
    }
}
