//! Fire-and-forget telemetry.
//!
//! Callers enqueue view events and move on; a background worker delivers
//! them to a [`TelemetrySink`], retrying transient failures with exponential
//! backoff. Delivery is at least once up to `max_attempts`; events that
//! exhaust their attempts, or fail permanently, land in a bounded
//! dead-letter list. A full queue drops the new event.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::dto::TrackViewRequest;
use crate::sdk::client::LaunchpadClient;
use crate::sdk::error::{ClientError, ClientResult};

/// Destination for telemetry events.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn deliver(&self, event: &TrackViewRequest) -> ClientResult<()>;
}

/// Delivers through the `track-view` function.
#[async_trait]
impl TelemetrySink for LaunchpadClient {
    async fn deliver(&self, event: &TrackViewRequest) -> ClientResult<()> {
        self.track_view(event).await.map(|_| ())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutboxConfig {
    /// Queued events beyond this are dropped
    pub capacity: usize,
    pub max_attempts: u32,
    /// Delay before the first retry
    pub retry_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_retry_delay: Duration,
    /// Oldest dead letters are discarded past this
    pub dead_letter_capacity: usize,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            max_attempts: 5,
            retry_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            max_retry_delay: Duration::from_secs(30),
            dead_letter_capacity: 100,
        }
    }
}

impl OutboxConfig {
    /// Delay after the `attempt`-th failure (1-based).
    fn retry_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay = self.retry_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::try_from_secs_f64(delay)
            .unwrap_or(self.max_retry_delay)
            .min(self.max_retry_delay)
    }
}

/// An event the outbox gave up on.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadLetter {
    pub event: TrackViewRequest,
    pub attempts: u32,
    pub error: ClientError,
}

#[derive(Debug, Default)]
struct OutboxStats {
    delivered: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug)]
struct Shared {
    stats: OutboxStats,
    dead_letters: Mutex<VecDeque<DeadLetter>>,
}

impl Shared {
    fn dead_letters(&self) -> MutexGuard<'_, VecDeque<DeadLetter>> {
        self.dead_letters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Handle to the telemetry queue and its worker.
///
/// Dropping the handle lets the worker drain what is queued and exit;
/// [`shutdown`](Self::shutdown) does the same and waits for it.
#[derive(Debug)]
pub struct TelemetryOutbox {
    sender: mpsc::Sender<TrackViewRequest>,
    shared: Arc<Shared>,
    worker: JoinHandle<()>,
}

impl TelemetryOutbox {
    /// Start the worker on the current runtime.
    pub fn spawn(sink: Arc<dyn TelemetrySink>, config: OutboxConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.capacity.max(1));
        let shared = Arc::new(Shared {
            stats: OutboxStats::default(),
            dead_letters: Mutex::new(VecDeque::new()),
        });

        let worker = tokio::spawn(run_worker(sink, config, receiver, Arc::clone(&shared)));

        Self {
            sender,
            shared,
            worker,
        }
    }

    /// Queue an event without waiting. Returns `false` when it was dropped.
    pub fn record(&self, event: TrackViewRequest) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.shared.stats.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(agent_id = ?event.agent_id, "telemetry queue full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.shared.stats.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("telemetry worker stopped, dropping event");
                false
            }
        }
    }

    pub fn track_view(&self, agent_id: impl Into<String>, viewer_id: Option<String>, source: Option<String>) -> bool {
        self.record(TrackViewRequest {
            agent_id: Some(agent_id.into()),
            viewer_id,
            source,
        })
    }

    pub fn delivered(&self) -> u64 {
        self.shared.stats.delivered.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.shared.stats.dropped.load(Ordering::Relaxed)
    }

    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.shared.dead_letters().iter().cloned().collect()
    }

    /// Remove and return the dead letters, e.g. to persist or re-enqueue them.
    pub fn take_dead_letters(&self) -> Vec<DeadLetter> {
        self.shared.dead_letters().drain(..).collect()
    }

    /// Stop accepting events, deliver what is queued, and wait for the worker.
    pub async fn shutdown(self) {
        let Self { sender, worker, .. } = self;
        drop(sender);
        if let Err(e) = worker.await {
            tracing::error!(error = %e, "telemetry worker failed");
        }
    }
}

async fn run_worker(
    sink: Arc<dyn TelemetrySink>,
    config: OutboxConfig,
    mut receiver: mpsc::Receiver<TrackViewRequest>,
    shared: Arc<Shared>,
) {
    while let Some(event) = receiver.recv().await {
        match deliver_with_retry(sink.as_ref(), &config, &event).await {
            Ok(attempts) => {
                shared.stats.delivered.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(agent_id = ?event.agent_id, attempts, "telemetry delivered");
            }
            Err((attempts, error)) => {
                tracing::warn!(agent_id = ?event.agent_id, attempts, %error, "telemetry dead-lettered");
                let mut dead_letters = shared.dead_letters();
                if dead_letters.len() >= config.dead_letter_capacity {
                    dead_letters.pop_front();
                }
                if config.dead_letter_capacity > 0 {
                    dead_letters.push_back(DeadLetter {
                        event,
                        attempts,
                        error,
                    });
                }
            }
        }
    }
    tracing::debug!("telemetry worker stopped");
}

/// Returns the number of attempts used, or the last error with it.
async fn deliver_with_retry(
    sink: &dyn TelemetrySink,
    config: &OutboxConfig,
    event: &TrackViewRequest,
) -> Result<u32, (u32, ClientError)> {
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match sink.deliver(event).await {
            Ok(()) => return Ok(attempt),
            Err(error) if !error.is_retryable() || attempt >= max_attempts => {
                return Err((attempt, error));
            }
            Err(error) => {
                let delay = config.retry_delay(attempt);
                tracing::debug!(attempt, ?delay, %error, "telemetry delivery failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
