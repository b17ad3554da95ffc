use std::time::Duration;

pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(30);
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);

/// Per-query cache behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long a successful result counts as fresh
    pub stale_time: Duration,
    /// Poll at this interval while the query is observed
    pub refetch_interval: Option<Duration>,
    /// How long an unobserved entry survives before `gc` may evict it
    pub gc_time: Duration,
}

impl QueryOptions {
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn refetch_interval(mut self, every: Duration) -> Self {
        self.refetch_interval = Some(every);
        self
    }

    pub fn gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            refetch_interval: None,
            gc_time: DEFAULT_GC_TIME,
        }
    }
}
