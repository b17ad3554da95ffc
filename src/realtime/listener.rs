use std::fmt;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::query::{KeyFilter, QueryClient, QueryKey};
use crate::realtime::{ChangeEvent, ChangeOperation};

type FilterFn = dyn Fn(&ChangeEvent) -> Vec<KeyFilter> + Send + Sync;
type PatchFn = dyn Fn(&QueryClient, &ChangeEvent) -> usize + Send + Sync;

#[derive(Clone)]
enum RuleAction {
    Invalidate(Vec<KeyFilter>),
    InvalidateWith(Arc<FilterFn>),
    Patch(Arc<PatchFn>),
}

/// Maps changes on one table to cache effects.
///
/// ```ignore
/// InvalidationRule::new("agents")
///     .on(ChangeOperation::Insert)
///     .invalidate(KeyFilter::resource("agents"));
/// ```
#[derive(Clone)]
pub struct InvalidationRule {
    table: String,
    operations: Vec<ChangeOperation>,
    action: RuleAction,
}

/// Partially built [`InvalidationRule`]; finish it with an action.
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    table: String,
    operations: Vec<ChangeOperation>,
}

impl InvalidationRule {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(table: impl Into<String>) -> RuleBuilder {
        RuleBuilder {
            table: table.into(),
            operations: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        event.table == self.table
            && (self.operations.is_empty() || self.operations.contains(&event.operation))
    }

    /// Apply the action; returns the number of entries touched.
    fn apply(&self, client: &QueryClient, event: &ChangeEvent) -> usize {
        match &self.action {
            RuleAction::Invalidate(filters) => filters.iter().map(|f| client.invalidate(f)).sum(),
            RuleAction::InvalidateWith(build) => {
                build(event).iter().map(|f| client.invalidate(f)).sum()
            }
            RuleAction::Patch(patch) => patch(client, event),
        }
    }
}

impl RuleBuilder {
    /// Restrict the rule to `operation`; call repeatedly for several. No call
    /// means every operation.
    pub fn on(mut self, operation: ChangeOperation) -> Self {
        if !self.operations.contains(&operation) {
            self.operations.push(operation);
        }
        self
    }

    fn finish(self, action: RuleAction) -> InvalidationRule {
        InvalidationRule {
            table: self.table,
            operations: self.operations,
            action,
        }
    }

    /// Mark entries matching `filter` stale.
    pub fn invalidate(self, filter: impl Into<KeyFilter>) -> InvalidationRule {
        self.finish(RuleAction::Invalidate(vec![filter.into()]))
    }

    pub fn invalidate_all(self, filters: impl IntoIterator<Item = KeyFilter>) -> InvalidationRule {
        self.finish(RuleAction::Invalidate(filters.into_iter().collect()))
    }

    /// Derive the filters from the event itself, e.g. the changed row's id.
    pub fn invalidate_with<F>(self, build: F) -> InvalidationRule
    where
        F: Fn(&ChangeEvent) -> Vec<KeyFilter> + Send + Sync + 'static,
    {
        self.finish(RuleAction::InvalidateWith(Arc::new(build)))
    }

    /// Write the delivered row straight into the cache instead of refetching.
    pub fn patch<T, F>(self, build: F) -> InvalidationRule
    where
        T: Send + Sync + 'static,
        F: Fn(&ChangeEvent) -> Option<(QueryKey, T)> + Send + Sync + 'static,
    {
        let patch = move |client: &QueryClient, event: &ChangeEvent| -> usize {
            match build(event) {
                Some((key, value)) => {
                    client.set_query_data(&key, value);
                    1
                }
                None => 0,
            }
        };
        self.finish(RuleAction::Patch(Arc::new(patch)))
    }
}

impl fmt::Debug for InvalidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match &self.action {
            RuleAction::Invalidate(filters) => format!("invalidate {filters:?}"),
            RuleAction::InvalidateWith(_) => "invalidate_with(..)".to_string(),
            RuleAction::Patch(_) => "patch(..)".to_string(),
        };
        f.debug_struct("InvalidationRule")
            .field("table", &self.table)
            .field("operations", &self.operations)
            .field("action", &action)
            .finish()
    }
}

/// Applies [`InvalidationRule`]s to a [`QueryClient`] as change events arrive.
#[derive(Debug, Clone)]
pub struct InvalidationListener {
    client: QueryClient,
    rules: Vec<InvalidationRule>,
}

impl InvalidationListener {
    pub fn new(client: QueryClient) -> Self {
        Self {
            client,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: InvalidationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[InvalidationRule] {
        &self.rules
    }

    /// Apply every matching rule; returns the number of entries touched.
    pub fn handle(&self, event: &ChangeEvent) -> usize {
        let touched: usize = self
            .rules
            .iter()
            .filter(|rule| rule.matches(event))
            .map(|rule| rule.apply(&self.client, event))
            .sum();

        tracing::debug!(
            table = %event.table,
            operation = %event.operation,
            touched,
            "change event handled"
        );
        touched
    }

    /// Consume `events` until the stream ends or `cancel` fires. Returns the
    /// number of events handled.
    ///
    /// A closed stream is not reopened; observers keep polling on their own
    /// interval in the meantime.
    pub async fn run<S>(&self, events: S, cancel: CancellationToken) -> u64
    where
        S: Stream<Item = ChangeEvent>,
    {
        futures::pin_mut!(events);
        let mut handled = 0u64;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(handled, "invalidation listener cancelled");
                    break;
                }
                next = events.next() => match next {
                    Some(event) => {
                        self.handle(&event);
                        handled += 1;
                    }
                    None => {
                        tracing::warn!(handled, "change stream ended; falling back to polling");
                        break;
                    }
                }
            }
        }

        handled
    }

    /// Run the listener on its own task.
    pub fn spawn<S>(self, events: S, cancel: CancellationToken) -> JoinHandle<u64>
    where
        S: Stream<Item = ChangeEvent> + Send + 'static,
    {
        tokio::spawn(async move { self.run(events, cancel).await })
    }
}
