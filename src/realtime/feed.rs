use futures::Stream;
use futures::stream;
use tokio::sync::broadcast;

use crate::realtime::ChangeEvent;

/// In-process fan-out of change events.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Deliver `event` to every current subscriber; returns how many there were.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!(table = %event.table, "change event dropped, no subscribers");
                0
            }
        }
    }

    /// Stream of events published after this call.
    ///
    /// A subscriber that falls more than `capacity` events behind skips the
    /// lost events with a warning. The stream ends when every feed handle is
    /// dropped.
    pub fn subscribe(&self) -> impl Stream<Item = ChangeEvent> + Send + 'static {
        stream::unfold(self.sender.subscribe(), |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => return Some((event, receiver)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "change subscriber lagged, events skipped");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
    }

    /// Like [`subscribe`](Self::subscribe), restricted to one table.
    pub fn subscribe_table(
        &self,
        table: impl Into<String>,
    ) -> impl Stream<Item = ChangeEvent> + Send + 'static {
        use futures::StreamExt;
        let table = table.into();
        self.subscribe()
            .filter(move |event| std::future::ready(event.table == table))
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}
