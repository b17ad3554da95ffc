//! Client side of the `realtime` function: a server-sent event stream of
//! [`ChangeEvent`]s.

use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use reqwest::header::ACCEPT;

use crate::realtime::ChangeEvent;
use crate::sdk::client::{LaunchpadClient, check_status};
use crate::sdk::error::{ClientError, ClientResult};

const REALTIME_FUNCTION: &str = "realtime";
const CHANGE_EVENT: &str = "change";

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental `text/event-stream` decoder.
///
/// Chunks may split lines or UTF-8 sequences anywhere; only complete lines
/// are interpreted.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed a chunk; returns the frames it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);

            if line.is_empty() {
                if let Some(frame) = self.dispatch() {
                    frames.push(frame);
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line.as_ref(), ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }

        frames
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame { event, data })
    }
}

fn change_event(frame: SseFrame) -> Option<ClientResult<ChangeEvent>> {
    match frame.event.as_deref() {
        None | Some("message") | Some(CHANGE_EVENT) => {}
        Some(other) => {
            tracing::debug!(event = other, "ignoring non-change event");
            return None;
        }
    }
    Some(serde_json::from_str(&frame.data).map_err(|e| ClientError::Decode(e.to_string())))
}

/// Decode a byte stream into change events.
pub fn decode_events<S, B>(chunks: S) -> impl Stream<Item = ClientResult<ChangeEvent>> + Send + 'static
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]>,
{
    let mut decoder = SseDecoder::default();
    chunks
        .map(move |chunk| -> Vec<ClientResult<ChangeEvent>> {
            match chunk {
                Ok(bytes) => decoder
                    .push(bytes.as_ref())
                    .into_iter()
                    .filter_map(change_event)
                    .collect(),
                Err(e) => vec![Err(ClientError::from(e))],
            }
        })
        .flat_map(stream::iter)
}

/// Subscribes to row changes pushed by the `realtime` function.
#[derive(Debug, Clone)]
pub struct RealtimeClient {
    client: LaunchpadClient,
}

impl RealtimeClient {
    pub fn new(client: LaunchpadClient) -> Self {
        Self { client }
    }

    /// Open the stream, optionally limited to one table.
    ///
    /// Only the handshake runs under the client timeout; the stream itself
    /// stays open until the server closes it or the caller drops it.
    pub async fn subscribe(
        &self,
        table: Option<&str>,
    ) -> ClientResult<BoxStream<'static, ClientResult<ChangeEvent>>> {
        let mut request = self
            .client
            .get_function(REALTIME_FUNCTION)?
            .header(ACCEPT, "text/event-stream");
        if let Some(table) = table {
            request = request.query(&[("table", table)]);
        }

        let response = self
            .client
            .with_timeout(async { check_status(request.send().await?).await })
            .await?;
        tracing::debug!(table, "realtime stream opened");

        Ok(decode_events(response.bytes_stream()).boxed())
    }

    /// Like [`subscribe`](Self::subscribe), dropping frames that fail to
    /// decode. Suitable input for
    /// [`InvalidationListener::run`](crate::realtime::InvalidationListener::run).
    pub async fn changes(
        &self,
        table: Option<&str>,
    ) -> ClientResult<BoxStream<'static, ChangeEvent>> {
        let events = self.subscribe(table).await?;
        Ok(events
            .filter_map(|item| async move {
                match item {
                    Ok(event) => Some(event),
                    Err(error) => {
                        tracing::warn!(%error, "dropping undecodable change event");
                        None
                    }
                }
            })
            .boxed())
    }
}
