//! Server-sent change events.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt, stream::BoxStream};

use crate::api::doc::REALTIME_TAG;
use crate::api::dto::{RealtimeQuery, UnauthorizedResponse};
use crate::api::middleware::ApiKey;
use crate::realtime::ChangeEvent;
use crate::state::AppState;
use crate::utils::validate::ValidatedQuery;

/// GET /realtime - Stream database changes as `change` events.
///
/// Each event's data is a JSON [`ChangeEvent`]. The stream ends when the
/// client disconnects or the server shuts down.
#[utoipa::path(
    get,
    path = "/realtime",
    tag = REALTIME_TAG,
    params(RealtimeQuery),
    security(("apikey" = [])),
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream", body = ChangeEvent),
        (status = 401, description = "Missing or wrong api key", body = UnauthorizedResponse)
    )
)]
pub async fn realtime(
    _key: ApiKey,
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<RealtimeQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events: BoxStream<'static, ChangeEvent> = match query.table.filter(|t| !t.is_empty()) {
        Some(table) => state.feed.subscribe_table(table).boxed(),
        None => state.feed.subscribe().boxed(),
    };
    tracing::debug!(subscribers = state.feed.subscriber_count(), "realtime client connected");

    let stream = events
        .take_until(state.shutdown.clone().cancelled_owned())
        .filter_map(|event| async move {
            match Event::default().event("change").json_data(&event) {
                Ok(sse) => Some(Ok(sse)),
                Err(e) => {
                    tracing::warn!(error = %e, table = %event.table, "change event not serializable");
                    None
                }
            }
        });

    let keep_alive = Duration::from_secs(state.settings.realtime.keep_alive_seconds);
    Sse::new(stream).keep_alive(KeepAlive::new().interval(keep_alive))
}
