//! Request correlation and access logging.
//!
//! Every request runs inside an `http_request` span carrying the method,
//! path, edge-function name and `x-request-id`, so service and upstream
//! logs line up with the access log.

use std::time::Instant;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::api::routes::FUNCTIONS_PREFIX;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation id of the current request, available as an extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Reuse the caller's id when it is short printable ASCII, otherwise mint one.
    fn from_request(request: &Request) -> Self {
        let incoming = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| {
                !id.is_empty()
                    && id.len() <= MAX_REQUEST_ID_LEN
                    && id.bytes().all(|b| b.is_ascii_graphic())
            });

        match incoming {
            Some(id) => Self(id.to_string()),
            None => Self(Uuid::new_v4().to_string()),
        }
    }
}

/// Edge function addressed by `path`, e.g. `sol-price`.
fn function_name(path: &str) -> &str {
    path.strip_prefix(FUNCTIONS_PREFIX)
        .and_then(|rest| rest.split('/').next())
        .filter(|name| !name.is_empty())
        .unwrap_or("-")
}

pub async fn trace_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_request(&request);
    request.extensions_mut().insert(request_id.clone());

    let span = info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        function = function_name(request.uri().path()),
        request_id = %request_id.0,
    );

    async move {
        info!("Request received");

        let start = Instant::now();
        let mut response = next.run(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;
        let status = response.status();

        if status.is_server_error() {
            warn!(status = status.as_u16(), duration_ms, "Response sent");
        } else {
            info!(status = status.as_u16(), duration_ms, "Response sent");
        }

        if let Ok(value) = HeaderValue::from_str(&request_id.0) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
        response
    }
    .instrument(span)
    .await
}
