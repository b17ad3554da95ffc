//! Middleware components for request processing.
//!
//! Request tracing, CORS, the request deadline, the error envelopes and the
//! credential extractors.

mod auth;
mod cors;
mod error_handler;
mod timeout;
mod trace;

pub use auth::{
    APIKEY_HEADER, ApiKey, VANITY_SECRET_HEADER, VanitySecret, WEBHOOK_SECRET_HEADER,
    WebhookSecret,
};
pub use cors::{ALLOWED_HEADERS, cors_middleware};
pub use error_handler::{
    error_to_status_code, method_not_allowed_middleware, not_found, panic_response,
};
pub use timeout::timeout_middleware;
pub use trace::{REQUEST_ID_HEADER, RequestId, trace_middleware};
