//! Data Transfer Objects for API requests and responses.
//!
//! - `response` - success envelope
//! - `error` - failure envelopes
//! - `functions` - edge-function inputs and payloads
//! - `health` - liveness report

mod error;
mod functions;
mod health;
mod response;

pub use error::{ErrorResponse, UnauthorizedResponse};
pub use functions::{
    RealtimeQuery, SocialPostsQuery, SolanaRpcRequest, SolanaRpcResult, TokenMarketQuery,
    TrackViewRequest, TrackViewResult, VanityProgressQuery, WebhookResult,
};
pub use health::{HealthResponse, HealthStatus};
pub use response::ApiResponse;
