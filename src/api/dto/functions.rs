//! Request and payload DTOs for the edge functions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TokenMarketQuery {
    /// Base58 token mint address
    #[validate(required(message = "Missing required parameter: address"))]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SocialPostsQuery {
    /// X handle without the leading `@`
    #[validate(required(message = "Missing required parameter: username"))]
    pub username: Option<String>,
    /// Number of posts, 10 to 100
    #[validate(range(min = 10, max = 100, message = "limit must be between 10 and 100"))]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VanityProgressQuery {
    /// Address suffix the keypairs were ground for
    #[validate(
        required(message = "Missing required parameter: suffix"),
        length(max = 10, message = "suffix must be at most 10 characters")
    )]
    pub suffix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RealtimeQuery {
    /// Only stream changes to this table
    pub table: Option<String>,
}

/// JSON-RPC call forwarded to the Solana node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({ "method": "getBalance", "params": ["So11111111111111111111111111111111111111112"] }))]
pub struct SolanaRpcRequest {
    #[validate(required(message = "Missing required parameter: method"))]
    pub method: Option<String>,
    /// Positional or named parameters; defaults to `[]`
    #[schema(value_type = Object)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SolanaRpcResult {
    #[schema(value_type = Object)]
    pub result: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct TrackViewRequest {
    /// UUID of the viewed agent
    #[validate(required(message = "Missing required parameter: agent_id"))]
    pub agent_id: Option<String>,
    /// UUID or Privy user id of the viewer
    pub viewer_id: Option<String>,
    #[validate(length(max = 64, message = "source must be at most 64 characters"))]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrackViewResult {
    pub recorded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WebhookResult {
    /// Number of live subscribers the change was delivered to
    pub delivered: usize,
}
