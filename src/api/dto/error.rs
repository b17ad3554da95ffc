//! Error response DTOs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Failure envelope shared by every edge function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "success": false,
    "error": "Missing required parameter: suffix"
}))]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    pub error: String,
    /// Structured context, e.g. the failing upstream and its status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorResponse {
    /// Creates a new error response with a message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
        }
    }

    /// Adds details to the error response.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Body of every 401; carries no `success` flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "error": "Unauthorized" }))]
pub struct UnauthorizedResponse {
    pub error: String,
}

impl Default for UnauthorizedResponse {
    fn default() -> Self {
        Self {
            error: "Unauthorized".to_string(),
        }
    }
}
