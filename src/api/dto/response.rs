//! Success envelope.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `{ "success": true, ...payload }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Recorded {
        recorded: bool,
    }

    #[test]
    fn test_payload_is_flattened() {
        let value = serde_json::to_value(ApiResponse::ok(Recorded { recorded: true })).unwrap();
        assert_eq!(value, json!({ "success": true, "recorded": true }));

        let back: ApiResponse<Recorded> = serde_json::from_value(value).unwrap();
        assert!(back.success);
        assert!(back.data.recorded);
    }
}
