use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client::send_json;
use crate::error::{AppError, AppResult};

const SERVICE: &str = "solana-rpc";

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// JSON-RPC 2.0 client for a Solana RPC node.
///
/// The node URL embeds the provider key, so it is passed per call rather
/// than stored.
#[derive(Debug, Clone)]
pub struct SolanaRpcClient {
    http: reqwest::Client,
}

impl SolanaRpcClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub async fn call(&self, rpc_url: &str, method: &str, params: &Value) -> AppResult<Value> {
        let request = self.http.post(rpc_url).json(&RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        });

        let response: RpcResponse = send_json(SERVICE, request).await?;
        if let Some(error) = response.error {
            tracing::warn!(method, code = error.code, "rpc call returned an error");
            return Err(AppError::upstream(
                SERVICE,
                format!("{} (code {})", error.message, error.code),
            ));
        }

        Ok(response.result.unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamsConfig;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client() -> SolanaRpcClient {
        SolanaRpcClient::new(crate::external::build_http_client(&UpstreamsConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn test_call_wraps_jsonrpc_envelope() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/").json_body(json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "method": "getBalance",
                    "params": ["So11111111111111111111111111111111111111112"]
                }));
                then.status(200).json_body(json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": { "context": { "slot": 1 }, "value": 42 }
                }));
            })
            .await;

        let result = client()
            .call(
                &server.url("/"),
                "getBalance",
                &json!(["So11111111111111111111111111111111111111112"]),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result["value"], 42);
    }

    #[tokio::test]
    async fn test_rpc_error_is_upstream_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200).json_body(json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "error": { "code": -32601, "message": "Method not found" }
                }));
            })
            .await;

        let err = client()
            .call(&server.url("/"), "nope", &json!([]))
            .await
            .unwrap_err();
        match err {
            AppError::Upstream { message, .. } => assert!(message.contains("Method not found")),
            other => panic!("Expected Upstream error, got {other:?}"),
        }
    }
}
