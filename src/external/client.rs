use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::UpstreamsConfig;
use crate::error::{AppError, AppResult};

/// Build the HTTP client shared by every upstream.
///
/// One client per process: connection pooling and DNS caching are per
/// client, so handlers clone this rather than building their own.
pub fn build_http_client(config: &UpstreamsConfig) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        // Timeouts
        .timeout(config.timeout())
        .connect_timeout(Duration::from_secs(config.timeout_seconds.min(10)))
        // Connection pooling
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        // Compression
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .zstd(true)
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| AppError::Internal {
            source: anyhow::anyhow!("failed to build HTTP client: {e}"),
        })
}

/// Send a request, mapping transport failures and non-success statuses
/// to [`AppError::Upstream`].
pub(crate) async fn send(service: &str, request: RequestBuilder) -> AppResult<Response> {
    let response = request.send().await.map_err(|e| {
        tracing::warn!(service, error = %e, "upstream request failed");
        AppError::upstream(service, describe(&e))
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(service, status = status.as_u16(), "upstream returned error status");
        return Err(AppError::upstream_status(service, status.as_u16(), &body));
    }

    Ok(response)
}

/// Send a request and decode a JSON success body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    service: &str,
    request: RequestBuilder,
) -> AppResult<T> {
    let response = send(service, request).await?;
    response.json::<T>().await.map_err(|e| {
        tracing::warn!(service, error = %e, "upstream returned unexpected body");
        AppError::upstream(service, format!("invalid response body: {e}"))
    })
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Pong {
        ok: bool,
    }

    fn client() -> reqwest::Client {
        build_http_client(&UpstreamsConfig::default()).unwrap()
    }

    #[test]
    fn test_client_initialization() {
        let _ = client();
    }

    #[tokio::test]
    async fn test_send_json_success() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/ping");
                then.status(200).json_body(serde_json::json!({ "ok": true }));
            })
            .await;

        let pong: Pong = send_json("mock", client().get(server.url("/ping")))
            .await
            .unwrap();
        assert!(pong.ok);
    }

    #[tokio::test]
    async fn test_error_status_keeps_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/ping");
                then.status(429).body("rate limited");
            })
            .await;

        let err = send("mock", client().get(server.url("/ping"))).await.unwrap_err();
        match err {
            AppError::Upstream {
                service,
                status,
                body,
                ..
            } => {
                assert_eq!(service, "mock");
                assert_eq!(status, Some(429));
                assert_eq!(body.as_deref(), Some("rate limited"));
            }
            other => panic!("Expected Upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_body_is_upstream_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/ping");
                then.status(200).body("<html>");
            })
            .await;

        let err = send_json::<Pong>("mock", client().get(server.url("/ping")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream { status: None, .. }));
    }

    #[tokio::test]
    async fn test_connection_failure() {
        let err = send("mock", client().get("http://127.0.0.1:9/unreachable"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream { status: None, .. }));
    }
}
