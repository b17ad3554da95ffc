use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::client::send_json;
use crate::config::UpstreamsConfig;
use crate::error::{AppError, AppResult};

const SERVICE: &str = "price";
const COIN_ID: &str = "solana";
const CURRENCY: &str = "usd";

/// SOL spot price as reported by the price API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SolPrice {
    #[schema(example = 172.35)]
    pub price: f64,
    #[schema(example = "usd")]
    pub currency: String,
    #[schema(example = "coingecko")]
    pub source: String,
}

/// `{"solana": {"usd": 172.35}}`
type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

/// CoinGecko-compatible `simple/price` client.
#[derive(Debug, Clone)]
pub struct PriceClient {
    http: reqwest::Client,
    url: String,
    key_header: String,
}

impl PriceClient {
    pub fn new(http: reqwest::Client, config: &UpstreamsConfig) -> Self {
        Self {
            http,
            url: config.price_url.clone(),
            key_header: config.price_key_header.clone(),
        }
    }

    pub async fn sol_usd(&self, api_key: &str) -> AppResult<SolPrice> {
        let request = self
            .http
            .get(&self.url)
            .query(&[("ids", COIN_ID), ("vs_currencies", CURRENCY)])
            .header(self.key_header.as_str(), api_key);

        let body: SimplePriceResponse = send_json(SERVICE, request).await?;
        let price = body
            .get(COIN_ID)
            .and_then(|quotes| quotes.get(CURRENCY))
            .copied()
            .ok_or_else(|| AppError::upstream(SERVICE, "response has no solana/usd quote"))?;

        Ok(SolPrice {
            price,
            currency: CURRENCY.to_string(),
            source: "coingecko".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> PriceClient {
        let config = UpstreamsConfig {
            price_url: server.url("/simple/price"),
            ..Default::default()
        };
        let http = crate::external::build_http_client(&config).unwrap();
        PriceClient::new(http, &config)
    }

    #[tokio::test]
    async fn test_sol_usd_sends_key_header() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/simple/price")
                    .query_param("ids", "solana")
                    .query_param("vs_currencies", "usd")
                    .header("x-cg-pro-api-key", "k-123");
                then.status(200).json_body(json!({ "solana": { "usd": 172.35 } }));
            })
            .await;

        let price = client(&server).sol_usd("k-123").await.unwrap();
        mock.assert_async().await;
        assert_eq!(price.price, 172.35);
        assert_eq!(price.currency, "usd");
        assert_eq!(price.source, "coingecko");
    }

    #[tokio::test]
    async fn test_missing_quote_is_upstream_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/simple/price");
                then.status(200).json_body(json!({}));
            })
            .await;

        let err = client(&server).sol_usd("k").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_rejected_key() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/simple/price");
                then.status(401).json_body(json!({ "error": "invalid api key" }));
            })
            .await;

        let err = client(&server).sol_usd("bad").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { status: Some(401), .. }));
    }
}
