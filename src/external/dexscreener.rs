use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::client::send_json;
use crate::config::UpstreamsConfig;
use crate::error::AppResult;

const SERVICE: &str = "dexscreener";
const CHAIN: &str = "solana";

#[derive(Debug, Deserialize)]
struct TokensResponse {
    #[serde(default)]
    pairs: Option<Vec<RawPair>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPair {
    chain_id: String,
    dex_id: String,
    #[serde(default)]
    url: Option<String>,
    pair_address: String,
    base_token: RawToken,
    quote_token: RawToken,
    #[serde(default)]
    price_native: Option<String>,
    #[serde(default)]
    price_usd: Option<String>,
    #[serde(default)]
    volume: Option<Window>,
    #[serde(default)]
    price_change: Option<Window>,
    #[serde(default)]
    liquidity: Option<Liquidity>,
    #[serde(default)]
    fdv: Option<f64>,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    pair_created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawToken {
    address: String,
    name: String,
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct Window {
    #[serde(default)]
    h24: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Liquidity {
    #[serde(default)]
    usd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PairToken {
    pub address: String,
    pub name: String,
    pub symbol: String,
}

impl From<RawToken> for PairToken {
    fn from(token: RawToken) -> Self {
        Self {
            address: token.address,
            name: token.name,
            symbol: token.symbol,
        }
    }
}

/// One trading pair for a token, reshaped from the Dexscreener payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub pair_address: String,
    pub dex_id: String,
    pub url: Option<String>,
    pub base_token: PairToken,
    pub quote_token: PairToken,
    pub price_native: Option<String>,
    pub price_usd: Option<String>,
    pub volume_24h: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub fdv: Option<f64>,
    pub market_cap: Option<f64>,
    /// Milliseconds since the Unix epoch
    pub pair_created_at: Option<i64>,
}

impl From<RawPair> for TokenPair {
    fn from(raw: RawPair) -> Self {
        Self {
            pair_address: raw.pair_address,
            dex_id: raw.dex_id,
            url: raw.url,
            base_token: raw.base_token.into(),
            quote_token: raw.quote_token.into(),
            price_native: raw.price_native,
            price_usd: raw.price_usd,
            volume_24h: raw.volume.and_then(|v| v.h24),
            price_change_24h: raw.price_change.and_then(|v| v.h24),
            liquidity_usd: raw.liquidity.and_then(|l| l.usd),
            fdv: raw.fdv,
            market_cap: raw.market_cap,
            pair_created_at: raw.pair_created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DexscreenerClient {
    http: reqwest::Client,
    base_url: String,
}

impl DexscreenerClient {
    pub fn new(http: reqwest::Client, config: &UpstreamsConfig) -> Self {
        Self {
            http,
            base_url: config.dexscreener_url.trim_end_matches('/').to_string(),
        }
    }

    /// Solana pairs trading `address`, most liquid first.
    pub async fn token_pairs(&self, address: &str) -> AppResult<Vec<TokenPair>> {
        let url = format!("{}/latest/dex/tokens/{}", self.base_url, address);
        let body: TokensResponse = send_json(SERVICE, self.http.get(&url)).await?;

        let mut pairs: Vec<TokenPair> = body
            .pairs
            .unwrap_or_default()
            .into_iter()
            .filter(|p| p.chain_id == CHAIN)
            .map(TokenPair::from)
            .collect();
        pairs.sort_by(|a, b| {
            b.liquidity_usd
                .unwrap_or(0.0)
                .total_cmp(&a.liquidity_usd.unwrap_or(0.0))
        });

        tracing::debug!(address, pairs = pairs.len(), "fetched token pairs");
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    const MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    fn client(server: &MockServer) -> DexscreenerClient {
        let config = UpstreamsConfig {
            dexscreener_url: server.base_url(),
            ..Default::default()
        };
        let http = crate::external::build_http_client(&config).unwrap();
        DexscreenerClient::new(http, &config)
    }

    fn raw_pair(chain: &str, pair: &str, liquidity: f64) -> serde_json::Value {
        json!({
            "chainId": chain,
            "dexId": "meteora",
            "url": format!("https://dexscreener.com/{chain}/{pair}"),
            "pairAddress": pair,
            "baseToken": { "address": MINT, "name": "Tuna", "symbol": "TUNA" },
            "quoteToken": { "address": "So11111111111111111111111111111111111111112", "name": "Wrapped SOL", "symbol": "SOL" },
            "priceNative": "0.0001",
            "priceUsd": "0.0172",
            "volume": { "h24": 1200.5 },
            "priceChange": { "h24": -3.2 },
            "liquidity": { "usd": liquidity },
            "fdv": 17200.0,
            "marketCap": 17200.0,
            "pairCreatedAt": 1_700_000_000_000i64
        })
    }

    #[tokio::test]
    async fn test_token_pairs_filters_and_sorts() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/latest/dex/tokens/{MINT}"));
                then.status(200).json_body(json!({
                    "schemaVersion": "1.0.0",
                    "pairs": [
                        raw_pair("solana", "small", 10.0),
                        raw_pair("ethereum", "other", 1_000_000.0),
                        raw_pair("solana", "deep", 5000.0),
                    ]
                }));
            })
            .await;

        let pairs = client(&server).token_pairs(MINT).await.unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].pair_address, "deep");
        assert_eq!(pairs[0].volume_24h, Some(1200.5));
        assert_eq!(pairs[0].base_token.symbol, "TUNA");
        assert_eq!(pairs[1].pair_address, "small");
    }

    #[tokio::test]
    async fn test_null_pairs_is_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/latest/dex/tokens/{MINT}"));
                then.status(200)
                    .json_body(json!({ "schemaVersion": "1.0.0", "pairs": null }));
            })
            .await;

        let pairs = client(&server).token_pairs(MINT).await.unwrap();
        assert!(pairs.is_empty());
    }
}
