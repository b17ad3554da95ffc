//! Price and market data, cached server-side per function TTL.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::cache::CacheManager;
use crate::config::secrets::names;
use crate::config::{FunctionsConfig, Secrets};
use crate::error::AppResult;
use crate::external::{DexscreenerClient, PriceClient, TokenPair};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SolPriceQuote {
    #[schema(example = 172.35)]
    pub price: f64,
    #[schema(example = "usd")]
    pub currency: String,
    #[schema(example = "coingecko")]
    pub source: String,
    /// When the quote was fetched from the price API
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TokenMarket {
    pub address: String,
    pub pairs: Vec<TokenPair>,
}

#[derive(Clone)]
pub struct MarketService {
    prices: PriceClient,
    dexscreener: DexscreenerClient,
    cache: CacheManager,
    secrets: Secrets,
    sol_price_ttl: u64,
    token_market_ttl: u64,
}

impl MarketService {
    pub fn new(
        prices: PriceClient,
        dexscreener: DexscreenerClient,
        cache: CacheManager,
        secrets: Secrets,
        config: &FunctionsConfig,
    ) -> Self {
        Self {
            prices,
            dexscreener,
            cache,
            secrets,
            sol_price_ttl: config.sol_price_ttl_seconds,
            token_market_ttl: config.token_market_ttl_seconds,
        }
    }

    pub async fn sol_price(&self) -> AppResult<SolPriceQuote> {
        let api_key = self.secrets.require(names::PRICE_API_KEY)?;

        self.cache
            .get_or_fetch_json("sol-price", Some(self.sol_price_ttl), || async {
                let price = self.prices.sol_usd(&api_key).await?;
                Ok(SolPriceQuote {
                    price: price.price,
                    currency: price.currency,
                    source: price.source,
                    timestamp: Timestamp::now(),
                })
            })
            .await
    }

    pub async fn token_market(&self, address: &str) -> AppResult<TokenMarket> {
        let key = format!("token-market:{address}");

        self.cache
            .get_or_fetch_json(&key, Some(self.token_market_ttl), || async {
                let pairs = self.dexscreener.token_pairs(address).await?;
                Ok(TokenMarket {
                    address: address.to_string(),
                    pairs,
                })
            })
            .await
    }
}
