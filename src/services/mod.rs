//! Service layer behind the edge functions.
//!
//! Services resolve the secrets a function needs, call the upstream
//! clients and reshape their payloads.

mod launchpad_service;
mod market_service;
mod rpc_service;
mod social_service;

pub use launchpad_service::{LaunchpadService, VanityProgress};
pub use market_service::{MarketService, SolPriceQuote, TokenMarket};
pub use rpc_service::RpcService;
pub use social_service::{SocialPosts, SocialService};

use std::sync::Arc;

use crate::cache::CacheManager;
use crate::config::{Secrets, Settings};
use crate::error::AppResult;
use crate::external::{
    DexscreenerClient, LaunchpadStore, PriceClient, SolanaRpcClient, TwitterClient,
    build_http_client,
};

/// Aggregates all services for convenient access.
///
/// Cloning is cheap; clients and stores are shared.
#[derive(Clone)]
pub struct Services {
    pub market: MarketService,
    pub rpc: RpcService,
    pub social: SocialService,
    pub launchpad: LaunchpadService,
}

impl Services {
    pub fn new(
        settings: &Settings,
        secrets: Secrets,
        cache: CacheManager,
        store: Arc<dyn LaunchpadStore>,
    ) -> AppResult<Self> {
        let http = build_http_client(&settings.upstreams)?;

        Ok(Self {
            market: MarketService::new(
                PriceClient::new(http.clone(), &settings.upstreams),
                DexscreenerClient::new(http.clone(), &settings.upstreams),
                cache,
                secrets.clone(),
                &settings.functions,
            ),
            rpc: RpcService::new(SolanaRpcClient::new(http.clone()), secrets.clone()),
            social: SocialService::new(
                TwitterClient::new(http, &settings.upstreams),
                secrets,
                settings.functions.social_posts_default_limit,
            ),
            launchpad: LaunchpadService::new(store),
        })
    }
}
