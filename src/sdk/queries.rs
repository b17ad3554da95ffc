//! Cached launchpad queries.
//!
//! [`LaunchpadQueries`] pairs a [`LaunchpadClient`] with a [`QueryClient`]:
//! every resource gets a stable key from [`keys`], a fetcher, and default
//! staleness and polling. [`default_rules`] wires database changes to the
//! matching keys.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::query::{KeyFilter, QueryClient, QueryObserver, QueryOptions, QueryState};
use crate::realtime::{InvalidationListener, InvalidationRule};
use crate::sdk::client::{AGENTS_TABLE, Agent, LaunchpadClient};
use crate::sdk::error::ClientResult;
use crate::sdk::realtime::RealtimeClient;
use crate::services::{SocialPosts, SolPriceQuote, TokenMarket, VanityProgress};

pub const SOL_PRICE_INTERVAL: Duration = Duration::from_secs(30);
pub const VANITY_PROGRESS_INTERVAL: Duration = Duration::from_secs(10);
pub const AGENTS_STALE_TIME: Duration = Duration::from_secs(60);
pub const SOCIAL_POSTS_STALE_TIME: Duration = Duration::from_secs(5 * 60);

pub const VANITY_TABLE: &str = "vanity_keypairs";

/// Query keys, one constructor per resource.
pub mod keys {
    use crate::query::QueryKey;

    pub const SOL_PRICE: &str = "sol-price";
    pub const TOKEN_MARKET: &str = "token-market";
    pub const SOCIAL_POSTS: &str = "social-posts";
    pub const VANITY_PROGRESS: &str = "vanity-progress";
    pub const AGENTS: &str = "agents";
    pub const AGENT: &str = "agent";

    pub fn sol_price() -> QueryKey {
        QueryKey::new(SOL_PRICE)
    }

    pub fn token_market(address: &str) -> QueryKey {
        QueryKey::new(TOKEN_MARKET).with("address", address)
    }

    /// `@Tuna`, `tuna` and ` TUNA ` name the same cache entry.
    pub fn social_posts(username: &str, limit: Option<u32>) -> QueryKey {
        let username = username.trim().trim_start_matches('@').to_ascii_lowercase();
        let key = QueryKey::new(SOCIAL_POSTS).with("username", username);
        match limit {
            Some(limit) => key.with("limit", limit),
            None => key,
        }
    }

    pub fn vanity_progress(suffix: &str) -> QueryKey {
        QueryKey::new(VANITY_PROGRESS).with("suffix", suffix)
    }

    pub fn agents(limit: Option<u32>) -> QueryKey {
        match limit {
            Some(limit) => QueryKey::new(AGENTS).with("limit", limit),
            None => QueryKey::new(AGENTS),
        }
    }

    pub fn agent(id: &str) -> QueryKey {
        QueryKey::new(AGENT).with("id", id)
    }
}

/// Rules that keep launchpad queries in step with table changes.
///
/// * `agents`: every agent list, plus the changed agent's own entry;
/// * `vanity_keypairs`: the progress entry for the row's suffix, or all of
///   them when the row carries none.
pub fn default_rules() -> Vec<InvalidationRule> {
    vec![
        InvalidationRule::new(AGENTS_TABLE).invalidate_with(|event| {
            let mut filters = vec![KeyFilter::resource(keys::AGENTS)];
            if let Some(id) = event.field_str("id") {
                filters.push(KeyFilter::exact(keys::agent(&id)));
            }
            filters
        }),
        InvalidationRule::new(VANITY_TABLE).invalidate_with(|event| match event.field_str("suffix") {
            Some(suffix) => vec![KeyFilter::params(keys::VANITY_PROGRESS, [("suffix", suffix)])],
            None => vec![KeyFilter::resource(keys::VANITY_PROGRESS)],
        }),
    ]
}

#[derive(Debug, Clone)]
pub struct LaunchpadQueries {
    client: LaunchpadClient,
    cache: QueryClient,
}

impl LaunchpadQueries {
    pub fn new(client: LaunchpadClient, cache: QueryClient) -> Self {
        Self { client, cache }
    }

    pub fn client(&self) -> &LaunchpadClient {
        &self.client
    }

    pub fn cache(&self) -> &QueryClient {
        &self.cache
    }

    fn sol_price_options(&self) -> QueryOptions {
        self.cache
            .defaults()
            .stale_time(SOL_PRICE_INTERVAL)
            .refetch_interval(SOL_PRICE_INTERVAL)
    }

    fn vanity_options(&self) -> QueryOptions {
        self.cache
            .defaults()
            .stale_time(VANITY_PROGRESS_INTERVAL)
            .refetch_interval(VANITY_PROGRESS_INTERVAL)
    }

    pub async fn sol_price(&self) -> QueryState<SolPriceQuote> {
        let client = self.client.clone();
        self.cache
            .query(&keys::sol_price(), self.sol_price_options(), move || async move {
                client.sol_price().await
            })
            .await
    }

    /// Observe the SOL price, polled every [`SOL_PRICE_INTERVAL`].
    pub fn watch_sol_price(&self) -> QueryObserver<SolPriceQuote> {
        let client = self.client.clone();
        self.cache.observe(
            keys::sol_price(),
            self.sol_price_options(),
            move || {
                let client = client.clone();
                async move { client.sol_price().await }
            },
            SolPriceQuote::default(),
        )
    }

    pub async fn token_market(&self, address: &str) -> QueryState<TokenMarket> {
        let client = self.client.clone();
        let address = address.to_string();
        self.cache
            .query(&keys::token_market(&address), self.cache.defaults(), move || async move {
                client.token_market(&address).await
            })
            .await
    }

    pub async fn social_posts(&self, username: &str, limit: Option<u32>) -> QueryState<SocialPosts> {
        let client = self.client.clone();
        let username = username.to_string();
        let options = self.cache.defaults().stale_time(SOCIAL_POSTS_STALE_TIME);
        self.cache
            .query(&keys::social_posts(&username, limit), options, move || async move {
                client.social_posts(&username, limit).await
            })
            .await
    }

    pub async fn vanity_progress(&self, suffix: &str) -> QueryState<VanityProgress> {
        let client = self.client.clone();
        let suffix = suffix.to_string();
        self.cache
            .query(&keys::vanity_progress(&suffix), self.vanity_options(), move || async move {
                client.vanity_progress(&suffix).await
            })
            .await
    }

    /// Observe vanity keypair stock, polled every
    /// [`VANITY_PROGRESS_INTERVAL`].
    pub fn watch_vanity_progress(&self, suffix: &str) -> QueryObserver<VanityProgress> {
        let client = self.client.clone();
        let suffix = suffix.to_string();
        let placeholder = VanityProgress {
            suffix: suffix.clone(),
            ..VanityProgress::default()
        };
        self.cache.observe(
            keys::vanity_progress(&suffix),
            self.vanity_options(),
            move || {
                let client = client.clone();
                let suffix = suffix.clone();
                async move { client.vanity_progress(&suffix).await }
            },
            placeholder,
        )
    }

    pub async fn agents(&self, limit: Option<u32>) -> QueryState<Vec<Agent>> {
        let client = self.client.clone();
        let options = self.cache.defaults().stale_time(AGENTS_STALE_TIME);
        self.cache
            .query(&keys::agents(limit), options, move || async move {
                client.agents(limit).await
            })
            .await
    }

    /// Observe the agent list. Without realtime invalidation it refreshes
    /// only when read after going stale.
    pub fn watch_agents(&self, limit: Option<u32>) -> QueryObserver<Vec<Agent>> {
        let client = self.client.clone();
        let options = self.cache.defaults().stale_time(AGENTS_STALE_TIME);
        self.cache.observe(
            keys::agents(limit),
            options,
            move || {
                let client = client.clone();
                async move { client.agents(limit).await }
            },
            Vec::new(),
        )
    }

    /// `data` is `None` while loading and when no agent has `id`.
    pub async fn agent(&self, id: &str) -> QueryState<Option<Agent>> {
        let client = self.client.clone();
        let id = id.to_string();
        let options = self.cache.defaults().stale_time(AGENTS_STALE_TIME);
        self.cache
            .query(&keys::agent(&id), options, move || async move { client.agent(&id).await })
            .await
    }

    /// Record a view directly. Fire-and-forget callers should prefer
    /// [`TelemetryOutbox`](crate::sdk::TelemetryOutbox).
    pub async fn track_view(&self, agent_id: &str, viewer_id: Option<&str>) -> ClientResult<bool> {
        self.client
            .track_view(&crate::api::dto::TrackViewRequest {
                agent_id: Some(agent_id.to_string()),
                viewer_id: viewer_id.map(str::to_string),
                source: Some("sdk".to_string()),
            })
            .await
    }

    /// Listener over this cache with [`default_rules`].
    pub fn invalidation_listener(&self) -> InvalidationListener {
        default_rules()
            .into_iter()
            .fold(InvalidationListener::new(self.cache.clone()), |listener, rule| {
                listener.with_rule(rule)
            })
    }

    /// Subscribe to the realtime function and apply [`default_rules`] until
    /// `cancel` fires or the stream ends.
    pub async fn listen(&self, cancel: CancellationToken) -> ClientResult<JoinHandle<u64>> {
        let events = RealtimeClient::new(self.client.clone()).changes(None).await?;
        Ok(self.invalidation_listener().spawn(events, cancel))
    }
}
