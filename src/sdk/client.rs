//! Typed client for the launchpad edge functions and the public PostgREST
//! tables.

use std::future::Future;
use std::time::Duration;

use jiff::Timestamp;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::dto::{ApiResponse, SolanaRpcRequest, SolanaRpcResult, TrackViewRequest, TrackViewResult};
use crate::sdk::error::{ClientError, ClientResult};
use crate::services::{SocialPosts, SolPriceQuote, TokenMarket, VanityProgress};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const AGENTS_TABLE: &str = "agents";

const FUNCTIONS_PATH: &str = "functions/v1";
const REST_PATH: &str = "rest/v1";

/// One launchpad agent row.
///
/// Only the columns the SDK reads are typed; everything else lands in
/// `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub mint_address: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Error body of either envelope (`{success:false, error}` or the bare
/// `{error}` of a 401) or of PostgREST (`{message}`).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for one Supabase project.
///
/// Every call runs under the client timeout; expiry surfaces as
/// [`ClientError::Timeout`]. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct LaunchpadClient {
    http: reqwest::Client,
    base_url: Url,
    anon_key: String,
    vanity_secret: Option<String>,
    timeout: Duration,
}

#[derive(Debug)]
pub struct LaunchpadClientBuilder {
    base_url: String,
    anon_key: String,
    vanity_secret: Option<String>,
    timeout: Duration,
    http: Option<reqwest::Client>,
}

impl LaunchpadClientBuilder {
    pub fn vanity_secret(mut self, secret: impl Into<String>) -> Self {
        self.vanity_secret = Some(secret.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Share an existing HTTP client instead of building one.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> ClientResult<LaunchpadClient> {
        if self.anon_key.trim().is_empty() {
            return Err(ClientError::InvalidConfig("anon key must not be empty".into()));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::InvalidConfig("timeout must be greater than zero".into()));
        }

        // Trailing slash so relative joins keep any path prefix.
        let raw = format!("{}/", self.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&raw)
            .map_err(|e| ClientError::InvalidConfig(format!("invalid base url '{}': {e}", self.base_url)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig(format!(
                "base url must be http or https, got '{}'",
                base_url.scheme()
            )));
        }

        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .user_agent(concat!("launchpad-edge-sdk/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| ClientError::InvalidConfig(format!("failed to build HTTP client: {e}")))?,
        };

        Ok(LaunchpadClient {
            http,
            base_url,
            anon_key: self.anon_key,
            vanity_secret: self.vanity_secret,
            timeout: self.timeout,
        })
    }
}

impl LaunchpadClient {
    /// `base_url` is the project URL, e.g. `https://abc.supabase.co`.
    pub fn builder(base_url: impl Into<String>, anon_key: impl Into<String>) -> LaunchpadClientBuilder {
        LaunchpadClientBuilder {
            base_url: base_url.into(),
            anon_key: anon_key.into(),
            vanity_secret: None,
            timeout: DEFAULT_TIMEOUT,
            http: None,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn function_url(&self, name: &str) -> ClientResult<Url> {
        self.join(&format!("{FUNCTIONS_PATH}/{name}"))
    }

    fn table_url(&self, table: &str) -> ClientResult<Url> {
        self.join(&format!("{REST_PATH}/{table}"))
    }

    fn join(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidConfig(format!("invalid path '{path}': {e}")))
    }

    pub(crate) fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    pub(crate) fn get_function(&self, name: &str) -> ClientResult<RequestBuilder> {
        Ok(self.authorized(self.http.get(self.function_url(name)?)))
    }

    fn post_function(&self, name: &str) -> ClientResult<RequestBuilder> {
        Ok(self.authorized(self.http.post(self.function_url(name)?)))
    }

    /// Run `call` under the client timeout.
    pub(crate) async fn with_timeout<T, Fut>(&self, call: Fut) -> ClientResult<T>
    where
        Fut: Future<Output = ClientResult<T>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ClientError::Timeout { after: self.timeout })?
    }

    async fn call_function<T: DeserializeOwned>(&self, function: &str, request: RequestBuilder) -> ClientResult<T> {
        self.with_timeout(async {
            let response = request.send().await?;
            let envelope: ApiResponse<T> = decode(response).await?;
            if !envelope.success {
                return Err(ClientError::Api {
                    status: StatusCode::OK.as_u16(),
                    message: format!("{function} reported failure"),
                });
            }
            Ok(envelope.data)
        })
        .await
        .inspect_err(|error| tracing::debug!(function, %error, "function call failed"))
    }

    pub async fn sol_price(&self) -> ClientResult<SolPriceQuote> {
        let request = self.get_function("sol-price")?;
        self.call_function("sol-price", request).await
    }

    pub async fn token_market(&self, address: &str) -> ClientResult<TokenMarket> {
        let request = self.get_function("token-market")?.query(&[("address", address)]);
        self.call_function("token-market", request).await
    }

    /// Forward a JSON-RPC call to the Solana node; returns the `result`.
    pub async fn solana_rpc(&self, method: &str, params: Value) -> ClientResult<Value> {
        let body = SolanaRpcRequest {
            method: Some(method.to_string()),
            params: Some(params),
        };
        let request = self.post_function("solana-rpc")?.json(&body);
        let result: SolanaRpcResult = self.call_function("solana-rpc", request).await?;
        Ok(result.result)
    }

    pub async fn social_posts(&self, username: &str, limit: Option<u32>) -> ClientResult<SocialPosts> {
        let mut request = self.get_function("social-posts")?.query(&[("username", username)]);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        self.call_function("social-posts", request).await
    }

    /// Requires a vanity secret on the client.
    pub async fn vanity_progress(&self, suffix: &str) -> ClientResult<VanityProgress> {
        let secret = self
            .vanity_secret
            .as_deref()
            .ok_or_else(|| ClientError::InvalidConfig("vanity secret is not configured".into()))?;
        let request = self
            .get_function("vanity-progress")?
            .header("x-vanity-secret", secret)
            .query(&[("suffix", suffix)]);
        self.call_function("vanity-progress", request).await
    }

    pub async fn track_view(&self, view: &TrackViewRequest) -> ClientResult<bool> {
        let request = self.post_function("track-view")?.json(view);
        let result: TrackViewResult = self.call_function("track-view", request).await?;
        Ok(result.recorded)
    }

    /// Newest agents first.
    pub async fn agents(&self, limit: Option<u32>) -> ClientResult<Vec<Agent>> {
        let mut request = self
            .authorized(self.http.get(self.table_url(AGENTS_TABLE)?))
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        self.with_timeout(async { decode(request.send().await?).await }).await
    }

    pub async fn agent(&self, id: &str) -> ClientResult<Option<Agent>> {
        let request = self
            .authorized(self.http.get(self.table_url(AGENTS_TABLE)?))
            .query(&[("select", "*".to_string()), ("id", format!("eq.{id}")), ("limit", "1".to_string())]);
        let rows: Vec<Agent> = self.with_timeout(async { decode(request.send().await?).await }).await?;
        Ok(rows.into_iter().next())
    }
}

/// Pass a success response through; turn an error status into
/// [`ClientError::Api`].
pub(crate) async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let bytes = response.bytes().await?;
    Err(ClientError::Api {
        status: status.as_u16(),
        message: error_message(status, &bytes),
    })
}

pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let bytes = check_status(response).await?.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(ErrorBody { error, message }) = serde_json::from_slice::<ErrorBody>(body) {
        if let Some(text) = error.or(message) {
            return text;
        }
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        text
    }
}
