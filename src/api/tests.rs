//! Router-level tests: every request goes through the full middleware
//! stack with upstreams served by `httpmock`.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
    routing::get,
};
use http_body_util::BodyExt;
use httpmock::prelude::*;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;

use crate::api::middleware::{ALLOWED_HEADERS, panic_response};
use crate::api::routes::{FUNCTIONS, FUNCTIONS_PREFIX, create_router};
use crate::config::secrets::names;
use crate::config::{Secrets, Settings, StaticSecrets};
use crate::external::MemoryStore;
use crate::realtime::{ChangeEvent, ChangeOperation};
use crate::state::AppState;

const ANON_KEY: &str = "anon-key";
const VANITY: &str = "vanity-secret";
const WEBHOOK: &str = "webhook-secret";
const MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

struct Harness {
    upstream: MockServer,
    store: Arc<MemoryStore>,
    state: AppState,
}

fn settings(upstream: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.upstreams.price_url = upstream.url("/simple/price");
    settings.upstreams.dexscreener_url = upstream.base_url();
    settings.upstreams.twitter_api_url = upstream.url("/2");
    settings.upstreams.timeout_seconds = 5;
    settings
}

fn all_secrets(upstream: &MockServer) -> StaticSecrets {
    StaticSecrets::new()
        .with(names::PRICE_API_KEY, "price-key")
        .with(names::HELIUS_RPC_URL, upstream.url("/rpc"))
        .with(names::TWITTER_BEARER_TOKEN, "twitter-token")
        .with(names::VANITY_SECRET, VANITY)
        .with(names::SUPABASE_URL, upstream.base_url())
        .with(names::SUPABASE_ANON_KEY, ANON_KEY)
        .with(names::SUPABASE_SERVICE_ROLE_KEY, "service-key")
        .with(names::DB_WEBHOOK_SECRET, WEBHOOK)
}

impl Harness {
    async fn start() -> Self {
        let upstream = MockServer::start_async().await;
        let secrets = all_secrets(&upstream);
        Self::with_secrets(upstream, secrets)
    }

    fn with_secrets(upstream: MockServer, secrets: StaticSecrets) -> Self {
        let store = Arc::new(MemoryStore::new().with_keypairs("tuna", 12, 5));
        let state =
            AppState::with_store(settings(&upstream), Secrets::new(secrets), store.clone()).unwrap();
        Self {
            upstream,
            store,
            state,
        }
    }

    fn app(&self) -> Router {
        create_router(self.state.clone())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.app().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_header(mut request: Request<Body>, name: &'static str, value: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(name, value.parse().unwrap());
    request
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn function(name: &str) -> String {
    format!("{FUNCTIONS_PREFIX}{name}")
}

fn keys(value: &Value) -> Vec<String> {
    let mut keys: Vec<String> = value
        .as_object()
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default();
    keys.sort();
    keys
}

async fn mock_sol_price(upstream: &MockServer) -> httpmock::Mock<'_> {
    upstream
        .mock_async(|when, then| {
            when.method(GET)
                .path("/simple/price")
                .header("x-cg-pro-api-key", "price-key");
            then.status(200).json_body(json!({ "solana": { "usd": 172.35 } }));
        })
        .await
}

async fn boom() -> &'static str {
    panic!("boom")
}

// ============================================================================
// CORS
// ============================================================================

#[tokio::test]
async fn options_on_every_function_is_empty_200_with_cors() {
    let harness = Harness::start().await;

    for (name, method) in FUNCTIONS {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(function(name))
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = harness.send(request).await;

        assert_eq!(status, StatusCode::OK, "{name}");
        assert_eq!(body, Value::Null, "{name}");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], ALLOWED_HEADERS);
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            format!("{method}, OPTIONS").as_str()
        );
    }
}

#[tokio::test]
async fn error_responses_carry_cors_headers() {
    let harness = Harness::start().await;
    let (status, headers, _) = harness.send(get_req(&function("vanity-progress"))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

// ============================================================================
// Input validation
// ============================================================================

#[tokio::test]
async fn missing_required_parameter_is_400_on_every_function() {
    let harness = Harness::start().await;

    let cases = vec![
        ("address", get_req(&function("token-market"))),
        (
            "method",
            with_header(post_json(&function("solana-rpc"), json!({})), "apikey", ANON_KEY),
        ),
        (
            "username",
            with_header(get_req(&function("social-posts")), "apikey", ANON_KEY),
        ),
        (
            "suffix",
            with_header(get_req(&function("vanity-progress")), "x-vanity-secret", VANITY),
        ),
        (
            "agent_id",
            with_header(post_json(&function("track-view"), json!({})), "apikey", ANON_KEY),
        ),
    ];

    for (param, request) in cases {
        let (status, _, body) = harness.send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{param}");
        assert_eq!(body["success"], false, "{param}");
        assert_eq!(
            body["error"],
            format!("Missing required parameter: {param}").as_str()
        );
    }

    // The webhook payload is a JSON document without a `table`.
    let request = with_header(
        post_json(&function("db-webhook"), json!({ "type": "INSERT" })),
        "x-webhook-secret",
        WEBHOOK,
    );
    let (status, _, body) = harness.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn blank_parameter_counts_as_missing() {
    let harness = Harness::start().await;
    let request = with_header(
        get_req(&function("vanity-progress?suffix=%20")),
        "x-vanity-secret",
        VANITY,
    );
    let (status, _, body) = harness.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required parameter: suffix");
}

#[tokio::test]
async fn invalid_parameters_are_400() {
    let harness = Harness::start().await;

    let (status, _, body) = harness
        .send(get_req(&function("token-market?address=0xdeadbeef")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid Solana address"));

    let request = with_header(
        get_req(&function("social-posts?username=tuna&limit=5")),
        "apikey",
        ANON_KEY,
    );
    let (status, _, body) = harness.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "limit must be between 10 and 100");

    let request = with_header(
        post_json(&function("track-view"), json!({ "agent_id": "not-a-uuid" })),
        "apikey",
        ANON_KEY,
    );
    let (status, _, _) = harness.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Credentials
// ============================================================================

#[tokio::test]
async fn vanity_progress_rejects_wrong_secret() {
    let harness = Harness::start().await;

    for secret in [None, Some("nope"), Some("")] {
        let mut request = get_req(&function("vanity-progress?suffix=tuna"));
        if let Some(secret) = secret {
            request = with_header(request, "x-vanity-secret", secret);
        }
        let (status, _, body) = harness.send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }
}

#[tokio::test]
async fn vanity_progress_reports_counts() {
    let harness = Harness::start().await;
    let request = with_header(
        get_req(&function("vanity-progress?suffix=tuna")),
        "x-vanity-secret",
        VANITY,
    );
    let (status, _, body) = harness.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["suffix"], "tuna");
    assert_eq!(body["available"].as_u64(), Some(7));
    assert_eq!(body["total"].as_u64(), Some(12));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn missing_server_secret_is_500_not_401() {
    let upstream = MockServer::start_async().await;
    let harness = Harness::with_secrets(upstream, StaticSecrets::new());

    let request = with_header(
        get_req(&function("vanity-progress?suffix=tuna")),
        "x-vanity-secret",
        "anything",
    );
    let (status, _, body) = harness.send(request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("VANITY_SECRET"));

    let (status, _, body) = harness.send(get_req(&function("sol-price"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("PRICE_API_KEY"));
}

#[tokio::test]
async fn apikey_accepts_bearer_authorization() {
    let harness = Harness::start().await;
    let rpc = harness.upstream.mock_async(|when, then| {
        when.method(POST).path("/rpc").body_includes("getSlot");
        then.status(200)
            .json_body(json!({ "jsonrpc": "2.0", "id": 1, "result": 321 }));
    }).await;

    let request = with_header(
        post_json(&function("solana-rpc"), json!({ "method": "getSlot" })),
        "authorization",
        &format!("Bearer {ANON_KEY}"),
    );
    let (status, _, body) = harness.send(request).await;

    rpc.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "result": 321 }));
}

#[tokio::test]
async fn solana_rpc_without_key_is_401() {
    let harness = Harness::start().await;
    let request = post_json(&function("solana-rpc"), json!({ "method": "getSlot" }));
    let (status, _, body) = harness.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized" }));
}

// ============================================================================
// Routing
// ============================================================================

#[tokio::test]
async fn wrong_method_is_405_envelope() {
    let harness = Harness::start().await;

    let (status, headers, body) = harness.send(post_json(&function("sol-price"), json!({}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("POST"));
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let (status, _, body) = harness.send(get_req(&function("track-view"))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn unknown_path_is_404_envelope() {
    let harness = Harness::start().await;
    let (status, _, body) = harness.send(get_req(&function("nope"))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn panicking_handler_is_500_envelope() {
    let app: Router = Router::new()
        .route("/boom", get(boom))
        .layer(CatchPanicLayer::custom(panic_response));

    let response = app.oneshot(get_req("/boom")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let harness = Harness::start().await;
    let request = with_header(get_req("/health"), "x-request-id", "req-1");
    let (status, headers, body) = harness.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-request-id"], "req-1");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let harness = Harness::start().await;
    let (status, _, body) = harness.send(get_req("/openapi.json")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/functions/v1/vanity-progress"].is_object());
}

// ============================================================================
// Upstream proxies
// ============================================================================

#[tokio::test]
async fn sol_price_is_cached_and_idempotent() {
    let harness = Harness::start().await;
    let price = mock_sol_price(&harness.upstream).await;

    let (status, _, first) = harness.send(get_req(&function("sol-price"))).await;
    let (_, _, second) = harness.send(get_req(&function("sol-price"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);
    assert_eq!(first["price"], 172.35);
    assert_eq!(first["currency"], "usd");
    assert_eq!(first, second);
    assert_eq!(
        keys(&first),
        vec!["currency", "price", "source", "success", "timestamp"]
    );
    price.assert_hits_async(1).await;
}

#[tokio::test]
async fn token_market_repeated_calls_have_same_shape() {
    let mut harness = Harness::start().await;
    let mut settings = settings(&harness.upstream);
    settings.cache.enabled = false;
    harness.state = AppState::with_store(
        settings,
        Secrets::new(all_secrets(&harness.upstream)),
        harness.store.clone(),
    )
    .unwrap();

    let pairs = harness.upstream.mock_async(|when, then| {
        when.method(GET).path(format!("/latest/dex/tokens/{MINT}"));
        then.status(200).json_body(json!({ "pairs": [] }));
    }).await;

    let uri = function(&format!("token-market?address={MINT}"));
    let (_, _, first) = harness.send(get_req(&uri)).await;
    let (_, _, second) = harness.send(get_req(&uri)).await;

    assert_eq!(first, json!({ "success": true, "address": MINT, "pairs": [] }));
    assert_eq!(first, second);
    pairs.assert_hits_async(2).await;
}

#[tokio::test]
async fn upstream_failure_is_500_with_details_and_no_retry() {
    let harness = Harness::start().await;
    let pairs = harness.upstream.mock_async(|when, then| {
        when.method(GET).path(format!("/latest/dex/tokens/{MINT}"));
        then.status(502).body("bad gateway");
    }).await;

    let uri = function(&format!("token-market?address={MINT}"));
    let (status, _, body) = harness.send(get_req(&uri)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["details"]["service"], "dexscreener");
    assert_eq!(body["details"]["status"], 502);
    pairs.assert_hits_async(1).await;

    // Failures are not cached.
    harness.send(get_req(&uri)).await;
    pairs.assert_hits_async(2).await;
}

#[tokio::test]
async fn social_posts_proxies_recent_search() {
    let harness = Harness::start().await;
    let search = harness.upstream.mock_async(|when, then| {
        when.method(GET)
            .path("/2/tweets/search/recent")
            .header("authorization", "Bearer twitter-token")
            .query_param("max_results", "10");
        then.status(200).json_body(json!({
            "data": [{ "id": "1", "text": "gm", "public_metrics": { "like_count": 2 } }]
        }));
    }).await;

    let request = with_header(
        get_req(&function("social-posts?username=@tuna_agent")),
        "apikey",
        ANON_KEY,
    );
    let (status, _, body) = harness.send(request).await;

    search.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "tuna_agent");
    assert_eq!(body["posts"][0]["likes"], 2);
}

#[tokio::test]
async fn track_view_records_row() {
    let harness = Harness::start().await;
    let agent = uuid::Uuid::new_v4();
    let request = with_header(
        post_json(
            &function("track-view"),
            json!({ "agent_id": agent, "viewer_id": "did:privy:abc", "source": "web" }),
        ),
        "apikey",
        ANON_KEY,
    );
    let (status, _, body) = harness.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "recorded": true }));
    let views = harness.store.views();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].agent_id, agent);
}

// ============================================================================
// Realtime
// ============================================================================

#[tokio::test]
async fn db_webhook_publishes_to_feed() {
    use futures::StreamExt;

    let harness = Harness::start().await;
    let mut events = Box::pin(harness.state.feed.subscribe());

    let request = with_header(
        post_json(
            &function("db-webhook"),
            json!({
                "type": "UPDATE",
                "table": "agents",
                "schema": "public",
                "record": { "id": "a1", "name": "Tuna" },
                "old_record": { "id": "a1", "name": "Tun" }
            }),
        ),
        "x-webhook-secret",
        WEBHOOK,
    );
    let (status, _, body) = harness.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "delivered": 1 }));

    let event = events.next().await.unwrap();
    assert_eq!(event.table, "agents");
    assert_eq!(event.operation, ChangeOperation::Update);
    assert_eq!(event.field_str("name").as_deref(), Some("Tuna"));
}

#[tokio::test]
async fn db_webhook_requires_secret() {
    let harness = Harness::start().await;
    let request = post_json(
        &function("db-webhook"),
        json!({ "type": "INSERT", "table": "agents" }),
    );
    let (status, _, body) = harness.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized" }));
}

#[tokio::test]
async fn realtime_streams_change_events() {
    let harness = Harness::start().await;
    let request = with_header(get_req(&function("realtime?table=agents")), "apikey", ANON_KEY);
    let response = harness.app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );

    harness
        .state
        .feed
        .publish(ChangeEvent::new("other", ChangeOperation::Insert));
    harness.state.feed.publish(
        ChangeEvent::new("agents", ChangeOperation::Insert).with_record(json!({ "id": "a2" })),
    );

    let mut body = response.into_body();
    let frame = body.frame().await.unwrap().unwrap();
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert!(text.contains("event: change"));
    assert!(text.contains("\"table\":\"agents\""));
    assert!(!text.contains("\"table\":\"other\""));
}

#[tokio::test]
async fn realtime_stream_ends_on_shutdown() {
    let harness = Harness::start().await;
    let request = with_header(get_req(&function("realtime")), "apikey", ANON_KEY);
    let response = harness.app().oneshot(request).await.unwrap();

    harness.state.shutdown.cancel();
    let collected = response.into_body().collect().await;
    assert!(collected.is_ok());
}
