//! Per-function CORS.
//!
//! Every response carries the CORS headers with `Access-Control-Allow-Methods`
//! narrowed to what the function accepts. `OPTIONS` on any function path is
//! answered here with an empty 200 and never reaches routing, auth or
//! validation.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::Response,
};

use crate::api::routes::{FUNCTIONS_PREFIX, function_methods};

pub const ALLOWED_HEADERS: &str =
    "authorization, x-client-info, apikey, content-type, x-vanity-secret, x-webhook-secret";

const DEFAULT_METHODS: &str = "GET, OPTIONS";

fn allowed_methods(path: &str) -> String {
    path.strip_prefix(FUNCTIONS_PREFIX)
        .and_then(|name| function_methods(name.trim_end_matches('/')))
        .map(|methods| format!("{methods}, OPTIONS"))
        .unwrap_or_else(|| DEFAULT_METHODS.to_string())
}

fn apply_headers(headers: &mut HeaderMap, methods: &str) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    if let Ok(value) = HeaderValue::from_str(methods) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, value);
    }
}

pub async fn cors_middleware(request: Request, next: Next) -> Response {
    let methods = allowed_methods(request.uri().path());

    if request.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::OK;
        apply_headers(response.headers_mut(), &methods);
        return response;
    }

    let mut response = next.run(request).await;
    apply_headers(response.headers_mut(), &methods);
    response
}
