//! Security headers middleware.

use axum::{
    body::Body,
    http::{header, header::HeaderValue, HeaderName, Request},
    middleware::Next,
    response::Response,
};

/// Headers set on every response, overwriting any handler value.
const FIXED_HEADERS: [(HeaderName, &str); 3] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::REFERRER_POLICY, "no-referrer"),
];

/// Adds security headers to all responses.
///
/// Responses that set no `Cache-Control` get `no-store`, so error bodies are
/// never kept by downstream caches. A handler's own value is left alone.
pub async fn security_headers(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    for (name, value) in FIXED_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }

    if !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    response
}
