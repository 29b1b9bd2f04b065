//! HTTP response cache.
//!
//! Wraps a route as axum middleware. Successful `GET` responses are buffered
//! and stored whole under a key derived from the request; later requests with
//! the same key are answered from memory until the entry expires. Failed
//! responses are never stored, so the next request retries from scratch.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{
        header::{self, HeaderValue},
        HeaderMap, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::policy::{boxed_policy, EvictionPolicy};
use super::store::TtlCache;
use crate::config::CacheConfig;
use crate::web::error::ApiError;

/// Header reporting whether a response came from the cache.
pub const X_CACHE: &str = "x-cache";

/// Largest response body the cache will buffer.
const MAX_CACHED_BODY: usize = 16 * 1024 * 1024;

/// Canonical request identity: method, path and sorted query pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a key from request parts.
    ///
    /// Query pairs are percent-decoded, sorted and re-encoded so that
    /// `?b=2&a=1` and `?a=1&b=%32` share an entry.
    pub fn new(method: &Method, path: &str, query: Option<&str>) -> Self {
        let mut pairs: Vec<(String, String)> = url::form_urlencoded::parse(
            query.unwrap_or_default().as_bytes(),
        )
        .into_owned()
        .collect();
        pairs.sort();

        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();

        if query.is_empty() {
            Self(format!("{} {}", method, path))
        } else {
            Self(format!("{} {}?{}", method, path, query))
        }
    }

    /// Build a key for an inbound request.
    pub fn from_request(req: &Request) -> Self {
        Self::new(req.method(), req.uri().path(), req.uri().query())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A fully rendered response.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CachedResponse {
    fn into_response_marked(self, marker: &'static str) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
            .headers_mut()
            .insert(X_CACHE, HeaderValue::from_static(marker));
        response
    }
}

/// Time source for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The system monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

type Store = TtlCache<CacheKey, CachedResponse, Box<dyn EvictionPolicy<CacheKey> + Send>>;

/// Shared, synchronized response cache.
///
/// All operations, including recency updates on hits, run under one mutex.
/// Entries are cloned out whole, so a reader never observes a partially
/// written response.
pub struct ResponseCache {
    store: Mutex<Store>,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    /// Create a cache from configuration using the system clock.
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a cache with a custom clock.
    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let store = TtlCache::with_policy(
            config.capacity,
            Duration::from_secs(config.ttl_secs),
            boxed_policy(config.policy),
        );
        Self {
            store: Mutex::new(store),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a fresh response.
    pub fn get(&self, key: &CacheKey) -> Option<CachedResponse> {
        self.get_with_age(key).map(|(response, _)| response)
    }

    /// Look up a fresh response along with the time since it was stored.
    pub fn get_with_age(&self, key: &CacheKey) -> Option<(CachedResponse, Duration)> {
        let now = self.clock.now();
        self.lock()
            .get_with_age(key, now)
            .map(|(response, age)| (response.clone(), age))
    }

    /// Store a response, stamped with the current time.
    pub fn put(&self, key: CacheKey, response: CachedResponse) {
        let now = self.clock.now();
        if let Some(evicted) = self.lock().put(key, response, now) {
            tracing::debug!(key = evicted.as_str(), "Evicted cached response");
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Middleware serving cached responses and filling the cache on success.
pub async fn cache_responses(
    State(cache): State<Arc<ResponseCache>>,
    req: Request,
    next: Next,
) -> Response {
    if req.method() != Method::GET {
        return next.run(req).await;
    }

    let key = CacheKey::from_request(&req);
    if let Some((hit, age)) = cache.get_with_age(&key) {
        tracing::debug!(key = key.as_str(), age_secs = age.as_secs(), "Cache hit");
        let mut response = hit.into_response_marked("HIT");
        response
            .headers_mut()
            .insert(header::AGE, HeaderValue::from(age.as_secs()));
        return response;
    }
    tracing::debug!(key = key.as_str(), "Cache miss");

    let response = next.run(req).await;
    if !response.status().is_success() {
        return response;
    }

    let (parts, body) = response.into_parts();
    let body = match axum::body::to_bytes(body, MAX_CACHED_BODY).await {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(key = key.as_str(), error = %e, "Failed to buffer response");
            return ApiError::internal("An internal error occurred").into_response();
        }
    };

    let cached = CachedResponse {
        status: parts.status,
        headers: parts.headers,
        body,
    };
    cache.put(key, cached.clone());
    cached.into_response_marked("MISS")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvictionPolicyKind;

    struct StepClock(Mutex<Instant>);

    impl StepClock {
        fn new() -> Self {
            Self(Mutex::new(Instant::now()))
        }

        fn advance(&self, by: Duration) {
            *self.0.lock().unwrap() += by;
        }
    }

    impl Clock for StepClock {
        fn now(&self) -> Instant {
            *self.0.lock().unwrap()
        }
    }

    fn config(capacity: usize) -> CacheConfig {
        CacheConfig {
            enabled: true,
            capacity,
            ttl_secs: 3600,
            policy: EvictionPolicyKind::Lru,
        }
    }

    fn response(body: &'static str) -> CachedResponse {
        CachedResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn test_cache_key_sorts_query() {
        let a = CacheKey::new(&Method::GET, "/feed", Some("b=2&a=1"));
        let b = CacheKey::new(&Method::GET, "/feed", Some("a=1&b=%32"));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "GET /feed?a=1&b=2");
    }

    #[test]
    fn test_cache_key_distinguishes_method_path_and_query() {
        let base = CacheKey::new(&Method::GET, "/feed", Some("url=x"));
        assert_ne!(base, CacheKey::new(&Method::HEAD, "/feed", Some("url=x")));
        assert_ne!(base, CacheKey::new(&Method::GET, "/other", Some("url=x")));
        assert_ne!(base, CacheKey::new(&Method::GET, "/feed", Some("url=y")));
    }

    #[test]
    fn test_cache_key_without_query() {
        let key = CacheKey::new(&Method::GET, "/feed", None);
        assert_eq!(key.as_str(), "GET /feed");
        assert_eq!(key, CacheKey::new(&Method::GET, "/feed", Some("")));
    }

    #[test]
    fn test_cache_key_keeps_encoded_url_value() {
        let key = CacheKey::new(
            &Method::GET,
            "/feed",
            Some("url=https%3A%2F%2Fexample.com%2Frss%3Fa%3D1%26b%3D2"),
        );
        let other = CacheKey::new(
            &Method::GET,
            "/feed",
            Some("url=https%3A%2F%2Fexample.com%2Frss%3Fa%3D1"),
        );
        assert_ne!(key, other);
    }

    #[test]
    fn test_response_cache_expiry() {
        let clock = Arc::new(StepClock::new());
        let cache = ResponseCache::with_clock(&config(4), clock.clone());
        let key = CacheKey::new(&Method::GET, "/feed", Some("url=x"));

        cache.put(key.clone(), response("body"));
        clock.advance(Duration::from_secs(3599));
        assert_eq!(cache.get(&key).unwrap().body, Bytes::from_static(b"body"));

        clock.advance(Duration::from_secs(1));
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_response_cache_reports_age() {
        let clock = Arc::new(StepClock::new());
        let cache = ResponseCache::with_clock(&config(4), clock.clone());
        let key = CacheKey::new(&Method::GET, "/feed", Some("url=x"));

        cache.put(key.clone(), response("body"));
        clock.advance(Duration::from_millis(90_500));

        let (hit, age) = cache.get_with_age(&key).unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"body"));
        assert_eq!(age.as_secs(), 90);
    }

    #[test]
    fn test_response_cache_capacity() {
        let cache = ResponseCache::new(&config(2));
        for i in 0..3 {
            let key = CacheKey::new(&Method::GET, "/feed", Some(&format!("url={}", i)));
            cache.put(key, response("body"));
        }
        assert_eq!(cache.len(), 2);
        assert!(cache
            .get(&CacheKey::new(&Method::GET, "/feed", Some("url=0")))
            .is_none());
    }

    #[test]
    fn test_cached_response_marker() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/plain"));
        let cached = CachedResponse {
            status: StatusCode::OK,
            headers,
            body: Bytes::from_static(b"x"),
        };

        let response = cached.into_response_marked("HIT");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(X_CACHE).unwrap(), "HIT");
        assert_eq!(response.headers().get("content-type").unwrap(), "text/plain");
    }
}
