//! Test helpers for integration tests.
//!
//! Provides local stand-ins for the origin feed server and the translation
//! backend, in-process feed sources and translators, and a proxy builder.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use transfeed::cache::{Clock, ResponseCache};
use transfeed::feed::{Feed, FeedSource, HttpFeedSource, Item};
use transfeed::translate::{Credentials, GoogleTranslator, LanguageTag, TitleTranslator, Translator};
use transfeed::web::{AppState, WebServer};
use transfeed::{Config, RequestPipeline, Result, TransfeedError};

/// Serve `router` on an ephemeral local port.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// RSS 2.0 document with `count` items, item `i` published at hour `i`.
pub fn sample_rss(count: u32) -> String {
    let items: String = (0..count)
        .map(|i| {
            format!(
                "<item><title>Story {i}</title><link>https://news.example.com/{i}</link>\
                 <description>Body {i}</description>\
                 <pubDate>Mon, 01 Jan 2024 {i:02}:00:00 +0000</pubDate></item>"
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <rss version=\"2.0\"><channel><title>Example News</title>\
         <link>https://news.example.com</link><description>Daily news</description>\
         {items}</channel></rss>"
    )
}

// ============================================================================
// Origin feed server
// ============================================================================

/// Local origin serving feeds, counting every request.
pub struct Origin {
    pub addr: SocketAddr,
    pub hits: Arc<AtomicUsize>,
}

impl Origin {
    /// Routes: `/feed.xml` (12 items), `/empty.xml`, `/error` (500),
    /// `/garbage` (not a feed).
    pub async fn start() -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route("/feed.xml", get(|| async { rss_response(sample_rss(12)) }))
            .route("/empty.xml", get(|| async { rss_response(sample_rss(0)) }))
            .route(
                "/error",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "origin down") }),
            )
            .route("/garbage", get(|| async { "this is not a feed" }))
            .layer(axum::middleware::from_fn_with_state(
                hits.clone(),
                count_requests,
            ));

        Self {
            addr: spawn(router).await,
            hits,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

fn rss_response(body: String) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/rss+xml")], body)
}

async fn count_requests(
    State(hits): State<Arc<AtomicUsize>>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    hits.fetch_add(1, Ordering::SeqCst);
    next.run(req).await
}

// ============================================================================
// Translation backend
// ============================================================================

#[derive(Clone, Default)]
struct BackendState {
    calls: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

/// Local Cloud Translation v2 stand-in; translates `x` to `T:x`.
pub struct TranslateBackend {
    pub addr: SocketAddr,
    state: BackendState,
}

impl TranslateBackend {
    pub async fn start() -> Self {
        let state = BackendState::default();
        let router = Router::new()
            .route("/translate", post(translate))
            .with_state(state.clone());

        Self {
            addr: spawn(router).await,
            state,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}/translate", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Make subsequent calls fail with 403.
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }
}

async fn translate(State(state): State<BackendState>, Json(body): Json<Value>) -> impl IntoResponse {
    state.calls.fetch_add(1, Ordering::SeqCst);
    if state.failing.load(Ordering::SeqCst) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": { "message": "API key not valid: secret-key" } })),
        );
    }

    let translations: Vec<Value> = body["q"]
        .as_array()
        .map(|q| {
            q.iter()
                .map(|text| json!({ "translatedText": format!("T:{}", text.as_str().unwrap_or_default()) }))
                .collect()
        })
        .unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({ "data": { "translations": translations } })),
    )
}

// ============================================================================
// In-process capabilities
// ============================================================================

/// Feed source returning a fixed feed, optionally failing after some calls.
pub struct StubSource {
    pub calls: AtomicUsize,
    fail_after: Option<usize>,
}

impl StubSource {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_after: None,
        }
    }

    /// Succeed `n` times, then fail every call.
    pub fn failing_after(n: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_after: Some(n),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for StubSource {
    async fn fetch(&self, url: &str) -> Result<Feed> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|n| call >= n) {
            return Err(TransfeedError::Fetch("origin unavailable".into()));
        }

        let items = (0..3)
            .map(|i| {
                Item::new(format!("Story {i}"))
                    .with_link(format!("{url}/{i}"))
                    .with_published(Utc.with_ymd_and_hms(2024, 1, 1, i, 0, 0).unwrap())
            })
            .collect();
        Ok(Feed {
            title: "Stub".into(),
            link: url.to_string(),
            items,
            ..Default::default()
        })
    }
}

/// Translator returning each input prefixed with `T:`.
pub struct PrefixTranslator;

#[async_trait]
impl Translator for PrefixTranslator {
    async fn translate_batch(&self, texts: &[String], _target: &LanguageTag) -> Result<Vec<String>> {
        Ok(texts.iter().map(|t| format!("T:{t}")).collect())
    }
}

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}

// ============================================================================
// Proxy builders
// ============================================================================

/// Proxy configuration for local fixtures: private hosts allowed, no rate limit.
pub fn proxy_config(translate_endpoint: &str) -> Config {
    let mut config = Config::default();
    config.server.port = 0;
    config.server.rate_limit_per_minute = 0;
    config.fetch.block_private_networks = false;
    config.translate.endpoint = translate_endpoint.to_string();
    config.translate.api_key = Some("secret-key".to_string());
    config
}

/// Proxy wired to real HTTP capabilities.
pub fn http_proxy(config: &Config) -> TestServer {
    let source = HttpFeedSource::new(&config.fetch).unwrap();
    let credentials = Credentials::resolve(&config.translate).unwrap();
    let translator = GoogleTranslator::new(&config.translate, credentials).unwrap();
    let titles = TitleTranslator::new(Arc::new(translator), config.target_language().unwrap());
    let pipeline = RequestPipeline::new(Arc::new(source), titles);

    let server = WebServer::new(config, AppState::new(pipeline, config).unwrap()).unwrap();
    TestServer::new(server.router()).unwrap()
}

/// Proxy wired to an in-process source and a manually driven cache clock.
pub fn stub_proxy(config: &Config, source: Arc<StubSource>, clock: Arc<ManualClock>) -> TestServer {
    let titles = TitleTranslator::new(Arc::new(PrefixTranslator), config.target_language().unwrap());
    let pipeline = RequestPipeline::new(source, titles);
    let cache = Arc::new(ResponseCache::with_clock(&config.cache, clock));

    let server = WebServer::new(config, AppState::new(pipeline, config).unwrap())
        .unwrap()
        .with_cache(cache);
    TestServer::new(server.router()).unwrap()
}
