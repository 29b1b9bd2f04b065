//! Router configuration.

use axum::{
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use super::error::ApiError;
use super::handlers::{get_feed, health, AppState};
use super::middleware::{rate_limit, security_headers, RateLimitState};
use crate::cache::{cache_responses, ResponseCache};

/// Create the application router.
///
/// The response cache wraps only `/feed`; the rate limit sits outside it so
/// cache hits still count against a client's quota.
pub fn create_router(
    app_state: Arc<AppState>,
    cache: Option<Arc<ResponseCache>>,
    limiter: Option<Arc<RateLimitState>>,
) -> Router {
    let mut feed_routes = Router::new().route("/feed", get(get_feed));

    if let Some(cache) = cache {
        feed_routes =
            feed_routes.route_layer(middleware::from_fn_with_state(cache, cache_responses));
    }
    if let Some(limiter) = limiter {
        feed_routes = feed_routes.route_layer(middleware::from_fn_with_state(limiter, rate_limit));
    }

    Router::new()
        .merge(feed_routes)
        .merge(create_health_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(security_headers))
                .layer(CatchPanicLayer::custom(panic_response)),
        )
        .with_state(app_state)
}

/// A panicking handler answers like any other internal failure.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Handler panicked");
    ApiError::internal("An internal error occurred").into_response()
}

/// Create a health check router.
pub fn create_health_router<S: Clone + Send + Sync + 'static>() -> Router<S> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::feed::{Feed, FeedSource};
    use crate::pipeline::RequestPipeline;
    use crate::translate::{LanguageTag, TitleTranslator, Translator};
    use crate::Result;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum_test::TestServer;

    struct PanickingSource;

    #[async_trait]
    impl FeedSource for PanickingSource {
        async fn fetch(&self, url: &str) -> Result<Feed> {
            panic!("origin parser blew up on {url}");
        }
    }

    struct EchoTranslator;

    #[async_trait]
    impl Translator for EchoTranslator {
        async fn translate_batch(
            &self,
            texts: &[String],
            _target: &LanguageTag,
        ) -> Result<Vec<String>> {
            Ok(texts.to_vec())
        }
    }

    fn server() -> TestServer {
        let config = Config::default();
        let titles = TitleTranslator::new(Arc::new(EchoTranslator), LanguageTag::parse("ja").unwrap());
        let pipeline = RequestPipeline::new(Arc::new(PanickingSource), titles);
        let state = Arc::new(AppState::new(pipeline, &config).unwrap());
        TestServer::new(create_router(state, None, None)).unwrap()
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_opaque_500() {
        let server = server();

        let response = server
            .get("/feed")
            .add_query_param("url", "https://example.com/rss")
            .await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "An internal error occurred");
        assert!(!response.text().contains("blew up"));
    }

    #[tokio::test]
    async fn test_server_keeps_serving_after_panic() {
        let server = server();

        server
            .get("/feed")
            .add_query_param("url", "https://example.com/rss")
            .await;
        let response = server.get("/health").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text(), "OK");
    }
}
