//! HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::{Result, TransfeedError};

use super::handlers::AppState;
use super::middleware::RateLimitState;
use super::router::create_router;

/// Web server for the feed proxy.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Handler state.
    app_state: Arc<AppState>,
    /// Response cache, absent when caching is disabled.
    cache: Option<Arc<ResponseCache>>,
    /// Per-IP limiter, absent when rate limiting is disabled.
    limiter: Option<Arc<RateLimitState>>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, app_state: AppState) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| TransfeedError::Config(format!("invalid server address: {e}")))?;

        let cache = config
            .cache
            .enabled
            .then(|| Arc::new(ResponseCache::new(&config.cache)));

        let limiter = RateLimitState::new(config.server.rate_limit_per_minute).map(Arc::new);

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            cache,
            limiter,
        })
    }

    /// Replace the response cache.
    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Get the configured address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Build the router without binding a socket.
    pub fn router(&self) -> Router {
        create_router(
            self.app_state.clone(),
            self.cache.clone(),
            self.limiter.clone(),
        )
    }

    async fn bind(&self) -> std::result::Result<(TcpListener, SocketAddr), std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        if let Some(limiter) = &self.limiter {
            limiter.clone().start_cleanup_task();
        }

        tracing::info!(
            cache = self.cache.is_some(),
            rate_limit = self.limiter.as_ref().map(|l| l.requests_per_minute()),
            "Web server listening on http://{}",
            local_addr
        );
        Ok((listener, local_addr))
    }

    /// Run the web server until Ctrl-C.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let router = self.router();
        let (listener, _) = self.bind().await?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::result::Result<SocketAddr, std::io::Error> {
        let router = self.router();
        let (listener, local_addr) = self.bind().await?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
