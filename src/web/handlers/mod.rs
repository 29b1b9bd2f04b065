//! HTTP handlers.

pub mod feed;

pub use feed::*;

use axum::http::HeaderValue;

use crate::config::Config;
use crate::pipeline::RequestPipeline;
use crate::{Result, TransfeedError};

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Feed pipeline, shared across requests.
    pub pipeline: RequestPipeline,
    /// `Cache-Control` value advertised on successful feed responses.
    pub cache_control: HeaderValue,
    /// Reject feed URLs pointing at private or loopback hosts.
    pub block_private_networks: bool,
}

impl AppState {
    /// Create handler state from configuration.
    pub fn new(pipeline: RequestPipeline, config: &Config) -> Result<Self> {
        let cache_control = HeaderValue::from_str(&format!(
            "public, max-age={}",
            config.cache.ttl_secs
        ))
        .map_err(|e| TransfeedError::Config(format!("invalid cache-control value: {e}")))?;

        Ok(Self {
            pipeline,
            cache_control,
            block_private_networks: config.fetch.block_private_networks,
        })
    }
}
