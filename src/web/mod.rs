//! HTTP surface for the feed proxy.
//!
//! Exposes `GET /feed?url=...` behind the response cache and a per-client
//! rate limit, plus `GET /health`.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
