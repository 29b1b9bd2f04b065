//! HTTP middleware.

pub mod rate_limit;
pub mod security;

pub use rate_limit::{rate_limit, RateLimitState};
pub use security::security_headers;
