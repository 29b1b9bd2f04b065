//! In-memory response caching.
//!
//! [`TtlCache`] is a bounded map whose entries expire after a fixed TTL, with
//! eviction delegated to an [`EvictionPolicy`]. [`ResponseCache`] wraps it for
//! concurrent use as HTTP middleware.

pub mod policy;
pub mod response;
pub mod store;

pub use policy::{boxed_policy, EvictionPolicy, LfuPolicy, LruPolicy};
pub use response::{
    cache_responses, CacheKey, CachedResponse, Clock, ResponseCache, SystemClock, X_CACHE,
};
pub use store::TtlCache;
