//! transfeed - feed translation proxy
//!
//! Fetches a remote RSS or Atom feed, keeps the most recent items, translates
//! their titles in one batch and serves the result as Atom behind an
//! in-memory response cache.

pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod pipeline;
pub mod translate;
pub mod web;

pub use config::Config;
pub use error::{Result, TransfeedError};
pub use pipeline::RequestPipeline;
