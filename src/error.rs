//! Error types for transfeed.

use thiserror::Error;

/// Common error type for transfeed.
///
/// Every pipeline stage fails with exactly one of these variants. The message
/// carried by each variant is diagnostic detail for the log; the HTTP layer
/// never forwards it to clients except for `InvalidRequest`.
#[derive(Error, Debug)]
pub enum TransfeedError {
    /// The inbound request is missing required input.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Fetching or parsing the origin feed failed.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The translation backend failed or returned an unusable response.
    #[error("translation error: {0}")]
    Translation(String),

    /// Serializing the output feed failed.
    #[error("render error: {0}")]
    Render(String),

    /// Configuration or credential error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for transfeed operations.
pub type Result<T> = std::result::Result<T, TransfeedError>;
