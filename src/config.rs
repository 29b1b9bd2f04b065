//! Configuration module for transfeed.

use serde::Deserialize;
use std::path::Path;

use crate::translate::LanguageTag;
use crate::{Result, TransfeedError};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Requests per minute allowed per client IP (0 disables rate limiting).
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_rate_limit() -> u32 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            rate_limit_per_minute: default_rate_limit(),
        }
    }
}

/// Origin feed fetch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Total request timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Maximum feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// Reject feed URLs pointing at loopback, private or internal hosts.
    #[serde(default = "default_block_private_networks")]
    pub block_private_networks: bool,
    /// User agent sent to origin servers.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_block_private_networks() -> bool {
    true
}

fn default_user_agent() -> String {
    concat!("transfeed/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_redirects: default_max_redirects(),
            max_feed_size_bytes: default_max_feed_size(),
            block_private_networks: default_block_private_networks(),
            user_agent: default_user_agent(),
        }
    }
}

/// Translation backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslateConfig {
    /// Target language tag (e.g. "ja", "pt-BR").
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// Translation v2 endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds for a batch call.
    #[serde(default = "default_translate_timeout")]
    pub timeout_secs: u64,
    /// Environment variable holding the service account JSON.
    #[serde(default = "default_credentials_env")]
    pub credentials_env: String,
    /// API key. Takes precedence over service account credentials.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_target_language() -> String {
    "ja".to_string()
}

fn default_endpoint() -> String {
    "https://translation.googleapis.com/language/translate/v2".to_string()
}

fn default_translate_timeout() -> u64 {
    30
}

fn default_credentials_env() -> String {
    "GOOGLE_CLIENT_CREDENTIALS".to_string()
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            target_language: default_target_language(),
            endpoint: default_endpoint(),
            timeout_secs: default_translate_timeout(),
            credentials_env: default_credentials_env(),
            api_key: None,
        }
    }
}

/// Eviction policy used by the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicyKind {
    /// Least recently used.
    #[default]
    Lru,
    /// Least frequently used.
    Lfu,
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Whether responses are cached at all.
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Maximum number of cached responses.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    /// Time-to-live in seconds, also advertised via Cache-Control.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    /// Eviction policy.
    #[serde(default)]
    pub policy: EvictionPolicyKind,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_capacity() -> usize {
    1024
}

fn default_cache_ttl() -> u64 {
    3600 // 1 hour
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl(),
            policy: EvictionPolicyKind::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Empty means console only.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/transfeed.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Origin fetch configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Translation configuration.
    #[serde(default)]
    pub translate: TranslateConfig,
    /// Response cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(TransfeedError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| TransfeedError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `TRANSFEED_TRANSLATE_API_KEY`: translation API key
    /// - `TRANSFEED_TARGET_LANGUAGE`: target language tag
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("TRANSFEED_TRANSLATE_API_KEY") {
            if !key.is_empty() {
                self.translate.api_key = Some(key);
            }
        }
        if let Ok(lang) = std::env::var("TRANSFEED_TARGET_LANGUAGE") {
            if !lang.is_empty() {
                self.translate.target_language = lang;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.cache.capacity == 0 {
            return Err(TransfeedError::Config(
                "cache.capacity must be greater than zero".to_string(),
            ));
        }
        if self.cache.ttl_secs == 0 {
            return Err(TransfeedError::Config(
                "cache.ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.fetch.timeout_secs == 0
            || self.fetch.connect_timeout_secs == 0
            || self.translate.timeout_secs == 0
        {
            return Err(TransfeedError::Config(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        LanguageTag::parse(&self.translate.target_language)?;
        Ok(())
    }

    /// The validated target language.
    pub fn target_language(&self) -> Result<LanguageTag> {
        LanguageTag::parse(&self.translate.target_language)
    }
}
