//! Origin feed fetcher.
//!
//! Downloads a feed over HTTP with bounded time and size and hands the bytes
//! to `feed-rs`, mapping the result onto the internal [`Feed`] model.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use feed_rs::parser;
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::config::FetchConfig;
use crate::error::{Result, TransfeedError};
use crate::feed::types::{Author, Feed, Item};

/// Source of parsed feeds.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse the feed at `url`.
    ///
    /// Performs exactly one outbound request; there are no retries.
    async fn fetch(&self, url: &str) -> Result<Feed>;
}

/// Feed source backed by a shared `reqwest` client.
pub struct HttpFeedSource {
    client: Client,
    max_feed_size: u64,
}

impl HttpFeedSource {
    /// Create a new fetcher from configuration.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(redirect_policy(config.max_redirects, config.block_private_networks))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| TransfeedError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
        })
    }
}

/// Follow at most `max` redirects; with `block_private` set, every hop must
/// pass [`validate_url`] as well.
fn redirect_policy(max: usize, block_private: bool) -> Policy {
    Policy::custom(move |attempt| {
        // `previous` starts with the initial URL
        if attempt.previous().len() > max {
            return attempt.error(format!("too many redirects (max {})", max));
        }
        if block_private {
            if let Err(e) = validate_url(attempt.url().as_str()) {
                tracing::warn!(location = %attempt.url(), error = %e, "Redirect rejected");
                return attempt.error(format!("redirect rejected: {}", e));
            }
        }
        attempt.follow()
    })
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<Feed> {
        if url.is_empty() {
            return Err(TransfeedError::InvalidRequest("feed URL is empty".to_string()));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransfeedError::Fetch(format!("failed to fetch feed: {}", e)))?;

        if !response.status().is_success() {
            return Err(TransfeedError::Fetch(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(TransfeedError::Fetch(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    content_length, self.max_feed_size
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransfeedError::Fetch(format!("failed to read response: {}", e)))?;

        // Chunked responses carry no Content-Length
        if bytes.len() as u64 > self.max_feed_size {
            return Err(TransfeedError::Fetch(format!(
                "feed too large: {} bytes (max {} bytes)",
                bytes.len(),
                self.max_feed_size
            )));
        }

        parse_feed(&bytes)
    }
}

/// Validate a feed URL against SSRF targets.
///
/// Rejects non-http(s) schemes, internal hostnames and loopback, private,
/// link-local or otherwise reserved addresses.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url)
        .map_err(|e| TransfeedError::InvalidRequest(format!("invalid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(TransfeedError::InvalidRequest(format!(
                "unsupported URL scheme: {}",
                scheme
            )));
        }
    }

    let host = parsed
        .host()
        .ok_or_else(|| TransfeedError::InvalidRequest("URL has no host".to_string()))?;

    let ip = match host {
        url::Host::Domain(domain) => {
            if is_forbidden_hostname(domain) {
                return Err(TransfeedError::InvalidRequest(format!(
                    "forbidden host: {}",
                    domain
                )));
            }
            return Ok(());
        }
        url::Host::Ipv4(ipv4) => IpAddr::V4(ipv4),
        url::Host::Ipv6(ipv6) => IpAddr::V6(ipv6),
    };

    if is_private_ip(&ip) {
        return Err(TransfeedError::InvalidRequest(format!(
            "private IP address not allowed: {}",
            ip
        )));
    }

    Ok(())
}

fn is_forbidden_hostname(host: &str) -> bool {
    const FORBIDDEN_SUFFIXES: [&str; 7] = [
        ".local",
        ".localhost",
        ".internal",
        ".intranet",
        ".corp",
        ".home",
        ".lan",
    ];

    let host = host.to_lowercase();
    host == "localhost" || FORBIDDEN_SUFFIXES.iter().any(|s| host.ends_with(s))
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            ipv4.is_loopback()
                || ipv4.is_private()
                || ipv4.is_link_local()
                || ipv4.is_broadcast()
                || ipv4.is_unspecified()
                || ipv4.is_documentation()
                // Carrier-grade NAT: 100.64.0.0/10
                || (octets[0] == 100 && (octets[1] & 0xc0) == 64)
        }
        IpAddr::V6(ipv6) => {
            if let Some(mapped) = ipv6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(mapped));
            }
            let segments = ipv6.segments();
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                // Unique local: fc00::/7
                || (segments[0] & 0xfe00) == 0xfc00
                // Link-local: fe80::/10
                || (segments[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Parse raw feed bytes (RSS, Atom or JSON Feed) into a [`Feed`].
pub fn parse_feed(bytes: &[u8]) -> Result<Feed> {
    let parsed = parser::parse(bytes)
        .map_err(|e| TransfeedError::Fetch(format!("failed to parse feed: {}", e)))?;

    let items = parsed
        .entries
        .into_iter()
        .map(|entry| Item {
            title: entry.title.map(|t| t.content).unwrap_or_default(),
            description: entry
                .summary
                .map(|t| t.content)
                .or(entry.content.and_then(|c| c.body))
                .unwrap_or_default(),
            link: entry
                .links
                .into_iter()
                .next()
                .map(|l| l.href)
                .unwrap_or_default(),
            author: entry.authors.into_iter().next().map(to_author),
            published: entry.published,
            updated: entry.updated,
        })
        .collect();

    Ok(Feed {
        title: parsed.title.map(|t| t.content).unwrap_or_default(),
        link: parsed
            .links
            .into_iter()
            .next()
            .map(|l| l.href)
            .unwrap_or_default(),
        description: parsed.description.map(|d| d.content).unwrap_or_default(),
        items,
        author: parsed.authors.into_iter().next().map(to_author),
        created: parsed.published,
        updated: parsed.updated,
    })
}

fn to_author(person: feed_rs::model::Person) -> Author {
    Author {
        name: person.name,
        email: person.email,
    }
}
