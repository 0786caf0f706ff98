//! HTTP feed fetcher.
//!
//! Fetches RSS/Atom documents with bounded timeouts and size, and parses
//! them into [`FeedEntry`] values with `feed-rs`.

use std::time::Duration;

use async_trait::async_trait;
use feed_rs::parser;
use reqwest::Client;

use crate::config::FeedsConfig;
use crate::feed::source::FeedSource;
use crate::feed::types::FeedEntry;
use crate::{RelayError, Result};

/// User agent string for feed fetching.
const USER_AGENT: &str = concat!("SendNews/", env!("CARGO_PKG_VERSION"), " (RSS relay)");

/// Title used for entries that have none.
const UNTITLED: &str = "Untitled";

/// Feed fetcher over HTTP(S).
pub struct RssFetcher {
    client: Client,
    max_feed_size: u64,
}

impl RssFetcher {
    /// Create a fetcher from the feeds configuration.
    pub fn new(config: &FeedsConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RelayError::Feed(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
        })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RelayError::Feed(format!("failed to fetch feed: {e}")))?;

        if !response.status().is_success() {
            return Err(RelayError::Feed(format!("HTTP error: {}", response.status())));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(self.too_large(content_length));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RelayError::Feed(format!("failed to read response: {e}")))?;

        if bytes.len() as u64 > self.max_feed_size {
            return Err(self.too_large(bytes.len() as u64));
        }

        Ok(bytes.to_vec())
    }

    fn too_large(&self, size: u64) -> RelayError {
        RelayError::Feed(format!(
            "feed too large: {} bytes (max {} bytes)",
            size, self.max_feed_size
        ))
    }
}

#[async_trait]
impl FeedSource for RssFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>> {
        let bytes = self.fetch_bytes(url).await?;
        parse_feed(&bytes)
    }
}

/// Parse an RSS or Atom document into entries, preserving document order.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedEntry>> {
    let feed =
        parser::parse(bytes).map_err(|e| RelayError::Feed(format!("failed to parse feed: {e}")))?;

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| UNTITLED.to_string());
            let link = entry
                .links
                .into_iter()
                .next()
                .map(|l| l.href)
                .unwrap_or_default();
            FeedEntry { title, link }
        })
        .collect();

    Ok(entries)
}
