//! Test helpers for integration tests.
//!
//! Provides an in-memory transport, a fixed feed source and registry
//! helpers backed by temporary directories.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use sendnews::{
    AdminList, ChatId, FanoutDelivery, FeedEntry, FeedSource, MessageTransport, NewsRelay,
    ParseMode, RelayError, Result, SubscriberRegistry, SubscriberStore, TransportError,
};

/// Feed URL served by [`StaticFeeds::android`].
pub const ANDROID_FEED: &str = "https://feeds.test/android";

/// One message the transport was asked to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub chat: ChatId,
    pub text: String,
    pub mode: ParseMode,
}

/// Transport that records every send and fails for configured chats.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
    failing: HashMap<ChatId, TransportError>,
    delay: Option<Duration>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every send to `chat` with `error`.
    pub fn failing(mut self, chat: i64, error: TransportError) -> Self {
        self.failing.insert(ChatId(chat), error);
        self
    }

    /// Wait this long before every send.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Messages that reached their recipient, in completion order.
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts delivered to `chat`.
    pub fn texts_to(&self, chat: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|s| s.chat == ChatId(chat))
            .map(|s| s.text)
            .collect()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn send(
        &self,
        chat: ChatId,
        text: &str,
        mode: ParseMode,
    ) -> std::result::Result<(), TransportError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.failing.get(&chat) {
            return Err(error.clone());
        }
        self.sent.lock().unwrap().push(Sent {
            chat,
            text: text.to_string(),
            mode,
        });
        Ok(())
    }
}

/// Feed source answering from a fixed map; unknown URLs fail.
#[derive(Default)]
pub struct StaticFeeds {
    feeds: HashMap<String, Vec<FeedEntry>>,
}

impl StaticFeeds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, url: &str, entries: Vec<FeedEntry>) -> Self {
        self.feeds.insert(url.to_string(), entries);
        self
    }

    /// A single feed with two Android headlines.
    pub fn android() -> Self {
        Self::new().with_feed(
            ANDROID_FEED,
            vec![
                FeedEntry::new("Android 16 released", "https://news.test/a16"),
                FeedEntry::new("Pixel update", "https://news.test/pixel"),
            ],
        )
    }
}

#[async_trait]
impl FeedSource for StaticFeeds {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>> {
        self.feeds
            .get(url)
            .cloned()
            .ok_or_else(|| RelayError::Feed(format!("no such feed: {url}")))
    }
}

/// Path of the subscriber file inside `dir`.
pub fn subscribers_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("users").join("users_database.db")
}

/// Open a registry stored in `dir`.
pub async fn open_registry(dir: &TempDir) -> Arc<SubscriberRegistry> {
    let store = SubscriberStore::new(subscribers_path(dir));
    Arc::new(SubscriberRegistry::open(store).await.unwrap())
}

/// Open a registry in `dir` and subscribe `chats`.
pub async fn registry_with(dir: &TempDir, chats: &[i64]) -> Arc<SubscriberRegistry> {
    let registry = open_registry(dir).await;
    for &chat in chats {
        registry.add(ChatId(chat)).await.unwrap();
    }
    registry
}

/// Build a relay over the Android feed with the given transport and admins.
pub fn android_relay(
    registry: Arc<SubscriberRegistry>,
    transport: Arc<RecordingTransport>,
    admins: &[i64],
) -> NewsRelay {
    let delivery = FanoutDelivery::new(transport).with_send_timeout(Duration::from_secs(2));
    NewsRelay::new(
        registry,
        Arc::new(StaticFeeds::android()),
        delivery,
        AdminList::new(admins.iter().copied()),
    )
    .with_feed_urls(vec![ANDROID_FEED.to_string()])
}
