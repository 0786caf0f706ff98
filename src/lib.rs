//! SendNews - RSS to Telegram news relay
//!
//! Fetches configured feeds, renders them into a digest and sends it to
//! every subscribed chat, once a day or on demand.

pub mod app;
pub mod auth;
pub mod bot;
pub mod config;
pub mod delivery;
pub mod digest;
pub mod error;
pub mod feed;
pub mod lifecycle;
pub mod logging;
pub mod relay;
pub mod scheduler;
pub mod subscriber;
pub mod telegram;

pub use auth::{AdminList, Role};
pub use config::Config;
pub use delivery::{
    DeliveryOutcome, DeliveryReport, DeliveryStatus, FailureKind, FanoutDelivery,
    MessageTransport, ParseMode, TransportError,
};
pub use digest::{render_digest, render_sections};
pub use error::{RelayError, Result};
pub use feed::{FeedEntry, FeedSource, RssFetcher};
pub use lifecycle::{Exit, Lifecycle};
pub use relay::{BroadcastSummary, NewsRelay};
pub use subscriber::{ChatId, SubscriberRegistry, SubscriberStore};
pub use telegram::TelegramClient;
