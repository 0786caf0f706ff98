//! Configuration module for SendNews.

use serde::Deserialize;
use std::path::Path;

use crate::{RelayError, Result};

/// Telegram Bot API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token. Takes precedence over `token_file` when non-empty.
    #[serde(default)]
    pub token: String,
    /// File whose first line holds the bot token.
    #[serde(default = "default_token_file")]
    pub token_file: String,
    /// Base URL of the Bot API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Long polling timeout for getUpdates in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Topic announced in the welcome message.
    #[serde(default = "default_topic")]
    pub topic: String,
}

fn default_token_file() -> String {
    "admin_only/SendNewsBot_token.txt".to_string()
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_topic() -> String {
    "Google/Android".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            token_file: default_token_file(),
            api_url: default_api_url(),
            poll_timeout_secs: default_poll_timeout(),
            topic: default_topic(),
        }
    }
}

/// Administrator allow-list configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminConfig {
    /// Administrator user IDs.
    #[serde(default)]
    pub ids: Vec<i64>,
    /// Optional file with whitespace-separated admin IDs on its first line.
    #[serde(default)]
    pub list_file: Option<String>,
}

/// Feed sources configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedsConfig {
    /// Feed URLs, fetched in order.
    #[serde(default = "default_feed_urls")]
    pub urls: Vec<String>,
    /// Maximum entries taken from each feed (0 = all).
    #[serde(default)]
    pub max_items_per_feed: usize,
    /// Connection timeout in seconds.
    #[serde(default = "default_feed_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_feed_read_timeout")]
    pub read_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_feed_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_feed_max_redirects")]
    pub max_redirects: usize,
    /// Maximum feed size in bytes.
    #[serde(default = "default_feed_max_size")]
    pub max_feed_size_bytes: u64,
}

fn default_feed_urls() -> Vec<String> {
    vec![
        // android
        "https://www.google.com/alerts/feeds/03166883211171261052/1353638956941984046".to_string(),
        // google pixel
        "https://www.google.com/alerts/feeds/03166883211171261052/17750017897550226590".to_string(),
    ]
}

fn default_feed_connect_timeout() -> u64 {
    10
}

fn default_feed_read_timeout() -> u64 {
    20
}

fn default_feed_total_timeout() -> u64 {
    30
}

fn default_feed_max_redirects() -> usize {
    5
}

fn default_feed_max_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            urls: default_feed_urls(),
            max_items_per_feed: 0,
            connect_timeout_secs: default_feed_connect_timeout(),
            read_timeout_secs: default_feed_read_timeout(),
            total_timeout_secs: default_feed_total_timeout(),
            max_redirects: default_feed_max_redirects(),
            max_feed_size_bytes: default_feed_max_size(),
        }
    }
}

/// Broadcast schedule configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Time of day for the daily broadcast (HH:MM).
    #[serde(default = "default_daily_at")]
    pub daily_at: String,
    /// Timezone `daily_at` is expressed in (e.g., "Europe/Rome", "UTC").
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Fixed broadcast interval in seconds. Overrides `daily_at` when set.
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

fn default_daily_at() -> String {
    "19:00".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            daily_at: default_daily_at(),
            timezone: default_timezone(),
            interval_secs: None,
        }
    }
}

/// Subscriber storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the subscriber database file.
    #[serde(default = "default_subscribers_file")]
    pub subscribers_file: String,
}

fn default_subscribers_file() -> String {
    "users/users_database.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            subscribers_file: default_subscribers_file(),
        }
    }
}

/// Fan-out delivery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// Maximum number of sends in flight during a broadcast.
    #[serde(default = "default_max_concurrent_sends")]
    pub max_concurrent_sends: usize,
    /// Per-recipient send timeout in seconds.
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
    /// Remove permanently unreachable subscribers after a broadcast.
    #[serde(default)]
    pub prune_unreachable: bool,
    /// Send a delivery summary to every admin after a broadcast.
    #[serde(default)]
    pub report_to_admins: bool,
}

fn default_max_concurrent_sends() -> usize {
    8
}

fn default_send_timeout() -> u64 {
    15
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sends: default_max_concurrent_sends(),
            send_timeout_secs: default_send_timeout(),
            prune_unreachable: false,
            report_to_admins: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/sendnews.log".to_string()
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
    /// Telegram configuration.
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Admin allow-list.
    #[serde(default)]
    pub admin: AdminConfig,
    /// Feed sources.
    #[serde(default)]
    pub feeds: FeedsConfig,
    /// Broadcast schedule.
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Subscriber storage.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Delivery tuning.
    #[serde(default)]
    pub delivery: DeliveryConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(RelayError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Like [`Config::load_with_env`], but a missing file yields the defaults.
    ///
    /// Any other failure, such as a syntax error, is returned.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::load_with_env(path) {
            Err(RelayError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                let mut config = Self::default();
                config.apply_env_overrides();
                Ok(config)
            }
            other => other,
        }
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| RelayError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `SENDNEWS_BOT_TOKEN`: Override the bot token
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("SENDNEWS_BOT_TOKEN") {
            if !token.is_empty() {
                self.telegram.token = token;
            }
        }
    }

    /// Resolve the bot token, reading `token_file` when no inline token is set.
    pub fn bot_token(&self) -> Result<String> {
        let token = self.telegram.token.trim();
        if !token.is_empty() {
            return Ok(token.to_string());
        }

        let content = std::fs::read_to_string(&self.telegram.token_file).map_err(|e| {
            RelayError::Config(format!(
                "cannot read token file {}: {e}",
                self.telegram.token_file
            ))
        })?;
        let token = content.lines().next().unwrap_or("").trim();
        if token.is_empty() {
            return Err(RelayError::Config(format!(
                "token file {} is empty",
                self.telegram.token_file
            )));
        }
        Ok(token.to_string())
    }

    /// Resolve admin IDs from `admin.ids` and the optional `admin.list_file`.
    pub fn admin_ids(&self) -> Result<Vec<i64>> {
        let mut ids = self.admin.ids.clone();

        if let Some(path) = &self.admin.list_file {
            let content = std::fs::read_to_string(path).map_err(|e| {
                RelayError::Config(format!("cannot read admin list {path}: {e}"))
            })?;
            for field in content.lines().next().unwrap_or("").split_whitespace() {
                let id = field.parse::<i64>().map_err(|_| {
                    RelayError::Config(format!("invalid admin id in {path}: {field}"))
                })?;
                ids.push(id);
            }
        }

        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    /// Validate the configuration.
    ///
    /// Token presence is checked separately by [`Config::bot_token`].
    pub fn validate(&self) -> Result<()> {
        if self.feeds.urls.is_empty() {
            return Err(RelayError::Validation(
                "at least one feed URL must be configured".to_string(),
            ));
        }

        for feed_url in &self.feeds.urls {
            let parsed = url::Url::parse(feed_url)
                .map_err(|e| RelayError::Validation(format!("invalid feed URL {feed_url}: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(RelayError::Validation(format!(
                    "unsupported URL scheme: {}",
                    parsed.scheme()
                )));
            }
        }

        crate::scheduler::Schedule::from_config(&self.schedule)?;

        if self.delivery.max_concurrent_sends == 0 {
            return Err(RelayError::Validation(
                "delivery.max_concurrent_sends must be at least 1".to_string(),
            ));
        }
        if self.delivery.send_timeout_secs == 0 {
            return Err(RelayError::Validation(
                "delivery.send_timeout_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
