//! Relay service: the operations the bot commands and the scheduler run.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::auth::AdminList;
use crate::config::Config;
use crate::delivery::{DeliveryOutcome, DeliveryReport, FanoutDelivery};
use crate::digest::render_sections;
use crate::feed::{collect_entries, FeedSource};
use crate::subscriber::{ChatId, SubscriberRegistry};
use crate::Result;

/// What one broadcast cycle did.
#[derive(Debug, Clone, Default)]
pub struct BroadcastSummary {
    /// Feed entries in the digest.
    pub entries: usize,
    /// Outcomes per subscriber. Empty when the cycle was skipped.
    pub report: DeliveryReport,
    /// Subscribers removed after the cycle.
    pub pruned: usize,
    /// True when there was nothing to send.
    pub skipped: bool,
}

/// Relays feed digests to subscribers.
pub struct NewsRelay {
    registry: Arc<SubscriberRegistry>,
    feeds: Arc<dyn FeedSource>,
    feed_urls: Vec<String>,
    max_items_per_feed: usize,
    delivery: FanoutDelivery,
    admins: AdminList,
    prune_unreachable: bool,
    report_to_admins: bool,
}

impl NewsRelay {
    /// Create a relay with no feeds configured and pruning and admin reports off.
    pub fn new(
        registry: Arc<SubscriberRegistry>,
        feeds: Arc<dyn FeedSource>,
        delivery: FanoutDelivery,
        admins: AdminList,
    ) -> Self {
        Self {
            registry,
            feeds,
            feed_urls: Vec::new(),
            max_items_per_feed: 0,
            delivery,
            admins,
            prune_unreachable: false,
            report_to_admins: false,
        }
    }

    /// Apply feed and delivery settings from the configuration.
    pub fn configured(self, config: &Config) -> Self {
        self.with_feed_urls(config.feeds.urls.clone())
            .with_max_items_per_feed(config.feeds.max_items_per_feed)
            .with_pruning(config.delivery.prune_unreachable)
            .with_admin_reports(config.delivery.report_to_admins)
    }

    pub fn with_feed_urls(mut self, urls: Vec<String>) -> Self {
        self.feed_urls = urls;
        self
    }

    pub fn with_max_items_per_feed(mut self, max: usize) -> Self {
        self.max_items_per_feed = max;
        self
    }

    /// Remove permanently unreachable subscribers after each broadcast.
    pub fn with_pruning(mut self, enabled: bool) -> Self {
        self.prune_unreachable = enabled;
        self
    }

    /// Send each admin a delivery summary after each broadcast.
    pub fn with_admin_reports(mut self, enabled: bool) -> Self {
        self.report_to_admins = enabled;
        self
    }

    /// Subscribe a chat. Returns `true` if it was new.
    pub async fn subscribe(&self, chat: ChatId) -> Result<bool> {
        self.registry.add(chat).await
    }

    /// Fetch all feeds and render the current digest.
    ///
    /// Every call renders the full current snapshot; nothing is remembered
    /// between cycles.
    pub async fn build_digest(&self) -> (String, usize) {
        let sections =
            collect_entries(self.feeds.as_ref(), &self.feed_urls, self.max_items_per_feed).await;
        let entries = sections.iter().map(Vec::len).sum();
        (render_sections(&sections), entries)
    }

    /// Send the digest to one chat. `None` when there is nothing to send.
    pub async fn send_report(&self, chat: ChatId) -> Option<DeliveryOutcome> {
        let (digest, entries) = self.build_digest().await;
        if digest.is_empty() {
            info!("No feed entries for report to {}", chat);
            return None;
        }

        let outcome = self.delivery.deliver_one(chat, &digest).await;
        info!(
            "Report with {} entries to {}: {:?}",
            entries, chat, outcome.status
        );
        Some(outcome)
    }

    /// Run one broadcast cycle to every subscriber.
    ///
    /// Delivery failures never fail the cycle; only a failed prune does.
    pub async fn broadcast(&self) -> Result<BroadcastSummary> {
        let (digest, entries) = self.build_digest().await;
        if digest.is_empty() {
            warn!("Broadcast skipped: no feed entries");
            return Ok(BroadcastSummary {
                skipped: true,
                ..BroadcastSummary::default()
            });
        }

        let recipients = self.registry.all().await;
        info!(
            "Broadcasting {} entries to {} subscriber(s)",
            entries,
            recipients.len()
        );

        let report = self.delivery.deliver_all(recipients, &digest).await;
        info!("Broadcast finished: {}", report);
        if !report.unreachable().is_empty() {
            warn!("Unreachable this cycle: {:?}", report.unreachable());
        }

        if self.report_to_admins {
            self.send_admin_summary(&report).await;
        }

        let pruned = if self.prune_unreachable {
            self.prune(report.prune_candidates()).await?
        } else {
            0
        };

        Ok(BroadcastSummary {
            entries,
            report,
            pruned,
            skipped: false,
        })
    }

    /// Remove the given subscribers.
    pub async fn prune(&self, chats: BTreeSet<ChatId>) -> Result<usize> {
        if chats.is_empty() {
            return Ok(0);
        }
        self.registry.remove(chats).await.inspect_err(|e| {
            error!("Failed to prune unreachable subscribers: {}", e);
        })
    }

    async fn send_admin_summary(&self, report: &DeliveryReport) {
        let text = format!(
            "<b>Summary</b>\nActive users: {}\nInactive users: {}\n",
            report.delivered_count(),
            report.attempted() - report.delivered_count()
        );
        let admin_chats = self.admins.iter().map(ChatId);
        let admin_report = self.delivery.deliver_all(admin_chats, &text).await;
        if admin_report.delivered_count() < admin_report.attempted() {
            warn!("Admin summary: {}", admin_report);
        }
    }
}
