//! Fan-out delivery with per-recipient failure isolation.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::config::DeliveryConfig;
use crate::delivery::outcome::{DeliveryOutcome, DeliveryReport, FailureKind};
use crate::delivery::transport::{MessageTransport, ParseMode, TransportError};
use crate::subscriber::ChatId;

/// Default per-recipient send timeout.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Default number of sends in flight.
pub const DEFAULT_MAX_CONCURRENT_SENDS: usize = 8;

/// Delivers a message to one or many recipients.
///
/// Owns no durable state. Failures are recorded as outcomes and never
/// propagate, and nothing is retried within a call.
pub struct FanoutDelivery {
    transport: Arc<dyn MessageTransport>,
    parse_mode: ParseMode,
    send_timeout: Duration,
    max_concurrent: usize,
}

impl FanoutDelivery {
    /// Create a fan-out over the given transport with default limits.
    pub fn new(transport: Arc<dyn MessageTransport>) -> Self {
        Self {
            transport,
            parse_mode: ParseMode::Html,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            max_concurrent: DEFAULT_MAX_CONCURRENT_SENDS,
        }
    }

    /// Create a fan-out using the delivery configuration.
    pub fn from_config(transport: Arc<dyn MessageTransport>, config: &DeliveryConfig) -> Self {
        Self::new(transport)
            .with_send_timeout(Duration::from_secs(config.send_timeout_secs))
            .with_max_concurrent(config.max_concurrent_sends)
    }

    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = mode;
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Set how many sends may be in flight at once (at least 1).
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    pub fn parse_mode(&self) -> ParseMode {
        self.parse_mode
    }

    /// Deliver to a single recipient with exactly one transport call.
    pub async fn deliver_one(&self, recipient: ChatId, text: &str) -> DeliveryOutcome {
        let send = self.transport.send(recipient, text, self.parse_mode);

        match tokio::time::timeout(self.send_timeout, send).await {
            Ok(Ok(())) => {
                debug!("Delivered to {}", recipient);
                DeliveryOutcome::delivered(recipient)
            }
            Ok(Err(TransportError::Permanent(reason))) => {
                debug!("Chat {} unreachable: {}", recipient, reason);
                DeliveryOutcome::unreachable(recipient, FailureKind::Permanent)
            }
            Ok(Err(TransportError::Transient(reason))) => {
                debug!("Delivery to {} failed: {}", recipient, reason);
                DeliveryOutcome::unreachable(recipient, FailureKind::Transient)
            }
            Err(_) => {
                debug!(
                    "Delivery to {} timed out after {:?}",
                    recipient, self.send_timeout
                );
                DeliveryOutcome::unreachable(recipient, FailureKind::TimedOut)
            }
        }
    }

    /// Deliver to every recipient, one outcome each.
    pub async fn deliver_all<I>(&self, recipients: I, text: &str) -> DeliveryReport
    where
        I: IntoIterator<Item = ChatId>,
    {
        let outcomes = stream::iter(recipients)
            .map(|recipient| self.deliver_one(recipient, text))
            .buffer_unordered(self.max_concurrent)
            .collect::<Vec<_>>()
            .await;

        DeliveryReport::new(outcomes)
    }
}
