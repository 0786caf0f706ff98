//! Delivery outcomes and per-cycle reports.

use std::collections::BTreeSet;
use std::fmt;

use crate::subscriber::ChatId;

/// Why a recipient was unreachable on this attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The transport says the recipient is gone for good.
    Permanent,
    /// Network or service failure.
    Transient,
    /// The send did not finish within the per-call timeout.
    TimedOut,
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    Unreachable(FailureKind),
}

/// Outcome of delivering to a single recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub recipient: ChatId,
    pub status: DeliveryStatus,
}

impl DeliveryOutcome {
    pub fn delivered(recipient: ChatId) -> Self {
        Self {
            recipient,
            status: DeliveryStatus::Delivered,
        }
    }

    pub fn unreachable(recipient: ChatId, kind: FailureKind) -> Self {
        Self {
            recipient,
            status: DeliveryStatus::Unreachable(kind),
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.status == DeliveryStatus::Delivered
    }

    pub fn is_unreachable(&self) -> bool {
        !self.is_delivered()
    }

    /// Unreachable for a reason that will not go away by itself.
    pub fn is_permanent_failure(&self) -> bool {
        self.status == DeliveryStatus::Unreachable(FailureKind::Permanent)
    }
}

/// All outcomes of one fan-out, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    outcomes: Vec<DeliveryOutcome>,
}

impl DeliveryReport {
    pub fn new(outcomes: Vec<DeliveryOutcome>) -> Self {
        Self { outcomes }
    }

    /// Number of recipients attempted.
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn delivered_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_delivered()).count()
    }

    /// Every recipient that was not reached, whatever the reason.
    pub fn unreachable(&self) -> BTreeSet<ChatId> {
        self.outcomes
            .iter()
            .filter(|o| o.is_unreachable())
            .map(|o| o.recipient)
            .collect()
    }

    /// Recipients that failed permanently and may be pruned.
    pub fn prune_candidates(&self) -> BTreeSet<ChatId> {
        self.outcomes
            .iter()
            .filter(|o| o.is_permanent_failure())
            .map(|o| o.recipient)
            .collect()
    }

    /// Status of a given recipient, if it was part of this fan-out.
    pub fn status_of(&self, recipient: ChatId) -> Option<DeliveryStatus> {
        self.outcomes
            .iter()
            .find(|o| o.recipient == recipient)
            .map(|o| o.status)
    }
}

impl fmt::Display for DeliveryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} delivered, {} unreachable ({} permanent)",
            self.delivered_count(),
            self.attempted() - self.delivered_count(),
            self.prune_candidates().len()
        )
    }
}
