//! Messaging transport abstraction.

use async_trait::async_trait;
use thiserror::Error;

use crate::subscriber::ChatId;

/// How the transport should interpret message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Plain text.
    Plain,
    /// HTML-like markup (`<b>`, `<a href>`).
    #[default]
    Html,
    /// Markdown-like markup (`*bold*`).
    Markdown,
}

impl ParseMode {
    /// Name used by the Telegram Bot API, `None` for plain text.
    pub fn api_name(self) -> Option<&'static str> {
        match self {
            ParseMode::Plain => None,
            ParseMode::Html => Some("HTML"),
            ParseMode::Markdown => Some("Markdown"),
        }
    }
}

/// A failed delivery attempt, classified by whether retrying can help.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The recipient cannot be reached (blocked the bot, chat deleted, ...).
    #[error("recipient unreachable: {0}")]
    Permanent(String),

    /// Network or service failure; the next cycle may succeed.
    #[error("transient delivery failure: {0}")]
    Transient(String),
}

impl TransportError {
    /// Whether the recipient is a candidate for pruning.
    pub fn is_permanent(&self) -> bool {
        matches!(self, TransportError::Permanent(_))
    }
}

/// Delivers one text to one recipient.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Attempt delivery of `text` to `chat`.
    async fn send(&self, chat: ChatId, text: &str, mode: ParseMode) -> Result<(), TransportError>;
}
