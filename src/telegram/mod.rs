//! Telegram Bot API integration for SendNews.

pub mod client;
pub mod transport;
pub mod types;

pub use client::{ApiError, TelegramClient};
pub use transport::{split_message, MAX_MESSAGE_LENGTH};
pub use types::{Chat, Message, Update, User};
