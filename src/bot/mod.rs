//! Telegram command surface for SendNews.
//!
//! Commands map one-to-one onto [`crate::relay::NewsRelay`] operations:
//! `/start` subscribes, `/send_report` sends the digest to the requesting
//! chat, `/broadcast` runs a broadcast cycle and `/r` restarts the bot.
//! The last two are admin-only.

pub mod command;
pub mod dispatcher;
pub mod polling;

pub use command::{parse_command, BotCommand};
pub use dispatcher::Dispatcher;
pub use polling::run_polling;
