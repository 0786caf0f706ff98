//! Maps incoming messages to relay operations.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::auth::AdminList;
use crate::bot::command::{parse_command, BotCommand};
use crate::delivery::{MessageTransport, ParseMode};
use crate::lifecycle::Lifecycle;
use crate::relay::NewsRelay;
use crate::subscriber::ChatId;
use crate::telegram::Message;

pub const HELP_TEXT: &str = "The *SendNewsBot* is really simple to be used.\n\n\
                             You just need to activate it.\n\n\
                             The bot will send you information on a daily basis.";
pub const UNAUTHORIZED_TEXT: &str = "You are not authorized to run this command";
pub const UNKNOWN_TEXT: &str = "Sorry, I didn't understand that command.";
pub const RESTARTING_TEXT: &str = "Bot is restarting...";
pub const NO_NEWS_TEXT: &str = "There is no news at the moment.";
pub const SUBSCRIBE_FAILED_TEXT: &str =
    "Sorry, your subscription could not be saved. Please try /start again later.";

/// Handles bot commands.
pub struct Dispatcher {
    relay: Arc<NewsRelay>,
    replies: Arc<dyn MessageTransport>,
    admins: AdminList,
    lifecycle: Lifecycle,
    bot_username: Option<String>,
    topic: String,
}

impl Dispatcher {
    pub fn new(
        relay: Arc<NewsRelay>,
        replies: Arc<dyn MessageTransport>,
        admins: AdminList,
        lifecycle: Lifecycle,
    ) -> Self {
        Self {
            relay,
            replies,
            admins,
            lifecycle,
            bot_username: None,
            topic: "Google/Android".to_string(),
        }
    }

    /// Only accept `/cmd@name` mentions of this username.
    pub fn with_bot_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    /// Topic announced by `/start`.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Welcome text sent on `/start`.
    pub fn welcome_text(&self) -> String {
        format!(
            "This bot sends news about a selected topic.\n\
             In this group the topic is: <strong>{}</strong>\n\n",
            self.topic
        )
    }

    /// Handle one incoming message. Non-command messages are ignored.
    pub async fn handle_message(&self, message: &Message) {
        let Some(text) = message.text.as_deref() else {
            return;
        };
        let Some(command) = parse_command(text, self.bot_username.as_deref()) else {
            return;
        };

        let chat = message.chat.id;
        let user_id = message.from.as_ref().map(|u| u.id).unwrap_or(chat.get());
        debug!("{} from user {} in chat {}", command, user_id, chat);

        if !self.admins.is_authorized(user_id, command.required_role()) {
            warn!("Unauthorized access denied for {}.", user_id);
            self.reply(chat, UNAUTHORIZED_TEXT, ParseMode::Plain).await;
            return;
        }

        match command {
            BotCommand::Start => self.start(chat).await,
            BotCommand::Help => self.reply(chat, HELP_TEXT, ParseMode::Markdown).await,
            BotCommand::SendReport => self.send_report(chat).await,
            BotCommand::Broadcast => self.broadcast(chat).await,
            BotCommand::Restart => {
                info!("Restart requested by {}", user_id);
                self.reply(chat, RESTARTING_TEXT, ParseMode::Plain).await;
                self.lifecycle.request_restart();
            }
            BotCommand::Unknown(_) => self.reply(chat, UNKNOWN_TEXT, ParseMode::Plain).await,
        }
    }

    async fn start(&self, chat: ChatId) {
        self.reply(chat, &self.welcome_text(), ParseMode::Html).await;

        if let Err(e) = self.relay.subscribe(chat).await {
            error!("Failed to subscribe chat {}: {}", chat, e);
            self.reply(chat, SUBSCRIBE_FAILED_TEXT, ParseMode::Plain).await;
        }
    }

    async fn send_report(&self, chat: ChatId) {
        match self.relay.send_report(chat).await {
            None => self.reply(chat, NO_NEWS_TEXT, ParseMode::Plain).await,
            Some(outcome) if outcome.is_unreachable() => {
                debug!("Report to {} not delivered: {:?}", chat, outcome.status);
            }
            Some(_) => {}
        }
    }

    async fn broadcast(&self, chat: ChatId) {
        let text = match self.relay.broadcast().await {
            Ok(summary) if summary.skipped => {
                "Nothing to broadcast: the feeds returned no entries.".to_string()
            }
            Ok(summary) => format!(
                "Broadcast of {} entries done: {}. Pruned: {}.",
                summary.entries, summary.report, summary.pruned
            ),
            Err(e) => {
                error!("Broadcast requested by chat {} failed: {}", chat, e);
                format!("Broadcast failed: {e}")
            }
        };
        self.reply(chat, &text, ParseMode::Plain).await;
    }

    /// Best-effort reply; a chat that cannot be reached is only logged.
    async fn reply(&self, chat: ChatId, text: &str, mode: ParseMode) {
        if let Err(e) = self.replies.send(chat, text, mode).await {
            debug!("Reply to {} failed: {}", chat, e);
        }
    }
}
