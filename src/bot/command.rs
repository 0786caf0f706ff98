//! Bot command parsing.

use std::fmt;

use crate::auth::Role;

/// A parsed bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Welcome message and subscription.
    Start,
    /// Usage guide.
    Help,
    /// Digest to the requesting chat only.
    SendReport,
    /// Broadcast cycle to every subscriber now.
    Broadcast,
    /// Restart the bot process.
    Restart,
    /// Unknown command.
    Unknown(String),
}

impl BotCommand {
    /// Get the command name.
    pub fn name(&self) -> &str {
        match self {
            BotCommand::Start => "start",
            BotCommand::Help => "help",
            BotCommand::SendReport => "send_report",
            BotCommand::Broadcast => "broadcast",
            BotCommand::Restart => "r",
            BotCommand::Unknown(cmd) => cmd,
        }
    }

    /// Role required to run the command.
    pub fn required_role(&self) -> Role {
        match self {
            BotCommand::Broadcast | BotCommand::Restart => Role::Admin,
            _ => Role::Anyone,
        }
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name())
    }
}

/// Parse message text into a command.
///
/// Returns `None` for plain text and for commands addressed to another bot
/// (`/start@other_bot`). Command names are case-insensitive.
pub fn parse_command(text: &str, bot_username: Option<&str>) -> Option<BotCommand> {
    let word = text.trim().split_whitespace().next()?;
    let word = word.strip_prefix('/')?;

    let (name, target) = match word.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (word, None),
    };

    if let (Some(target), Some(me)) = (target, bot_username) {
        if !target.eq_ignore_ascii_case(me) {
            return None;
        }
    }

    let command = match name.to_lowercase().as_str() {
        "start" => BotCommand::Start,
        "help" => BotCommand::Help,
        "send_report" => BotCommand::SendReport,
        "broadcast" => BotCommand::Broadcast,
        "r" | "restart" => BotCommand::Restart,
        _ => BotCommand::Unknown(name.to_string()),
    };

    Some(command)
}
