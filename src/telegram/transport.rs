//! [`MessageTransport`] over the Telegram Bot API.

use async_trait::async_trait;
use tracing::debug;

use crate::delivery::{MessageTransport, ParseMode, TransportError};
use crate::subscriber::ChatId;
use crate::telegram::client::TelegramClient;

/// Maximum length of a single Telegram text message.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

#[async_trait]
impl MessageTransport for TelegramClient {
    /// Sends `text`, split into several messages if it is too long.
    ///
    /// Stops at the first failed part.
    async fn send(&self, chat: ChatId, text: &str, mode: ParseMode) -> Result<(), TransportError> {
        let parts = split_message(text, MAX_MESSAGE_LENGTH);
        let total = parts.len();

        for (i, part) in parts.iter().enumerate() {
            if let Err(e) = self.send_message(chat, part, mode).await {
                let reason = e.to_string();
                return Err(if e.is_permanent() {
                    TransportError::Permanent(reason)
                } else {
                    TransportError::Transient(reason)
                });
            }
            if total > 1 {
                debug!("Sent part {}/{} to {}", i + 1, total, chat);
            }
        }

        Ok(())
    }
}

/// Split text into parts of at most `limit` characters.
///
/// Parts break between digest entries (blank lines) where possible, then
/// between lines, and only cut inside a line that is itself too long.
/// Always returns at least one part.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for piece in pieces(text, limit) {
        let len = piece.chars().count();
        if current_len + len > limit && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(&piece);
        current_len += len;
    }
    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

/// Break text into pieces no longer than `limit`, preferring entry then line boundaries.
fn pieces(text: &str, limit: usize) -> Vec<String> {
    let mut out = Vec::new();
    for block in text.split_inclusive("\n\n") {
        if block.chars().count() <= limit {
            out.push(block.to_string());
            continue;
        }
        for line in block.split_inclusive('\n') {
            if line.chars().count() <= limit {
                out.push(line.to_string());
                continue;
            }
            out.extend(cut_markup_line(line, limit));
        }
    }
    out
}

/// Longest entity name accepted when scanning for `&name;`.
const MAX_ENTITY_LEN: usize = 10;

/// Cut an overlong line without splitting a tag or an entity.
///
/// Tags still open at a cut are closed at the end of the part and reopened
/// at the start of the next one, so every part is valid markup on its own.
fn cut_markup_line(line: &str, limit: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut open: Vec<(String, String)> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    let mut has_content = false;

    for token in markup_tokens(line) {
        let token_len = token.chars().count();
        let mut next_open = open.clone();
        track_tag(&mut next_open, token);

        if has_content && current_len + token_len + closing_len(&next_open) > limit {
            current.push_str(&closing_tags(&open));
            out.push(std::mem::take(&mut current));
            current_len = 0;
            for (_, tag) in &open {
                current.push_str(tag);
                current_len += tag.chars().count();
            }
            has_content = false;
        }

        current.push_str(token);
        current_len += token_len;
        has_content = true;
        open = next_open;
    }

    if has_content || out.is_empty() {
        out.push(current);
    }
    out
}

/// Split a line into tags, entities and single characters.
fn markup_tokens(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = line;

    while let Some(first) = rest.chars().next() {
        let end = match first {
            '<' => rest.find('>').map(|i| i + 1),
            '&' => rest
                .char_indices()
                .skip(1)
                .take(MAX_ENTITY_LEN + 1)
                .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '#'))
                .filter(|&(i, c)| c == ';' && i > 1)
                .map(|(i, _)| i + 1),
            _ => None,
        }
        .unwrap_or(first.len_utf8());

        tokens.push(&rest[..end]);
        rest = &rest[end..];
    }

    tokens
}

/// Update the stack of open tags with `token` if it is a tag.
fn track_tag(open: &mut Vec<(String, String)>, token: &str) {
    let Some(inner) = token
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
    else {
        return;
    };

    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let name: String = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    if name.is_empty() {
        return;
    }

    if closing {
        if let Some(pos) = open.iter().rposition(|(n, _)| *n == name) {
            open.truncate(pos);
        }
    } else {
        open.push((name, token.to_string()));
    }
}

fn closing_tags(open: &[(String, String)]) -> String {
    open.iter()
        .rev()
        .map(|(name, _)| format!("</{name}>"))
        .collect()
}

fn closing_len(open: &[(String, String)]) -> usize {
    open.iter().map(|(name, _)| name.len() + 3).sum()
}
