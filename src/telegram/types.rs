//! Telegram Bot API objects, limited to the fields SendNews reads.

use serde::{Deserialize, Serialize};

use crate::subscriber::ChatId;

/// Envelope of every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<u16>,
    pub parameters: Option<ResponseParameters>,
}

/// Extra information attached to some errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseParameters {
    /// Seconds to wait before retrying (flood control).
    pub retry_after: Option<u64>,
}

/// A Telegram user or bot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

/// A chat.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    #[serde(rename = "type")]
    pub kind: String,
}

/// An incoming message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

/// An incoming update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// Body of a `sendMessage` call.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: ChatId,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
    pub link_preview_options: LinkPreviewOptions,
}

/// Link preview settings for outgoing messages.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LinkPreviewOptions {
    pub is_disabled: bool,
}

/// Body of a `getUpdates` call.
#[derive(Debug, Clone, Serialize)]
pub struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: &'static [&'static str],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_updates() {
        let json = r#"{
            "ok": true,
            "result": [
                {
                    "update_id": 10,
                    "message": {
                        "message_id": 1,
                        "from": {"id": 42, "is_bot": false, "first_name": "Ann"},
                        "chat": {"id": 42, "type": "private"},
                        "date": 1700000000,
                        "text": "/start"
                    }
                },
                {"update_id": 11, "edited_message": {}}
            ]
        }"#;

        let response: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        assert!(response.ok);
        let updates = response.result.unwrap();
        assert_eq!(updates.len(), 2);

        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, ChatId(42));
        assert_eq!(message.chat.kind, "private");
        assert_eq!(message.text.as_deref(), Some("/start"));
        assert_eq!(message.from.as_ref().unwrap().id, 42);
        assert!(updates[1].message.is_none());
    }

    #[test]
    fn test_deserialize_error() {
        let json = r#"{"ok":false,"error_code":429,"description":"Too Many Requests: retry after 5","parameters":{"retry_after":5}}"#;
        let response: ApiResponse<bool> = serde_json::from_str(json).unwrap();
        assert!(!response.ok);
        assert_eq!(response.error_code, Some(429));
        assert_eq!(response.parameters.unwrap().retry_after, Some(5));
    }

    #[test]
    fn test_serialize_send_message() {
        let request = SendMessageRequest {
            chat_id: ChatId(-100),
            text: "hi",
            parse_mode: None,
            link_preview_options: LinkPreviewOptions { is_disabled: true },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["chat_id"], -100);
        assert!(json.get("parse_mode").is_none());
        assert_eq!(json["link_preview_options"]["is_disabled"], true);
    }
}
