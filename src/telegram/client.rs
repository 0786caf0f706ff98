//! Minimal Telegram Bot API client.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::config::TelegramConfig;
use crate::delivery::ParseMode;
use crate::subscriber::ChatId;
use crate::telegram::types::{
    ApiResponse, GetUpdatesRequest, LinkPreviewOptions, Message, SendMessageRequest, Update, User,
};
use crate::RelayError;

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Slack added on top of the long-polling timeout for the HTTP request.
const REQUEST_TIMEOUT_MARGIN_SECS: u64 = 15;

/// Descriptions of 400 errors that mean the chat will never accept messages.
///
/// "group chat was upgraded" is not listed: the group lives on under a new ID.
const GONE_DESCRIPTIONS: [&str; 6] = [
    "chat not found",
    "user not found",
    "user is deactivated",
    "peer_id_invalid",
    "have no rights to send",
    "bot is not a member",
];

/// Error from a Bot API call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request did not produce a usable response.
    #[error("request failed: {0}")]
    Http(String),

    /// The API answered with `ok: false`.
    #[error("{description} (code {code})")]
    Api {
        code: u16,
        description: String,
        retry_after: Option<u64>,
    },
}

impl ApiError {
    /// Whether the error means the target chat is gone for good.
    ///
    /// 403 covers blocked bots, kicked bots and deactivated users.
    pub fn is_permanent(&self) -> bool {
        match self {
            ApiError::Api { code: 403, .. } => true,
            ApiError::Api {
                code: 400,
                description,
                ..
            } => {
                let description = description.to_lowercase();
                GONE_DESCRIPTIONS.iter().any(|d| description.contains(d))
            }
            _ => false,
        }
    }

    /// Flood-control wait requested by the API.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiError::Api {
                retry_after: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

impl From<ApiError> for RelayError {
    fn from(e: ApiError) -> Self {
        RelayError::Telegram(e.to_string())
    }
}

/// Telegram Bot API client.
///
/// Error messages never include the request URL, which embeds the token.
pub struct TelegramClient {
    client: Client,
    api_url: String,
    token: String,
}

impl TelegramClient {
    /// Create a client for the configured API endpoint.
    pub fn new(config: &TelegramConfig, token: &str) -> crate::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(
                config.poll_timeout_secs + REQUEST_TIMEOUT_MARGIN_SECS,
            ))
            .build()
            .map_err(|e| RelayError::Telegram(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Information about the bot itself.
    pub async fn get_me(&self) -> Result<User, ApiError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Long-poll for message updates after `offset`.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, ApiError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: &["message"],
        };
        self.call("getUpdates", &request).await
    }

    /// Send a text message with link previews disabled.
    pub async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        mode: ParseMode,
    ) -> Result<Message, ApiError> {
        let request = SendMessageRequest {
            chat_id: chat,
            text,
            parse_mode: mode.api_name(),
            link_preview_options: LinkPreviewOptions { is_disabled: true },
        };
        self.call("sendMessage", &request).await
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/bot{}/{}", self.api_url, self.token, method);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Http(e.without_url().to_string()))?;

        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            ApiError::Http(format!(
                "invalid {method} response (HTTP {status}): {}",
                e.without_url()
            ))
        })?;

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                error_code,
                description,
                parameters,
                ..
            } => Err(ApiError::Api {
                code: error_code.unwrap_or_else(|| status.as_u16()),
                description: description.unwrap_or_else(|| format!("{method} failed")),
                retry_after: parameters.and_then(|p| p.retry_after),
            }),
        }
    }
}
