//! Minimal Telegram Bot API client

use crate::config::BotConfig;
use crate::delivery::{DeliveryChannel, MessageId};
use crate::error::DeliveryError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Extra time on top of the long-poll timeout before a request is abandoned
const REQUEST_GRACE_SECS: u64 = 10;

const PARSE_MODE_HTML: &str = "HTML";

/// Envelope every Bot API response is wrapped in
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    /// Unix timestamp
    pub date: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Serialize)]
struct GetUpdates {
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

#[derive(Serialize)]
struct EditMessageText<'a> {
    chat_id: i64,
    message_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

/// Bot API client bound to one bot token
#[derive(Debug, Clone)]
pub struct TelegramApi {
    client: Client,
    base_url: String,
    poll_timeout: Duration,
}

impl TelegramApi {
    pub fn with_config(config: &BotConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.poll_timeout + Duration::from_secs(REQUEST_GRACE_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", config.api_url.trim_end_matches('/'), config.token),
            poll_timeout: config.poll_timeout,
        })
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> std::result::Result<T, DeliveryError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await?;

        match (envelope.ok, envelope.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(DeliveryError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| format!("{} returned {}", method, status)),
            )),
        }
    }

    /// Long-poll for new messages after `offset`
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
    ) -> std::result::Result<Vec<Update>, DeliveryError> {
        let body = GetUpdates {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: ["message"],
        };
        self.call("getUpdates", &body).await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
    ) -> std::result::Result<Message, DeliveryError> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode,
        };
        self.call("sendMessage", &body).await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        parse_mode: Option<&str>,
    ) -> std::result::Result<(), DeliveryError> {
        let body = EditMessageText {
            chat_id,
            message_id,
            text,
            parse_mode,
        };
        // The result is either the edited message or `true`
        let _: serde_json::Value = self.call("editMessageText", &body).await?;
        Ok(())
    }
}

/// Delivery channel replying into one chat
#[derive(Debug, Clone)]
pub struct TelegramChannel {
    api: Arc<TelegramApi>,
    chat_id: i64,
}

impl TelegramChannel {
    pub fn new(api: Arc<TelegramApi>, chat_id: i64) -> Self {
        Self { api, chat_id }
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }
}

#[async_trait]
impl DeliveryChannel for TelegramChannel {
    async fn send(&self, text: &str) -> std::result::Result<MessageId, DeliveryError> {
        let message = self
            .api
            .send_message(self.chat_id, text, Some(PARSE_MODE_HTML))
            .await?;
        debug!(chat_id = self.chat_id, message_id = message.message_id, "message sent");
        Ok(message.message_id)
    }

    async fn send_text(&self, text: &str) -> std::result::Result<MessageId, DeliveryError> {
        let message = self.api.send_message(self.chat_id, text, None).await?;
        debug!(chat_id = self.chat_id, message_id = message.message_id, "message sent");
        Ok(message.message_id)
    }

    async fn replace(&self, message: MessageId, text: &str) -> std::result::Result<(), DeliveryError> {
        self.api
            .edit_message_text(self.chat_id, message, text, Some(PARSE_MODE_HTML))
            .await
    }
}
