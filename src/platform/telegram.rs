use std::fmt;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::{IncomingMessage, MessageSender};
use crate::config::{HttpConfig, TelegramConfig};
use crate::error::BotError;

/// One webhook delivery from Telegram.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Update {
    #[serde(default, deserialize_with = "null_as_default")]
    pub update_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: Message,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chat: Chat,
    // Attachments are decoded so they show up in logs; the bot only answers text.
    #[serde(default)]
    pub audio: Option<Audio>,
    #[serde(default)]
    pub voice: Option<Voice>,
    #[serde(default)]
    pub document: Option<Document>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Chat {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Audio {
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: i64,
}

/// Voice notes carry the same fields we care about as audio files.
pub type Voice = Audio;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Document {
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_name: String,
}

/// Telegram may send `null` where a field is absent; both decode to the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl fmt::Display for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(update id: {}, message: {})", self.update_id, self.message)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(text: {}, chat: {}", self.text, self.chat)?;
        if let Some(audio) = &self.audio {
            write!(f, ", audio: {audio}")?;
        }
        if let Some(voice) = &self.voice {
            write!(f, ", voice: {voice}")?;
        }
        if let Some(document) = &self.document {
            write!(f, ", document: {document}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Chat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(id: {})", self.id)
    }
}

impl fmt::Display for Audio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(file id: {}, duration: {})", self.file_id, self.duration)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(file id: {}, file name: {})", self.file_id, self.file_name)
    }
}

impl Update {
    pub fn incoming(&self) -> IncomingMessage {
        IncomingMessage {
            chat_id: self.message.chat.id,
            text: self.message.text.clone(),
        }
    }
}

/// Decode a webhook body into an [`Update`].
///
/// An `update_id` of 0 is rejected: Telegram numbers updates from 1, so a
/// zero means the field was missing. A real update numbered 0 would be
/// dropped too.
pub fn parse_update(body: &[u8]) -> Result<Update, BotError> {
    let update: Update = serde_json::from_slice(body)?;
    if update.update_id == 0 {
        return Err(BotError::InvalidUpdate);
    }
    Ok(update)
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
}

/// Sends replies through the Bot API `sendMessage` method.
pub struct TelegramClient {
    client: reqwest::Client,
    send_message_url: String,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig, http: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(http.timeout())
            .build()
            .context("Failed to build Telegram HTTP client")?;
        Ok(Self {
            client,
            send_message_url: config.send_message_url(),
        })
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<String, BotError> {
        debug!("Sending {} to chat_id: {}", text, chat_id);

        let chat_id = chat_id.to_string();
        let response = self
            .client
            .post(&self.send_message_url)
            .form(&[("chat_id", chat_id.as_str()), ("text", text)])
            .send()
            .await
            .map_err(|e| BotError::delivery(format!("error posting text to the chat: {e}"), ""))?;

        let body = response
            .text()
            .await
            .map_err(|e| BotError::delivery(format!("error reading Telegram answer: {e}"), ""))?;

        debug!("Body of Telegram response: {}", body);

        let parsed: TelegramResponse = serde_json::from_str(&body).map_err(|e| {
            BotError::delivery(format!("error parsing Telegram answer: {e}"), body.clone())
        })?;

        if !parsed.ok {
            let description = parsed
                .description
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(BotError::delivery(description, body));
        }

        Ok(body)
    }
}
