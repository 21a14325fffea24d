pub mod telegram;

use async_trait::async_trait;

use crate::error::BotError;

/// A message received from the platform, reduced to what the bot acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Conversation the reply goes back to
    pub chat_id: i64,
    /// The message text, empty when the message carried none
    pub text: String,
}

/// Delivers a text reply to a conversation.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Returns the platform's raw response body on success. Failures carry
    /// whatever body was read before things went wrong.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<String, BotError>;
}
