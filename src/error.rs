use thiserror::Error;

/// Everything that can stop a single webhook delivery from producing a reply.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("could not decode incoming update: {0}")]
    Decode(#[from] serde_json::Error),

    /// Telegram never sends update id 0, so a zero here means the payload
    /// carried no usable update (or an explicit zero we cannot tell apart).
    #[error("invalid update id of 0 indicates failure to parse incoming update")]
    InvalidUpdate,

    #[error("transliteration service error: {0}")]
    RemoteService(String),

    #[error("delivery failed: {message}")]
    Delivery { message: String, body: String },

    #[error("config error: {0}")]
    Config(String),
}

impl BotError {
    pub fn delivery(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
            body: body.into(),
        }
    }

    /// Raw response body captured before the failure, if any.
    pub fn response_body(&self) -> &str {
        match self {
            Self::Delivery { body, .. } => body,
            _ => "",
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
