use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Router};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::platform::telegram::parse_update;
use crate::platform::MessageSender;
use crate::transliterate::Transliterator;

/// Command Telegram sends when a user first opens the bot. It gets no reply.
const START_COMMAND: &str = "/start";

/// What happened to one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Payload could not be decoded or had update id 0
    Rejected,
    /// `/start`, acknowledged without a reply
    StartCommand,
    TransliterationFailed { chat_id: i64 },
    Delivered { chat_id: i64 },
    DeliveryFailed { chat_id: i64 },
}

/// Wires the inbound update through transliteration to the reply.
pub struct Bot {
    transliterator: Arc<dyn Transliterator>,
    sender: Arc<dyn MessageSender>,
}

impl Bot {
    pub fn new(transliterator: Arc<dyn Transliterator>, sender: Arc<dyn MessageSender>) -> Self {
        Self {
            transliterator,
            sender,
        }
    }

    /// Handle one raw webhook body. Every failure is logged here and ends
    /// the request; nothing is retried and the sender never sees an error.
    pub async fn handle(&self, body: &[u8]) -> Outcome {
        let update = match parse_update(body) {
            Ok(update) => update,
            Err(e) => {
                warn!("error parsing incoming update, {}", e);
                return Outcome::Rejected;
            }
        };
        debug!("Incoming update {}", update);

        let incoming = update.incoming();
        let chat_id = incoming.chat_id;
        let text = incoming.text.to_lowercase();

        if text == START_COMMAND {
            info!("Start command from chat id {}, nothing to send", chat_id);
            return Outcome::StartCommand;
        }

        let farsi = match self.transliterator.transliterate(&text).await {
            Ok(farsi) => farsi,
            Err(e) => {
                error!(
                    "{} transliteration failed for chat id {}: {}",
                    self.transliterator.name(),
                    chat_id,
                    e
                );
                return Outcome::TransliterationFailed { chat_id };
            }
        };

        match self.sender.send_message(chat_id, &farsi).await {
            Ok(_) => {
                info!("successfully distributed to chat id {}", chat_id);
                Outcome::Delivered { chat_id }
            }
            Err(e) => {
                error!(
                    "got error {} from telegram, response body is {}",
                    e,
                    e.response_body()
                );
                Outcome::DeliveryFailed { chat_id }
            }
        }
    }
}

/// Build the webhook routes. Telegram always gets 200 so it does not keep
/// redelivering updates we have already given up on.
pub fn router(bot: Arc<Bot>, webhook_path: &str) -> Router {
    let mut app = Router::new().route("/", post(handle_webhook).get(health));
    if webhook_path != "/" {
        app = app.route(webhook_path, post(handle_webhook));
    }
    app.with_state(bot)
}

async fn handle_webhook(State(bot): State<Arc<Bot>>, body: Bytes) -> StatusCode {
    bot.handle(&body).await;
    StatusCode::OK
}

async fn health() -> &'static str {
    "finglish bot is running"
}

/// Serve the webhook until the process is stopped.
pub async fn run(bot: Arc<Bot>, server: &ServerConfig) -> Result<()> {
    let app = router(bot, &server.webhook_path);

    let listener = tokio::net::TcpListener::bind(&server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", server.listen))?;
    info!(
        "Listening on {} (webhook path {})",
        server.listen, server.webhook_path
    );

    axum::serve(listener, app)
        .await
        .context("Webhook server failed")?;
    Ok(())
}
