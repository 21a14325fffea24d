mod bot;
mod config;
mod error;
mod platform;
mod transliterate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::Bot;
use crate::config::Config;
use crate::platform::telegram::TelegramClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,finglish_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Telegram API: {}", config.telegram.api_base_url);
    info!("  Backend: {}", config.transliteration.backend);
    info!("  Timeout: {}s", config.http.timeout_secs);
    if config.telegram.bot_token.is_empty() {
        warn!(
            "No bot token configured (set {} or [telegram] bot_token); replies will fail",
            config::BOT_TOKEN_ENV
        );
    }

    let transliterator = transliterate::build_transliterator(&config)?;
    let sender = Arc::new(TelegramClient::new(&config.telegram, &config.http)?);
    let bot = Arc::new(Bot::new(transliterator, sender));

    info!("Bot is starting...");
    bot::run(bot, &config.server).await?;

    Ok(())
}
