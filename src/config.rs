use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::BotError;

/// Environment variable holding the Telegram bot token.
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
const LISTEN_ENV: &str = "FINGLISH_LISTEN";
const BACKEND_ENV: &str = "FINGLISH_BACKEND";

/// Which transliteration implementation serves live messages.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Local,
    Remote,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Local => write!(f, "local"),
            Backend::Remote => write!(f, "remote"),
        }
    }
}

impl FromStr for Backend {
    type Err = BotError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Backend::Local),
            "remote" => Ok(Backend::Remote),
            other => Err(BotError::Config(format!(
                "unknown transliteration backend '{other}' (expected 'local' or 'remote')"
            ))),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub transliteration: TransliterationConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base_url: default_api_base_url(),
        }
    }
}

impl TelegramConfig {
    /// Full `sendMessage` endpoint: `<base>/bot<token>/sendMessage`.
    pub fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base_url.trim_end_matches('/'),
            self.bot_token
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            webhook_path: default_webhook_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TransliterationConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_remote_url")]
    pub remote_url: String,
}

impl Default for TransliterationConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            remote_url: default_remote_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Upper bound for each outbound call (Telegram and the remote service).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_webhook_path() -> String {
    "/webhook".to_string()
}

fn default_remote_url() -> String {
    "https://9mkhzfaym3.execute-api.us-east-1.amazonaws.com/production/convert?".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Routes must start with `/`; a bare `webhook` becomes `/webhook`.
fn normalize_webhook_path(path: &str) -> std::result::Result<String, BotError> {
    let path = path.trim();
    if path.is_empty() {
        return Err(BotError::Config(
            "[server] webhook_path must not be empty".to_string(),
        ));
    }
    if path.starts_with('/') {
        Ok(path.to_string())
    } else {
        Ok(format!("/{path}"))
    }
}

impl Config {
    /// Load config: defaults, then the TOML file if present, then env vars.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// [`Config::load`] with an explicit variable lookup.
    pub fn load_with<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env(lookup)?;
        config.server.webhook_path = normalize_webhook_path(&config.server.webhook_path)?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Taking the lookup as a closure
    /// keeps tests away from the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(BOT_TOKEN_ENV) {
            self.telegram.bot_token = v;
        }
        if let Some(v) = lookup(LISTEN_ENV) {
            self.server.listen = v;
        }
        if let Some(v) = lookup(BACKEND_ENV) {
            self.transliteration.backend = v
                .parse::<Backend>()
                .with_context(|| format!("Invalid {BACKEND_ENV}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.telegram.api_base_url, "https://api.telegram.org");
        assert!(config.telegram.bot_token.is_empty());
        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(config.server.webhook_path, "/webhook");
        assert_eq!(config.transliteration.backend, Backend::Local);
        assert_eq!(config.http.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_parse_full_file() {
        let config = Config::parse(
            r#"
            [telegram]
            bot_token = "123:abc"
            api_base_url = "http://localhost:9000/"

            [server]
            listen = "127.0.0.1:3000"
            webhook_path = "/hook"

            [transliteration]
            backend = "remote"
            remote_url = "http://localhost:9001/convert"

            [http]
            timeout_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.server.webhook_path, "/hook");
        assert_eq!(config.transliteration.backend, Backend::Remote);
        assert_eq!(config.transliteration.remote_url, "http://localhost:9001/convert");
        assert_eq!(config.http.timeout_secs, 3);
    }

    #[test]
    fn test_send_message_url() {
        let telegram = TelegramConfig {
            bot_token: "123:abc".to_string(),
            api_base_url: "http://localhost:9000/".to_string(),
        };
        assert_eq!(
            telegram.send_message_url(),
            "http://localhost:9000/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::parse("[telegram]\nbot_token = \"from-file\"").unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            (BOT_TOKEN_ENV, "from-env"),
            (BACKEND_ENV, "Remote"),
        ]);
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.telegram.bot_token, "from-env");
        assert_eq!(config.transliteration.backend, Backend::Remote);
        assert_eq!(config.server.listen, "0.0.0.0:8080");
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let mut config = Config::default();
        let result = config.apply_env(|key| (key == BACKEND_ENV).then(|| "cloud".to_string()));
        assert!(result.is_err());
        assert!("cloud".parse::<Backend>().is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load_with(Path::new("definitely/not/here.toml"), |_| None).unwrap();
        assert_eq!(config.server.webhook_path, "/webhook");
        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(config.transliteration.backend, Backend::Local);
        assert!(config.telegram.bot_token.is_empty());
    }

    #[test]
    fn test_webhook_path_normalized() {
        assert_eq!(normalize_webhook_path("webhook").unwrap(), "/webhook");
        assert_eq!(normalize_webhook_path(" /hook ").unwrap(), "/hook");
        assert_eq!(normalize_webhook_path("/").unwrap(), "/");
        assert!(matches!(
            normalize_webhook_path(""),
            Err(BotError::Config(_))
        ));
    }

    #[test]
    fn test_load_rejects_empty_webhook_path() {
        let path = std::env::temp_dir().join(format!(
            "finglish-bot-empty-path-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[server]\nwebhook_path = \"\"\n").unwrap();
        let result = Config::load_with(&path, |_| None);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());

        let path = std::env::temp_dir().join(format!(
            "finglish-bot-bare-path-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[server]\nwebhook_path = \"hook\"\n").unwrap();
        let config = Config::load_with(&path, |_| None).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.server.webhook_path, "/hook");
    }
}
