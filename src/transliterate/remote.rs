use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use super::Transliterator;
use crate::error::BotError;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:102.0) Gecko/20100101 Firefox/102.0";

/// Client for the behnevis conversion service.
///
/// The service takes the text as a plain-text body and answers with a JSON
/// object of string fragments. Their concatenation, in response order, is the
/// Farsi text.
pub struct RemoteTransliterator {
    client: reqwest::Client,
    url: String,
}

impl RemoteTransliterator {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build transliteration HTTP client")?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Transliterator for RemoteTransliterator {
    async fn transliterate(&self, text: &str) -> Result<String, BotError> {
        debug!("Sending {} chars to transliteration service: {}", text.len(), self.url);

        // The service only accepts requests that look like they came from its web page.
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "text/plain")
            .header("Accept", "*/*")
            .header("Accept-Language", "en-US,en;q=0.5")
            .header("Origin", "https://behnevis.com")
            .header("Referer", "https://behnevis.com/")
            .header("Sec-Fetch-Dest", "empty")
            .header("Sec-Fetch-Mode", "cors")
            .header("Sec-Fetch-Site", "cross-site")
            .body(text.to_string())
            .send()
            .await
            .map_err(|e| BotError::RemoteService(format!("err sending request: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BotError::RemoteService(format!("err reading response body: {e}")))?;

        if !status.is_success() {
            return Err(BotError::RemoteService(format!(
                "service returned {status}: {body}"
            )));
        }

        join_fragments(&body)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

fn join_fragments(body: &str) -> Result<String, BotError> {
    let fragments: Map<String, Value> = serde_json::from_str(body)
        .map_err(|e| BotError::RemoteService(format!("err unmarshaling response body: {e}")))?;

    let mut farsi = String::new();
    for (key, value) in fragments {
        match value {
            Value::String(s) => farsi.push_str(&s),
            other => {
                return Err(BotError::RemoteService(format!(
                    "non-string value for '{key}': {other}"
                )))
            }
        }
    }
    Ok(farsi)
}
