use async_trait::async_trait;
use serde::Deserialize;

use crate::modules::telegram::{Notifier, OutgoingMessage, TelegramError};

/// Bot API envelope; only the acknowledgement matters here
#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    description: Option<String>,
}

pub struct TelegramClient {
    http_client: reqwest::Client,
    api_base_url: String,
}

impl TelegramClient {
    pub fn new(api_base_url: &str) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send(&self, bot_token: &str, message: &OutgoingMessage) -> Result<(), TelegramError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base_url, bot_token);

        let response = self
            .http_client
            .post(&url)
            .json(message)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                tracing::error!("Failed to reach Telegram: {}", e);
                TelegramError::Http(e)
            })?;

        let status = response.status();
        let result = response
            .json::<SendMessageResponse>()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?;

        if !result.ok {
            let description = result
                .description
                .unwrap_or_else(|| format!("HTTP {}", status));
            tracing::error!("Telegram API error: {}", description);
            return Err(TelegramError::Rejected(description));
        }

        tracing::debug!("Telegram message delivered to chat {}", message.chat_id);
        Ok(())
    }
}
