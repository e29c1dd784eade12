//! Telegram Bot API relay used by the feedback and notice endpoints.

pub mod client;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use client::TelegramClient;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The Bot API answered with `ok: false`
    #[error("Telegram rejected the message: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    Markdown,
}

/// Payload for the Bot API `sendMessage` method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    pub chat_id: String,
    pub text: String,
    pub parse_mode: ParseMode,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disable_web_page_preview: bool,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, bot_token: &str, message: &OutgoingMessage) -> Result<(), TelegramError>;
}
