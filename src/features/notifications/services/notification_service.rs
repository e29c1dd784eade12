use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use validator::Validate;

use crate::core::config::TelegramConfig;
use crate::core::error::{AppError, Result};
use crate::features::notifications::dtos::{AppInfoDto, DeliveryResponseDto, FeedbackDto, NoticeDto};
use crate::modules::telegram::{Notifier, OutgoingMessage, ParseMode, TelegramError};
use crate::shared::validation::field_errors;

/// Moscow time, UTC+3 all year
const MOSCOW_OFFSET_SECS: i32 = 3 * 3600;

pub fn format_moscow_time(at: DateTime<Utc>) -> String {
    const FORMAT: &str = "%d.%m.%Y, %H:%M:%S";
    match FixedOffset::east_opt(MOSCOW_OFFSET_SECS) {
        Some(offset) => at.with_timezone(&offset).format(FORMAT).to_string(),
        None => at.format(FORMAT).to_string(),
    }
}

/// Telegram text for a feedback submission
pub fn feedback_text(app: &AppInfoDto, content: &str, at: DateTime<Utc>) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_default();
    let id = app.id.as_ref().map(|id| id.to_string()).unwrap_or_default();

    format!(
        "🔔 *New feedback!*\n\n*App:* `{} (v{}, ID: {}, Pkg: {})`\n*Time:* `{}`\n\n*Content:*\n{}",
        field(&app.name),
        field(&app.version),
        id,
        field(&app.packagename),
        format_moscow_time(at),
        content
    )
}

/// Relays feedback and notices to the configured Telegram chat
pub struct NotificationService {
    notifier: Arc<dyn Notifier>,
    config: TelegramConfig,
    expose_error_details: bool,
}

impl NotificationService {
    pub fn new(notifier: Arc<dyn Notifier>, config: TelegramConfig, expose_error_details: bool) -> Self {
        Self {
            notifier,
            config,
            expose_error_details,
        }
    }

    pub async fn send_feedback(&self, dto: FeedbackDto) -> Result<DeliveryResponseDto> {
        dto.validate()
            .map_err(|e| AppError::Validation(field_errors(&e)))?;

        let (Some(app), Some(content)) = (dto.appname, dto.content) else {
            return Err(AppError::Validation(vec![
                "appname: Required".to_string(),
                "content: Required".to_string(),
            ]));
        };

        let text = feedback_text(&app, &content, Utc::now());
        self.deliver(text, false).await?;

        tracing::info!(
            "Feedback from {} relayed to Telegram",
            app.name.as_deref().unwrap_or("unknown app")
        );
        Ok(DeliveryResponseDto {
            message: "Feedback sent successfully!".to_string(),
        })
    }

    pub async fn send_notice(&self, dto: NoticeDto) -> Result<DeliveryResponseDto> {
        dto.validate()
            .map_err(|e| AppError::Validation(field_errors(&e)))?;

        let text = dto
            .message
            .ok_or_else(|| AppError::Validation(vec!["message: Required".to_string()]))?;
        self.deliver(text, true).await?;

        tracing::info!("Notice relayed to Telegram");
        Ok(DeliveryResponseDto {
            message: "Notification sent successfully!".to_string(),
        })
    }

    async fn deliver(&self, text: String, disable_web_page_preview: bool) -> Result<()> {
        let (Some(bot_token), Some(chat_id)) = (&self.config.bot_token, &self.config.chat_id)
        else {
            return Err(AppError::Configuration(
                "Telegram secrets are not configured".to_string(),
            ));
        };

        let message = OutgoingMessage {
            chat_id: chat_id.clone(),
            text,
            parse_mode: ParseMode::Markdown,
            disable_web_page_preview,
        };

        self.notifier
            .send(bot_token, &message)
            .await
            .map_err(|e| self.upstream(e))
    }

    fn upstream(&self, error: TelegramError) -> AppError {
        tracing::error!("Telegram API error: {}", error);
        AppError::Upstream {
            message: "Failed to send message to Telegram.".to_string(),
            details: if self.expose_error_details {
                vec![error.to_string()]
            } else {
                Vec::new()
            },
        }
    }
}
