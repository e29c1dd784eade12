use axum::{extract::State, Json};
use std::sync::Arc;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::notifications::dtos::{DeliveryResponseDto, FeedbackDto, NoticeDto};
use crate::features::notifications::services::NotificationService;

/// Relay app feedback to the Telegram chat
#[utoipa::path(
    post,
    path = "/api/feedback",
    request_body = FeedbackDto,
    responses(
        (status = 200, description = "Feedback delivered", body = DeliveryResponseDto),
        (status = 400, description = "Missing appname or content"),
        (status = 401, description = "Origin not allowed and no valid API key"),
        (status = 500, description = "Telegram not configured or rejected the message")
    ),
    tag = "notifications"
)]
pub async fn send_feedback(
    State(service): State<Arc<NotificationService>>,
    AppJson(dto): AppJson<FeedbackDto>,
) -> Result<Json<DeliveryResponseDto>> {
    let response = service.send_feedback(dto).await?;
    Ok(Json(response))
}

/// Relay a preformatted Markdown notice
#[utoipa::path(
    post,
    path = "/api/notice",
    request_body = NoticeDto,
    responses(
        (status = 200, description = "Notice delivered", body = DeliveryResponseDto),
        (status = 400, description = "Missing message"),
        (status = 401, description = "Origin not allowed and no valid API key"),
        (status = 500, description = "Telegram not configured or rejected the message")
    ),
    tag = "notifications"
)]
pub async fn send_notice(
    State(service): State<Arc<NotificationService>>,
    AppJson(dto): AppJson<NoticeDto>,
) -> Result<Json<DeliveryResponseDto>> {
    let response = service.send_notice(dto).await?;
    Ok(Json(response))
}
