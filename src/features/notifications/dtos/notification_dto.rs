use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::shared::types::LooseId;

/// Application that sent the feedback. Every part is optional; missing
/// values render as empty in the message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AppInfoDto {
    pub name: Option<String>,
    pub version: Option<String>,
    pub id: Option<LooseId>,
    pub packagename: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct FeedbackDto {
    #[validate(required(message = "Required"))]
    pub appname: Option<AppInfoDto>,

    #[validate(
        required(message = "Required"),
        length(min = 1, message = "Content cannot be empty")
    )]
    pub content: Option<String>,
}

/// Preformatted Markdown message relayed as is
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NoticeDto {
    #[validate(
        required(message = "Required"),
        length(min = 1, message = "Message cannot be empty")
    )]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeliveryResponseDto {
    pub message: String,
}
