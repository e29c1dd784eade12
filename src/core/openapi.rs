use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::notifications::{dtos as notifications_dtos, handlers as notifications_handlers};
use crate::features::prompts::{
    dtos as prompts_dtos, handlers as prompts_handlers, models as prompts_models,
    services::PromptListing,
};
use crate::features::settings::{dtos as settings_dtos, handlers as settings_handlers};
use crate::shared::types::LooseId;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Prompts
        prompts_handlers::create_prompt_issue,
        prompts_handlers::get_prompts,
        prompts_handlers::sync_prompts,
        // Notifications
        notifications_handlers::send_feedback,
        notifications_handlers::send_notice,
        // Settings
        settings_handlers::get_config,
    ),
    components(
        schemas(
            // Shared
            LooseId,
            // Prompts
            prompts_models::Prompt,
            prompts_models::PromptVariant,
            prompts_models::VariantId,
            prompts_models::PromptVariable,
            prompts_dtos::PromptSubmission,
            prompts_dtos::SubmissionResponseDto,
            prompts_dtos::PromptListItemDto,
            prompts_dtos::PromptPageDto,
            prompts_dtos::SyncResponseDto,
            PromptListing,
            // Notifications
            notifications_dtos::AppInfoDto,
            notifications_dtos::FeedbackDto,
            notifications_dtos::NoticeDto,
            notifications_dtos::DeliveryResponseDto,
            // Settings
            settings_dtos::PublicConfigDto,
        )
    ),
    tags(
        (name = "prompts", description = "Prompt submission, listing and sync"),
        (name = "notifications", description = "Feedback and notices relayed to Telegram"),
        (name = "settings", description = "Client configuration (public)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Prompt Hub API",
        version = "0.1.0",
        description = "API documentation for Prompt Hub",
    )
)]
pub struct ApiDoc;

/// Adds the `X-API-Key` security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_endpoint() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/create-prompt-issue",
            "/api/get-prompts",
            "/api/sync-prompts",
            "/api/feedback",
            "/api/notice",
            "/api/config",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }

        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("api_key"));
    }
}
