use axum::{extract::State, http::header, response::IntoResponse, Json};
use std::sync::Arc;

use crate::core::config::PublicConfig;
use crate::features::settings::dtos::PublicConfigDto;
use crate::shared::constants::CONFIG_CACHE_CONTROL;

/// Public client configuration
#[utoipa::path(
    get,
    path = "/api/config",
    responses(
        (status = 200, description = "Client configuration", body = PublicConfigDto)
    ),
    tag = "settings"
)]
pub async fn get_config(State(config): State<Arc<PublicConfig>>) -> impl IntoResponse {
    tracing::info!(
        "Serving client config (public key set: {}, constructor enabled: {})",
        config.public_key.is_some(),
        config.constructor_enabled
    );

    (
        [(header::CACHE_CONTROL, CONFIG_CACHE_CONTROL)],
        Json(PublicConfigDto::from(config.as_ref())),
    )
}
