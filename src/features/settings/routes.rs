use axum::{routing::get, Router};
use std::sync::Arc;

use crate::core::config::PublicConfig;
use crate::features::settings::handlers;

pub fn routes(config: Arc<PublicConfig>) -> Router {
    Router::new()
        .route("/api/config", get(handlers::get_config))
        .with_state(config)
}
