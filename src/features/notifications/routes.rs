use axum::{routing::post, Router};
use std::sync::Arc;

use crate::features::notifications::{handlers, services::NotificationService};

/// Telegram relay routes, placed behind the access gate by the caller
pub fn routes(service: Arc<NotificationService>) -> Router {
    Router::new()
        .route("/api/feedback", post(handlers::send_feedback))
        .route("/api/notice", post(handlers::send_notice))
        .with_state(service)
}
