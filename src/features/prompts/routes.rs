use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::prompts::{
    handlers,
    services::{CatalogService, SubmissionService, SyncService},
};

/// Read-only prompt routes, open to everyone
pub fn public_routes(service: Arc<CatalogService>) -> Router {
    Router::new()
        .route("/api/get-prompts", get(handlers::get_prompts))
        .with_state(service)
}

/// Prompt submission, placed behind the access gate by the caller
pub fn submission_routes(service: Arc<SubmissionService>) -> Router {
    Router::new()
        .route("/api/create-prompt-issue", post(handlers::create_prompt_issue))
        .with_state(service)
}

/// Repository-to-database sync, placed behind the API key check by the caller
pub fn sync_routes(service: Arc<SyncService>) -> Router {
    Router::new()
        .route("/api/sync-prompts", post(handlers::sync_prompts))
        .with_state(service)
}
