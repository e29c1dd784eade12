use axum::{extract::DefaultBodyLimit, middleware::from_fn, middleware::from_fn_with_state, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::core::config::{AppConfig, PublicConfig, SwaggerConfig};
use crate::core::middleware::{self, AccessPolicy};
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::features::notifications::{routes as notifications_routes, NotificationService};
use crate::features::prompts::{
    routes as prompts_routes, CatalogService, SubmissionService, SyncService,
};
use crate::features::settings::routes as settings_routes;

/// Services behind the HTTP surface, built once at startup
pub struct AppServices {
    pub submission: Arc<SubmissionService>,
    pub catalog: Arc<CatalogService>,
    pub sync: Arc<SyncService>,
    pub notifications: Arc<NotificationService>,
    pub public_config: Arc<PublicConfig>,
}

async fn health_check() -> axum::http::StatusCode {
    axum::http::StatusCode::OK
}

fn swagger_routes(config: &SwaggerConfig) -> Router {
    let swagger_modifier = SwaggerInfoModifier {
        title: config.title.clone(),
        version: config.version.clone(),
        description: config.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger =
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi));

    if let Some(credentials) = config.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        swagger.layer(from_fn(middleware::basic_auth_middleware(Arc::new(
            credentials,
        ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        swagger
    }
}

/// The complete application: API routes, gates, fallbacks, and the shared
/// tower layers
pub fn build_router(services: AppServices, app: &AppConfig, swagger: &SwaggerConfig) -> Router {
    let policy = Arc::new(AccessPolicy::new(
        app.cors_allowed_origins.clone(),
        app.api_secret_key.clone(),
    ));

    // Browser-facing mutations (allow-listed origin or API key)
    let gated_routes = Router::new()
        .merge(prompts_routes::submission_routes(services.submission))
        .merge(notifications_routes::routes(services.notifications))
        .route_layer(from_fn_with_state(policy.clone(), middleware::access_guard));

    // Operator routes (API key only)
    let operator_routes = Router::new()
        .merge(prompts_routes::sync_routes(services.sync))
        .route_layer(from_fn_with_state(policy, middleware::require_api_key));

    let public_routes = Router::new()
        .merge(prompts_routes::public_routes(services.catalog))
        .merge(settings_routes::routes(services.public_config))
        .route("/health", axum::routing::get(health_check));

    Router::new()
        .merge(swagger_routes(swagger))
        .merge(gated_routes)
        .merge(operator_routes)
        .merge(public_routes)
        .method_not_allowed_fallback(middleware::method_not_allowed)
        .fallback(middleware::not_found)
        .layer(DefaultBodyLimit::max(app.max_request_body_size))
        .layer(middleware::cors_layer(app.cors_allowed_origins.clone()))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
}
