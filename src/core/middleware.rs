use crate::core::error::AppError;
use crate::shared::constants::API_KEY_HEADER;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

/// CORS for the browser front-end: only listed origins, GET/POST/OPTIONS, and
/// the headers the constructor sends
pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)]);

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Who may call the mutating endpoints
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    pub allowed_origins: Vec<String>,
    pub api_secret_key: Option<String>,
}

impl AccessPolicy {
    pub fn new(allowed_origins: Vec<String>, api_secret_key: Option<String>) -> Self {
        Self {
            allowed_origins,
            api_secret_key,
        }
    }

    fn has_valid_key(&self, request: &Request) -> bool {
        let provided = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());

        matches!(
            (self.api_secret_key.as_deref(), provided),
            (Some(expected), Some(provided)) if expected == provided
        )
    }

    fn has_allowed_origin(&self, origin: Option<&str>) -> bool {
        origin.is_some_and(|origin| self.allowed_origins.iter().any(|o| o == origin))
    }
}

fn is_read_only(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Gate for browser-facing mutations: an allow-listed `Origin` or the shared
/// API key. Read-only methods always pass.
pub async fn access_guard(
    State(policy): State<Arc<AccessPolicy>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_read_only(req.method()) {
        return Ok(next.run(req).await);
    }

    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok());

    if policy.has_allowed_origin(origin) || policy.has_valid_key(&req) {
        return Ok(next.run(req).await);
    }

    tracing::warn!(
        "Unauthorized access attempt from origin: {}",
        origin.unwrap_or("<none>")
    );
    Err(AppError::Unauthorized("Unauthorized".to_string()))
}

/// Gate for operator endpoints: the shared API key only
pub async fn require_api_key(
    State(policy): State<Arc<AccessPolicy>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if policy.has_valid_key(&req) {
        return Ok(next.run(req).await);
    }

    tracing::warn!("Rejected {} {} without a valid API key", req.method(), req.uri().path());
    Err(AppError::Unauthorized("Unauthorized".to_string()))
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

pub async fn not_found(req: Request) -> AppError {
    AppError::NotFound(format!("No route for {}", req.uri().path()))
}

pub fn basic_auth_middleware(
    valid_credentials: Arc<String>,
) -> impl Fn(
    Request,
    Next,
)
    -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, Response>> + Send>>
       + Clone {
    move |req: Request, next: Next| {
        let credentials = valid_credentials.clone();
        Box::pin(async move {
            let authorized = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|header| header.to_str().ok())
                .and_then(|header| header.strip_prefix("Basic "))
                .and_then(|encoded| BASE64_STANDARD.decode(encoded).ok())
                .and_then(|decoded| String::from_utf8(decoded).ok())
                .is_some_and(|creds| creds == *credentials);

            if authorized {
                return Ok(next.run(req).await);
            }

            let mut response = Response::new(Body::from("Unauthorized"));
            *response.status_mut() = StatusCode::UNAUTHORIZED;
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"Swagger UI\""),
            );

            Err(response)
        })
    }
}
