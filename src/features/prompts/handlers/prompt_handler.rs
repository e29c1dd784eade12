use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::core::error::Result;
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::prompts::dtos::{PromptSubmission, SubmissionResponseDto, SyncResponseDto};
use crate::features::prompts::services::{
    CatalogService, PromptListing, SubmissionService, SyncService,
};
use crate::shared::constants::PROMPTS_CACHE_CONTROL;
use crate::shared::types::PaginationQuery;

/// Submit a new or edited prompt
///
/// Writes the prompt file on a new branch of the prompt repository and opens a
/// pull request for review. Resubmitting identical content returns the pull
/// request that is already open.
#[utoipa::path(
    post,
    path = "/api/create-prompt-issue",
    request_body = PromptSubmission,
    responses(
        (status = 201, description = "Pull request opened", body = SubmissionResponseDto),
        (status = 400, description = "Invalid prompt"),
        (status = 401, description = "Origin not allowed and no valid API key"),
        (status = 409, description = "Prompt already exists or changed since it was loaded"),
        (status = 500, description = "GitHub request failed")
    ),
    tag = "prompts",
    security(
        (),
        ("api_key" = [])
    )
)]
pub async fn create_prompt_issue(
    State(service): State<Arc<SubmissionService>>,
    AppJson(submission): AppJson<PromptSubmission>,
) -> Result<(StatusCode, Json<SubmissionResponseDto>)> {
    let response = service.submit(submission).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// List published prompts
///
/// Returns a plain array when neither `page` nor `limit` is given, otherwise
/// `{prompts, hasNextPage}`.
#[utoipa::path(
    get,
    path = "/api/get-prompts",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Prompts, newest first", body = PromptListing),
        (status = 400, description = "Invalid page or limit"),
        (status = 500, description = "Prompt source unavailable")
    ),
    tag = "prompts"
)]
pub async fn get_prompts(
    State(service): State<Arc<CatalogService>>,
    AppQuery(query): AppQuery<PaginationQuery>,
) -> Result<impl IntoResponse> {
    let listing = service.list(&query).await?;
    Ok((
        [(header::CACHE_CONTROL, PROMPTS_CACHE_CONTROL)],
        Json(listing),
    ))
}

/// Mirror the prompt repository into the database
#[utoipa::path(
    post,
    path = "/api/sync-prompts",
    responses(
        (status = 200, description = "Prompts synced", body = SyncResponseDto),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, description = "Sync failed")
    ),
    tag = "prompts",
    security(
        ("api_key" = [])
    )
)]
pub async fn sync_prompts(
    State(service): State<Arc<SyncService>>,
) -> Result<Json<SyncResponseDto>> {
    let response = service.sync().await?;
    Ok(Json(response))
}
