use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::core::error::{AppError, Result};
use crate::features::prompts::dtos::{PromptListItemDto, PromptPageDto};
use crate::features::prompts::models::{Prompt, PromptRow};
use crate::features::prompts::services::repository::PromptRepository;
use crate::modules::github::GitHubError;
use crate::shared::constants::PUBLIC_PROMPT_STATUS;
use crate::shared::types::{PageWindow, PaginationQuery};

/// One read of a prompt source: the requested items plus the size of the
/// whole collection
#[derive(Debug)]
pub struct CatalogPage {
    pub items: Vec<PromptListItemDto>,
    pub total: i64,
}

/// Where published prompts are listed from
#[async_trait]
pub trait PromptCatalog: Send + Sync {
    /// Prompts newest first; `None` returns everything
    async fn fetch(&self, window: Option<PageWindow>) -> Result<CatalogPage>;
}

/// Lists the prompt files on the main branch
pub struct GitHubCatalog {
    repository: PromptRepository,
    expose_error_details: bool,
}

impl GitHubCatalog {
    pub fn new(repository: PromptRepository, expose_error_details: bool) -> Self {
        Self {
            repository,
            expose_error_details,
        }
    }
}

#[async_trait]
impl PromptCatalog for GitHubCatalog {
    async fn fetch(&self, window: Option<PageWindow>) -> Result<CatalogPage> {
        let upstream = |e: GitHubError| {
            tracing::error!("Failed to read prompts from GitHub: {}", e);
            AppError::Upstream {
                message: "Failed to load prompts".to_string(),
                details: if self.expose_error_details {
                    vec![e.to_string()]
                } else {
                    Vec::new()
                },
            }
        };

        let snapshot = self.repository.snapshot().await.map_err(upstream)?;
        let documents = self.repository.read_all(&snapshot).await.map_err(upstream)?;

        let mut items: Vec<PromptListItemDto> = documents
            .into_iter()
            .map(|doc| PromptListItemDto {
                prompt: doc.prompt,
                revision: Some(doc.revision),
            })
            .collect();
        // Undated prompts sort last; ties fall back to path order from the tree
        items.sort_by(|a, b| b.prompt.created_at.cmp(&a.prompt.created_at));

        let total = items.len() as i64;
        let items = match window {
            Some(window) => window.slice(items),
            None => items,
        };

        tracing::debug!("Listed {} of {} prompts from GitHub", items.len(), total);
        Ok(CatalogPage { items, total })
    }
}

/// Lists active prompts mirrored into Postgres
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_PROMPTS: &str = r#"
    SELECT id, title, version, category, description, content, prompt_variants, tags,
           compatible_models, variables, status, is_local, is_favorite, metadata, rating,
           extra, created_at, updated_at
    FROM prompts
    WHERE status = $1
    ORDER BY created_at DESC
"#;

#[async_trait]
impl PromptCatalog for PostgresCatalog {
    async fn fetch(&self, window: Option<PageWindow>) -> Result<CatalogPage> {
        let rows: Vec<PromptRow> = match window {
            Some(window) => {
                let sql = format!("{} OFFSET $2 LIMIT $3", SELECT_PROMPTS);
                sqlx::query_as(&sql)
                    .bind(PUBLIC_PROMPT_STATUS)
                    .bind(window.offset)
                    .bind(window.limit)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query_as(SELECT_PROMPTS)
                    .bind(PUBLIC_PROMPT_STATUS)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| {
            tracing::error!("Failed to list prompts: {:?}", e);
            AppError::Database(e)
        })?;

        let total = match window {
            Some(_) => {
                let (count,): (i64,) =
                    sqlx::query_as("SELECT COUNT(*) FROM prompts WHERE status = $1")
                        .bind(PUBLIC_PROMPT_STATUS)
                        .fetch_one(&self.pool)
                        .await
                        .map_err(|e| {
                            tracing::error!("Failed to count prompts: {:?}", e);
                            AppError::Database(e)
                        })?;
                count
            }
            None => rows.len() as i64,
        };

        let items = rows
            .into_iter()
            .map(|row| PromptListItemDto {
                prompt: Prompt::from(row),
                revision: None,
            })
            .collect();

        Ok(CatalogPage { items, total })
    }
}

/// Body of the listing endpoint: a bare array unless pagination was requested
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum PromptListing {
    All(Vec<PromptListItemDto>),
    Page(PromptPageDto),
}

pub struct CatalogService {
    catalog: Arc<dyn PromptCatalog>,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn PromptCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn list(&self, query: &PaginationQuery) -> Result<PromptListing> {
        let window = query
            .window()
            .map_err(|message| AppError::Validation(vec![message]))?;
        let page = self.catalog.fetch(window).await?;

        Ok(match window {
            None => PromptListing::All(page.items),
            Some(window) => {
                let has_next_page = window.has_next_page(page.items.len(), page.total);
                PromptListing::Page(PromptPageDto {
                    prompts: page.items,
                    has_next_page,
                })
            }
        })
    }
}
