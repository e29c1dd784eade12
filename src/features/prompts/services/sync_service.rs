use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::prompts::dtos::{PromptSubmission, SyncResponseDto};
use crate::features::prompts::models::Prompt;
use crate::features::prompts::services::repository::{PromptRepository, RawDocument};
use crate::modules::github::GitHubError;
use crate::shared::constants::{DEFAULT_PROMPT_STATUS, SYNC_STATUSES};

/// Prompt files read for a sync, split into rows to write and skipped paths
#[derive(Debug, Default)]
pub struct SyncBatch {
    pub prompts: Vec<Prompt>,
    pub skipped: Vec<String>,
}

/// Mirrors the prompt files on the main branch into the `prompts` table
pub struct SyncService {
    repository: PromptRepository,
    pool: Option<PgPool>,
    expose_error_details: bool,
}

impl SyncService {
    pub fn new(repository: PromptRepository, pool: Option<PgPool>, expose_error_details: bool) -> Self {
        Self {
            repository,
            pool,
            expose_error_details,
        }
    }

    pub async fn sync(&self) -> Result<SyncResponseDto> {
        let pool = self.pool.as_ref().ok_or_else(|| {
            AppError::Configuration("Database is not configured".to_string())
        })?;

        let batch = self.collect().await?;

        let mut tx = pool.begin().await?;
        for prompt in &batch.prompts {
            upsert(&mut tx, prompt).await?;
        }
        tx.commit().await?;

        let synced = batch.prompts.len();
        let skipped = batch.skipped.len();
        tracing::info!("Synced {} prompts, skipped {}", synced, skipped);
        Ok(SyncResponseDto {
            message: format!("Synced {} prompts, skipped {}", synced, skipped),
            synced,
            skipped,
        })
    }

    /// Reads every prompt file on main and checks it against the submission
    /// schema. Invalid files are skipped; a failed GitHub read fails the batch.
    pub async fn collect(&self) -> Result<SyncBatch> {
        let upstream = |e: GitHubError| AppError::Upstream {
            message: "Failed to read prompts from GitHub".to_string(),
            details: if self.expose_error_details {
                vec![e.to_string()]
            } else {
                Vec::new()
            },
        };
        let snapshot = self.repository.snapshot().await.map_err(upstream)?;
        let documents = self
            .repository
            .read_all_raw(&snapshot)
            .await
            .map_err(upstream)?;

        let mut batch = SyncBatch::default();
        for document in documents {
            match prepare(&document) {
                Ok(prompt) => batch.prompts.push(prompt),
                Err(reason) => {
                    tracing::warn!("Skipping {}: {}", document.path, reason);
                    batch.skipped.push(document.path);
                }
            }
        }

        tracing::debug!(
            "Read {} prompt files from {}",
            batch.prompts.len() + batch.skipped.len(),
            snapshot.commit_sha
        );
        Ok(batch)
    }
}

fn timestamp(object: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    object
        .get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// Decodes one stored file through the submission schema. Older files may
/// lack the status and the boolean flags, which get their defaults first.
fn prepare(document: &RawDocument) -> std::result::Result<Prompt, String> {
    let mut value: Value =
        serde_json::from_slice(&document.bytes).map_err(|e| format!("invalid JSON: {}", e))?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| "not a JSON object".to_string())?;

    let blank_status = match object.get("status") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    };
    if blank_status {
        object.insert("status".into(), Value::from(DEFAULT_PROMPT_STATUS));
    }
    match object.get("status").and_then(Value::as_str) {
        Some(status) if SYNC_STATUSES.contains(&status) => {}
        other => {
            return Err(format!(
                "status '{}' is not allowed",
                other.unwrap_or("<not a string>")
            ))
        }
    }

    for flag in ["is_local", "is_favorite"] {
        object.entry(flag).or_insert(Value::Bool(false));
    }

    let created_at = timestamp(object, "created_at");
    let updated_at = timestamp(object, "updated_at");

    let submission: PromptSubmission =
        serde_json::from_value(value).map_err(|e| format!("invalid prompt: {}", e))?;
    let draft = submission.into_draft().map_err(|errors| errors.join("; "))?;

    let mut prompt = draft.prompt;
    prompt.created_at = created_at;
    prompt.updated_at = updated_at;
    Ok(prompt)
}

async fn upsert(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, prompt: &Prompt) -> Result<()> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO prompts (
            id, title, version, category, description, content, prompt_variants, tags,
            compatible_models, variables, status, is_local, is_favorite, metadata, rating,
            extra, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        ON CONFLICT (id) DO UPDATE SET
            title = EXCLUDED.title,
            version = EXCLUDED.version,
            category = EXCLUDED.category,
            description = EXCLUDED.description,
            content = EXCLUDED.content,
            prompt_variants = EXCLUDED.prompt_variants,
            tags = EXCLUDED.tags,
            compatible_models = EXCLUDED.compatible_models,
            variables = EXCLUDED.variables,
            status = EXCLUDED.status,
            is_local = EXCLUDED.is_local,
            is_favorite = EXCLUDED.is_favorite,
            metadata = EXCLUDED.metadata,
            rating = EXCLUDED.rating,
            extra = EXCLUDED.extra,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(prompt.id)
    .bind(&prompt.title)
    .bind(&prompt.version)
    .bind(&prompt.category)
    .bind(&prompt.description)
    .bind(Json(&prompt.content))
    .bind(Json(&prompt.prompt_variants))
    .bind(&prompt.tags)
    .bind(&prompt.compatible_models)
    .bind(Json(&prompt.variables))
    .bind(&prompt.status)
    .bind(prompt.is_local)
    .bind(prompt.is_favorite)
    .bind(&prompt.metadata)
    .bind(&prompt.rating)
    .bind(Json(&prompt.extra))
    .bind(prompt.created_at.unwrap_or(now))
    .bind(prompt.updated_at.unwrap_or(now))
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to upsert prompt {}: {:?}", prompt.id, e);
        AppError::Database(e)
    })?;

    Ok(())
}
