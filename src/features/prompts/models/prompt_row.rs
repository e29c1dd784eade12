use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::features::prompts::models::{LocalizedContent, Prompt, PromptVariable, PromptVariant};

/// Database model for a mirrored prompt
#[derive(Debug, Clone, FromRow)]
pub struct PromptRow {
    pub id: Uuid,
    pub title: String,
    pub version: String,
    pub category: String,
    pub description: Option<String>,
    pub content: Json<LocalizedContent>,
    pub prompt_variants: Json<Vec<PromptVariant>>,
    pub tags: Vec<String>,
    pub compatible_models: Vec<String>,
    pub variables: Json<Vec<PromptVariable>>,
    pub status: String,
    pub is_local: bool,
    pub is_favorite: bool,
    pub metadata: Option<Value>,
    pub rating: Option<Value>,
    pub extra: Json<std::collections::BTreeMap<String, Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PromptRow> for Prompt {
    fn from(row: PromptRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            version: row.version,
            category: row.category,
            description: row.description,
            content: row.content.0,
            prompt_variants: row.prompt_variants.0,
            tags: row.tags,
            compatible_models: row.compatible_models,
            variables: row.variables.0,
            status: row.status,
            is_local: row.is_local,
            is_favorite: row.is_favorite,
            metadata: row.metadata,
            rating: row.rating,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
            extra: row.extra.0,
        }
    }
}
