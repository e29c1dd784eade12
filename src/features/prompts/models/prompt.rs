use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::shared::constants::{DEFAULT_PROMPT_STATUS, PROMPTS_ROOT};
use crate::shared::types::LooseId;

/// Language code -> text, e.g. `{"ru": "...", "en": "..."}`
pub type LocalizedContent = BTreeMap<String, String>;

/// Prompt document as stored at `prompts/<category>/<id>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Prompt {
    #[serde(alias = "uuid")]
    pub id: Uuid,
    pub title: String,
    pub version: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub content: LocalizedContent,
    #[serde(default)]
    pub prompt_variants: Vec<PromptVariant>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub compatible_models: Vec<String>,
    #[serde(default)]
    pub variables: Vec<PromptVariable>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields this service does not know about, kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_status() -> String {
    DEFAULT_PROMPT_STATUS.to_string()
}

impl Prompt {
    pub fn storage_path(category: &str, id: &Uuid) -> String {
        format!("{}/{}/{}.json", PROMPTS_ROOT, category, id)
    }

    pub fn path(&self) -> String {
        Self::storage_path(&self.category, &self.id)
    }

    /// Pretty-printed file body with a trailing newline
    pub fn to_file_content(&self) -> serde_json::Result<String> {
        let mut body = serde_json::to_string_pretty(self)?;
        body.push('\n');
        Ok(body)
    }
}

/// Content override selected by a discriminator such as the target model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct PromptVariant {
    #[validate(nested)]
    pub variant_id: VariantId,
    #[serde(default)]
    pub content: LocalizedContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct VariantId {
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "Variant type cannot be empty"))]
    pub kind: String,
    #[validate(custom(function = "validate_variant_key"))]
    pub id: LooseId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn validate_variant_key(id: &LooseId) -> Result<(), ValidationError> {
    if id.is_blank() {
        return Err(ValidationError::new("length").with_message("Variant id cannot be empty".into()));
    }
    Ok(())
}

/// Placeholder the prompt text can reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct PromptVariable {
    #[validate(length(min = 1, message = "Variable name cannot be empty"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_value: String,
}
