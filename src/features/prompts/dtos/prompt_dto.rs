use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::features::prompts::models::{LocalizedContent, Prompt, PromptVariable, PromptVariant};
use crate::shared::constants::PROMPT_SCHEMA_VERSION;
use crate::shared::validation::{field_errors, validate_uuid, CATEGORY_REGEX};

fn validate_schema_version(version: u32) -> Result<(), ValidationError> {
    if version != PROMPT_SCHEMA_VERSION {
        return Err(ValidationError::new("schema_version").with_message(
            format!(
                "Unsupported schema version {}, expected {}",
                version, PROMPT_SCHEMA_VERSION
            )
            .into(),
        ));
    }
    Ok(())
}

/// Prompt submission from the constructor form. Required fields are `Option`s
/// so that a missing field is reported with its path instead of failing the
/// whole body.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PromptSubmission {
    #[validate(custom(function = "validate_schema_version"))]
    pub schema_version: Option<u32>,

    /// Prompt identifier (UUID). The legacy name `uuid` is accepted too.
    #[serde(alias = "uuid")]
    #[validate(required(message = "Required"), custom(function = "validate_uuid"))]
    pub id: Option<String>,

    #[validate(
        required(message = "Required"),
        length(min = 1, message = "Title cannot be empty")
    )]
    pub title: Option<String>,

    #[validate(
        required(message = "Required"),
        length(min = 1, message = "Version cannot be empty")
    )]
    pub version: Option<String>,

    #[validate(
        required(message = "Required"),
        length(min = 1, message = "Category cannot be empty"),
        regex(
            path = *CATEGORY_REGEX,
            message = "Category may only contain letters, digits, '-' and '_'"
        )
    )]
    pub category: Option<String>,

    #[validate(
        required(message = "Required"),
        length(min = 1, message = "Status cannot be empty")
    )]
    pub status: Option<String>,

    #[validate(required(message = "Required"))]
    pub is_local: Option<bool>,

    #[validate(required(message = "Required"))]
    pub is_favorite: Option<bool>,

    pub description: Option<String>,

    #[serde(default)]
    pub content: LocalizedContent,

    #[serde(default)]
    #[validate(nested)]
    pub prompt_variants: Vec<PromptVariant>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub compatible_models: Vec<String>,

    #[serde(default)]
    #[validate(nested)]
    pub variables: Vec<PromptVariable>,

    pub metadata: Option<serde_json::Value>,

    pub rating: Option<serde_json::Value>,

    /// Category the prompt was loaded from when editing
    #[validate(regex(path = *CATEGORY_REGEX, message = "Invalid original category"))]
    pub original_category: Option<String>,

    /// Blob sha of the stored file the editor started from
    pub base_revision: Option<String>,

    /// Server-managed; accepted and ignored
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub created_at: Option<serde_json::Value>,

    /// Server-managed; accepted and ignored
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub updated_at: Option<serde_json::Value>,

    /// Unknown fields, stored unchanged
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A validated submission, ready for the repository workflow
#[derive(Debug, Clone, PartialEq)]
pub struct PromptDraft {
    /// Document to store, without timestamps
    pub prompt: Prompt,
    pub original_category: Option<String>,
    pub base_revision: Option<String>,
}

impl PromptSubmission {
    /// Validates against the shared schema and converts into a draft.
    /// Errors are `path: message` lines.
    pub fn into_draft(self) -> Result<PromptDraft, Vec<String>> {
        self.validate().map_err(|e| field_errors(&e))?;

        let missing = |field: &str| vec![format!("{}: Required", field)];
        let id = self.id.ok_or_else(|| missing("id"))?;
        let id = Uuid::parse_str(&id).map_err(|_| vec!["id: Invalid UUID format".to_string()])?;

        let prompt = Prompt {
            id,
            title: self.title.ok_or_else(|| missing("title"))?,
            version: self.version.ok_or_else(|| missing("version"))?,
            category: self.category.ok_or_else(|| missing("category"))?,
            description: self.description.filter(|d| !d.trim().is_empty()),
            content: self.content,
            prompt_variants: self.prompt_variants,
            tags: self.tags,
            compatible_models: self.compatible_models,
            variables: self.variables,
            status: self.status.ok_or_else(|| missing("status"))?,
            is_local: self.is_local.ok_or_else(|| missing("is_local"))?,
            is_favorite: self.is_favorite.ok_or_else(|| missing("is_favorite"))?,
            metadata: self.metadata,
            rating: self.rating,
            created_at: None,
            updated_at: None,
            extra: self.extra,
        };

        Ok(PromptDraft {
            prompt,
            original_category: self.original_category.filter(|c| !c.is_empty()),
            base_revision: self.base_revision.filter(|r| !r.is_empty()),
        })
    }
}

/// Response of a successful submission
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponseDto {
    pub message: String,
    pub pull_request_url: String,
    /// `create` or `update`
    pub operation: String,
    /// Repository path of the prompt file
    pub path: String,
}

/// Prompt as listed, with the blob sha of its file when read from GitHub
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromptListItemDto {
    #[serde(flatten)]
    pub prompt: Prompt,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

/// Paginated form of the listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromptPageDto {
    pub prompts: Vec<PromptListItemDto>,
    pub has_next_page: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SyncResponseDto {
    pub message: String,
    pub synced: usize,
    /// Files left out because they failed the prompt schema
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_body() -> serde_json::Value {
        json!({
            "uuid": "6f1c1e0a-3b1d-4f8e-9a43-1c2d3e4f5a6b",
            "title": "Code reviewer",
            "version": "1.0.0",
            "category": "coding",
            "status": "active",
            "is_local": false,
            "is_favorite": false,
            "description": "Reviews diffs",
            "content": {"ru": "Проверь", "en": "Review"},
            "prompt_variants": [
                {"variant_id": {"type": "model", "id": "gpt-4", "priority": 1}, "content": {"en": "Be strict"}}
            ],
            "variables": [{"name": "lang", "description": "Language", "default_value": "rust"}],
            "metadata": {"source": "WebApp"},
            "created_at": "2020-01-01T00:00:00Z",
            "source_url": "https://example.com"
        })
    }

    #[test]
    fn test_valid_submission_becomes_draft() {
        let submission: PromptSubmission = serde_json::from_value(valid_body()).unwrap();
        let draft = submission.into_draft().unwrap();

        assert_eq!(draft.prompt.title, "Code reviewer");
        assert_eq!(draft.prompt.category, "coding");
        assert_eq!(draft.prompt.created_at, None);
        assert_eq!(
            draft.prompt.extra.get("source_url"),
            Some(&json!("https://example.com"))
        );
        assert!(!draft.prompt.extra.contains_key("created_at"));
        assert_eq!(draft.original_category, None);
    }

    #[test]
    fn test_missing_required_fields_are_reported_by_path() {
        let mut body = valid_body();
        let map = body.as_object_mut().unwrap();
        map.remove("title");
        map.remove("is_favorite");

        let submission: PromptSubmission = serde_json::from_value(body).unwrap();
        let errors = submission.into_draft().unwrap_err();

        assert!(errors.iter().any(|e| e.starts_with("title:")));
        assert!(errors.iter().any(|e| e.starts_with("is_favorite:")));
    }

    #[test]
    fn test_invalid_nested_fields_are_reported_by_path() {
        let mut body = valid_body();
        body["variables"] = json!([{"name": ""}]);
        body["uuid"] = json!("nope");

        let submission: PromptSubmission = serde_json::from_value(body).unwrap();
        let errors = submission.into_draft().unwrap_err();

        assert!(errors.contains(&"variables.0.name: Variable name cannot be empty".to_string()));
        assert!(errors.contains(&"id: Invalid UUID format".to_string()));
    }

    #[test]
    fn test_category_must_be_path_safe() {
        let mut body = valid_body();
        body["category"] = json!("../secrets");

        let submission: PromptSubmission = serde_json::from_value(body).unwrap();
        let errors = submission.into_draft().unwrap_err();
        assert!(errors.iter().any(|e| e.starts_with("category:")));
    }

    #[test]
    fn test_unsupported_schema_version() {
        let mut body = valid_body();
        body["schema_version"] = json!(7);

        let submission: PromptSubmission = serde_json::from_value(body).unwrap();
        let errors = submission.into_draft().unwrap_err();
        assert!(errors.iter().any(|e| e.starts_with("schema_version:")));
    }
}
