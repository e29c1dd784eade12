use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::{IntoParams, ToSchema};

use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            errors,
        }
    }
}

/// Identifier that clients send either as a string or as a number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum LooseId {
    Number(i64),
    Text(String),
}

impl LooseId {
    pub fn is_blank(&self) -> bool {
        matches!(self, LooseId::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for LooseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LooseId::Number(n) => write!(f, "{}", n),
            LooseId::Text(s) => f.write_str(s),
        }
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Optional `page`/`limit` query parameters. When both are absent the caller
/// gets the unpaginated form of the endpoint.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PaginationQuery {
    /// Page number (1-indexed, default: 1)
    #[param(minimum = 1)]
    pub page: Option<i64>,

    /// Number of items per page (default: 10, max: 100)
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
}

impl PaginationQuery {
    /// Resolves the window, or a `page: ...` message when the offset would
    /// not fit in an `i64`
    pub fn window(&self) -> Result<Option<PageWindow>, String> {
        if self.page.is_none() && self.limit.is_none() {
            return Ok(None);
        }

        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let page = self.page.unwrap_or(1).max(1);
        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| "page: Page number is out of range".to_string())?;

        Ok(Some(PageWindow { offset, limit }))
    }
}

/// A resolved `(offset, limit)` slice of an ordered collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: i64,
    pub limit: i64,
}

impl PageWindow {
    pub fn has_next_page(&self, returned: usize, total: i64) -> bool {
        self.offset.saturating_add(returned as i64) < total
    }

    /// Applies the window to an in-memory list that is already ordered
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}
