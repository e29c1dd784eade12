//! GitHub access for the prompt repository.
//!
//! [`GitHost`] is the seam the prompt services depend on. It exposes the git
//! data primitives (refs, commits, trees, blobs) and pull requests. The
//! production implementation is [`GitHubClient`]; tests use
//! [`memory::InMemoryGitHost`].

pub mod client;
#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use client::GitHubClient;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected GitHub payload: {0}")]
    Decode(String),

    #[error("GitHub truncated the listing of tree {0}")]
    TruncatedTree(String),
}

impl GitHubError {
    pub fn status(&self) -> Option<u16> {
        match self {
            GitHubError::Status { status, .. } => Some(*status),
            GitHubError::Http(e) => e.status().map(|s| s.as_u16()),
            GitHubError::Decode(_) | GitHubError::TruncatedTree(_) => None,
        }
    }
}

/// A file (blob) in a recursive tree listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub sha: String,
}

/// One change applied on top of a base tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeChange {
    Upsert { path: String, content: String },
    Delete { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
}

#[derive(Debug, Clone)]
pub struct NewPullRequest {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

#[async_trait]
pub trait GitHost: Send + Sync {
    /// Commit sha the branch points at, `None` when the branch does not exist
    async fn branch_head(&self, branch: &str) -> Result<Option<String>, GitHubError>;

    /// Root tree sha of a commit
    async fn commit_tree(&self, commit_sha: &str) -> Result<String, GitHubError>;

    /// Every blob reachable from the tree, with full paths
    async fn list_tree(&self, tree_sha: &str) -> Result<Vec<TreeEntry>, GitHubError>;

    async fn read_blob(&self, blob_sha: &str) -> Result<Vec<u8>, GitHubError>;

    /// Creates a tree from `base_tree` with `changes` applied and returns its sha
    async fn create_tree(
        &self,
        base_tree: &str,
        changes: &[TreeChange],
    ) -> Result<String, GitHubError>;

    async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parent_sha: &str,
    ) -> Result<String, GitHubError>;

    async fn create_branch(&self, branch: &str, commit_sha: &str) -> Result<(), GitHubError>;

    async fn delete_branch(&self, branch: &str) -> Result<(), GitHubError>;

    /// Open pull request whose head is `branch`, if any
    async fn find_open_pull(&self, branch: &str) -> Result<Option<PullRequest>, GitHubError>;

    async fn open_pull(&self, request: &NewPullRequest) -> Result<PullRequest, GitHubError>;
}
