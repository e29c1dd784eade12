use futures::future::try_join_all;
use std::sync::Arc;
use uuid::Uuid;

use crate::features::prompts::models::Prompt;
use crate::modules::github::{GitHost, GitHubError, TreeEntry};
use crate::shared::constants::PROMPTS_ROOT;

/// Main-branch state a workflow starts from
#[derive(Debug, Clone)]
pub struct RepositorySnapshot {
    pub commit_sha: String,
    pub tree_sha: String,
    pub entries: Vec<TreeEntry>,
}

/// Location of a prompt file that already exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPrompt {
    pub path: String,
    pub category: String,
    /// Blob sha of the file
    pub revision: String,
}

/// Undecoded contents of a prompt file
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub path: String,
    pub bytes: Vec<u8>,
}

/// A prompt read back from the repository
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub prompt: Prompt,
    pub revision: String,
}

/// Prompt files in the repository, read through a [`GitHost`]
pub struct PromptRepository {
    host: Arc<dyn GitHost>,
    branch: String,
}

impl PromptRepository {
    pub fn new(host: Arc<dyn GitHost>, branch: impl Into<String>) -> Self {
        Self {
            host,
            branch: branch.into(),
        }
    }

    pub fn host(&self) -> &Arc<dyn GitHost> {
        &self.host
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Head commit of the main branch
    pub async fn head(&self) -> Result<String, GitHubError> {
        self.host
            .branch_head(&self.branch)
            .await?
            .ok_or_else(|| GitHubError::Status {
                status: 404,
                message: format!("Branch '{}' does not exist", self.branch),
            })
    }

    /// Recursive listing of the tree behind `commit_sha`
    pub async fn snapshot_at(&self, commit_sha: String) -> Result<RepositorySnapshot, GitHubError> {
        let tree_sha = self.host.commit_tree(&commit_sha).await?;
        let entries = self.host.list_tree(&tree_sha).await?;

        Ok(RepositorySnapshot {
            commit_sha,
            tree_sha,
            entries,
        })
    }

    pub async fn snapshot(&self) -> Result<RepositorySnapshot, GitHubError> {
        let head = self.head().await?;
        self.snapshot_at(head).await
    }

    /// Existence check for a prompt id. The hinted category is tried first,
    /// then every category directory.
    pub fn locate(
        snapshot: &RepositorySnapshot,
        id: &Uuid,
        category_hint: Option<&str>,
    ) -> Option<StoredPrompt> {
        let suffix = format!("/{}.json", id);

        if let Some(category) = category_hint {
            let hinted = Prompt::storage_path(category, id);
            if let Some(entry) = snapshot.entries.iter().find(|e| e.path == hinted) {
                return Some(StoredPrompt {
                    path: entry.path.clone(),
                    category: category.to_string(),
                    revision: entry.sha.clone(),
                });
            }
        }

        Self::prompt_entries(snapshot)
            .into_iter()
            .find(|(_, entry)| entry.path.ends_with(&suffix))
            .map(|(category, entry)| StoredPrompt {
                path: entry.path.clone(),
                category: category.to_string(),
                revision: entry.sha.clone(),
            })
    }

    /// Files shaped like `prompts/<category>/<name>.json`, skipping hidden
    /// category directories
    pub fn prompt_entries(snapshot: &RepositorySnapshot) -> Vec<(&str, &TreeEntry)> {
        snapshot
            .entries
            .iter()
            .filter_map(|entry| {
                let mut parts = entry.path.split('/');
                let (root, category, file) = (parts.next()?, parts.next()?, parts.next()?);
                if parts.next().is_some()
                    || root != PROMPTS_ROOT
                    || category.starts_with('.')
                    || !file.ends_with(".json")
                {
                    return None;
                }
                Some((category, entry))
            })
            .collect()
    }

    pub async fn read_prompt(&self, entry: &TreeEntry) -> Result<Prompt, GitHubError> {
        let bytes = self.host.read_blob(&entry.sha).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| GitHubError::Decode(format!("{} is not a valid prompt: {}", entry.path, e)))
    }

    /// Reads every prompt file concurrently. One failed read fails the batch.
    pub async fn read_all(
        &self,
        snapshot: &RepositorySnapshot,
    ) -> Result<Vec<StoredDocument>, GitHubError> {
        let reads = Self::prompt_entries(snapshot)
            .into_iter()
            .map(|(_, entry)| async move {
                let prompt = self.read_prompt(entry).await?;
                Ok::<_, GitHubError>(StoredDocument {
                    prompt,
                    revision: entry.sha.clone(),
                })
            });

        try_join_all(reads).await
    }

    /// Reads every prompt file concurrently without decoding it. Only
    /// transport failures are errors.
    pub async fn read_all_raw(
        &self,
        snapshot: &RepositorySnapshot,
    ) -> Result<Vec<RawDocument>, GitHubError> {
        let reads = Self::prompt_entries(snapshot)
            .into_iter()
            .map(|(_, entry)| async move {
                let bytes = self.host.read_blob(&entry.sha).await?;
                Ok::<_, GitHubError>(RawDocument {
                    path: entry.path.clone(),
                    bytes,
                })
            });

        try_join_all(reads).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, sha: &str) -> TreeEntry {
        TreeEntry {
            path: path.to_string(),
            sha: sha.to_string(),
        }
    }

    fn snapshot(entries: Vec<TreeEntry>) -> RepositorySnapshot {
        RepositorySnapshot {
            commit_sha: "c1".into(),
            tree_sha: "t1".into(),
            entries,
        }
    }

    const ID: &str = "6f1c1e0a-3b1d-4f8e-9a43-1c2d3e4f5a6b";

    #[test]
    fn test_prompt_entries_filters_layout() {
        let snap = snapshot(vec![
            entry("README.md", "a"),
            entry("prompts/coding/x.json", "b"),
            entry("prompts/.drafts/y.json", "c"),
            entry("prompts/coding/nested/z.json", "d"),
            entry("prompts/coding/notes.txt", "e"),
            entry("prompts/top.json", "f"),
        ]);

        let found: Vec<_> = PromptRepository::prompt_entries(&snap)
            .into_iter()
            .map(|(category, e)| (category.to_string(), e.path.clone()))
            .collect();
        assert_eq!(
            found,
            vec![("coding".to_string(), "prompts/coding/x.json".to_string())]
        );
    }

    #[test]
    fn test_locate_prefers_hint_and_falls_back_to_scan() {
        let id = Uuid::parse_str(ID).unwrap();
        let snap = snapshot(vec![entry(&format!("prompts/writing/{}.json", ID), "blob1")]);

        let hinted = PromptRepository::locate(&snap, &id, Some("writing")).unwrap();
        assert_eq!(hinted.category, "writing");
        assert_eq!(hinted.revision, "blob1");

        let scanned = PromptRepository::locate(&snap, &id, Some("coding")).unwrap();
        assert_eq!(scanned.path, format!("prompts/writing/{}.json", ID));

        let other = Uuid::new_v4();
        assert_eq!(PromptRepository::locate(&snap, &other, None), None);
    }
}
