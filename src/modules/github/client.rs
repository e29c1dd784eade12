use async_trait::async_trait;
use base64::prelude::*;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::core::config::GitHubConfig;
use crate::modules::github::{
    GitHost, GitHubError, NewPullRequest, PullRequest, TreeChange, TreeEntry,
};

const API_VERSION: &str = "2022-11-28";
const FILE_MODE: &str = "100644";

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
    tree: ShaOnly,
}

#[derive(Debug, Deserialize)]
struct ShaOnly {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    sha: String,
}

/// File entries of a recursive listing. A truncated listing is an error since
/// callers rely on seeing every file.
fn blob_entries(tree_sha: &str, tree: TreeResponse) -> Result<Vec<TreeEntry>, GitHubError> {
    if tree.truncated {
        tracing::error!("GitHub truncated the recursive listing of tree {}", tree_sha);
        return Err(GitHubError::TruncatedTree(tree_sha.to_string()));
    }

    Ok(tree
        .tree
        .into_iter()
        .filter(|item| item.kind == "blob")
        .map(|item| TreeEntry {
            path: item.path,
            sha: item.sha,
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct BlobResponse {
    content: String,
    encoding: String,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    number: u64,
    html_url: String,
}

impl From<PullResponse> for PullRequest {
    fn from(p: PullResponse) -> Self {
        Self {
            number: p.number,
            html_url: p.html_url,
        }
    }
}

/// Client for the GitHub REST API, scoped to one repository
pub struct GitHubClient {
    http_client: reqwest::Client,
    api_base_url: String,
    owner: String,
    repo: String,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        let auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|e| GitHubError::Decode(format!("Invalid GITHUB_TOKEN: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent("prompt-hub/0.1 (prompt submissions)")
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http_client,
            api_base_url: config.api_base_url.clone(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base_url, self.owner, self.repo, path
        )
    }

    /// Branch names may contain `/`; each segment is encoded on its own
    fn encode_ref(branch: &str) -> String {
        branch
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GitHubError> {
        self.send_optional(request).await?.ok_or(GitHubError::Status {
            status: StatusCode::NOT_FOUND.as_u16(),
            message: "Not Found".to_string(),
        })
    }

    /// Like `send`, but a 404 is an expected "does not exist" answer
    async fn send_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, GitHubError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or(body);
            tracing::error!("GitHub API error: HTTP {} - {}", status, message);
            return Err(GitHubError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let value = response
            .json::<T>()
            .await
            .map_err(|e| GitHubError::Decode(e.to_string()))?;
        Ok(Some(value))
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), GitHubError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!("GitHub API error: HTTP {} - {}", status, message);
            return Err(GitHubError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl GitHost for GitHubClient {
    async fn branch_head(&self, branch: &str) -> Result<Option<String>, GitHubError> {
        let url = self.repo_url(&format!("git/ref/heads/{}", Self::encode_ref(branch)));
        tracing::debug!("Reading branch head: {}", url);

        let reference: Option<RefResponse> =
            self.send_optional(self.http_client.get(&url)).await?;
        Ok(reference.map(|r| r.object.sha))
    }

    async fn commit_tree(&self, commit_sha: &str) -> Result<String, GitHubError> {
        let url = self.repo_url(&format!("git/commits/{}", commit_sha));
        let commit: CommitResponse = self.send(self.http_client.get(&url)).await?;
        Ok(commit.tree.sha)
    }

    async fn list_tree(&self, tree_sha: &str) -> Result<Vec<TreeEntry>, GitHubError> {
        let url = self.repo_url(&format!("git/trees/{}", tree_sha));
        let tree: TreeResponse = self
            .send(self.http_client.get(&url).query(&[("recursive", "1")]))
            .await?;

        blob_entries(tree_sha, tree)
    }

    async fn read_blob(&self, blob_sha: &str) -> Result<Vec<u8>, GitHubError> {
        let url = self.repo_url(&format!("git/blobs/{}", blob_sha));
        let blob: BlobResponse = self.send(self.http_client.get(&url)).await?;

        match blob.encoding.as_str() {
            "base64" => {
                let compact: String = blob.content.split_whitespace().collect();
                BASE64_STANDARD
                    .decode(compact)
                    .map_err(|e| GitHubError::Decode(format!("Invalid blob encoding: {}", e)))
            }
            "utf-8" => Ok(blob.content.into_bytes()),
            other => Err(GitHubError::Decode(format!(
                "Unsupported blob encoding: {}",
                other
            ))),
        }
    }

    async fn create_tree(
        &self,
        base_tree: &str,
        changes: &[TreeChange],
    ) -> Result<String, GitHubError> {
        let entries: Vec<serde_json::Value> = changes
            .iter()
            .map(|change| match change {
                TreeChange::Upsert { path, content } => json!({
                    "path": path,
                    "mode": FILE_MODE,
                    "type": "blob",
                    "content": content,
                }),
                TreeChange::Delete { path } => json!({
                    "path": path,
                    "mode": FILE_MODE,
                    "type": "blob",
                    "sha": null,
                }),
            })
            .collect();

        let url = self.repo_url("git/trees");
        let tree: ShaOnly = self
            .send(
                self.http_client
                    .post(&url)
                    .json(&json!({ "base_tree": base_tree, "tree": entries })),
            )
            .await?;
        Ok(tree.sha)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree_sha: &str,
        parent_sha: &str,
    ) -> Result<String, GitHubError> {
        let url = self.repo_url("git/commits");
        let commit: CommitResponse = self
            .send(self.http_client.post(&url).json(&json!({
                "message": message,
                "tree": tree_sha,
                "parents": [parent_sha],
            })))
            .await?;
        Ok(commit.sha)
    }

    async fn create_branch(&self, branch: &str, commit_sha: &str) -> Result<(), GitHubError> {
        let url = self.repo_url("git/refs");
        self.send_empty(self.http_client.post(&url).json(&json!({
            "ref": format!("refs/heads/{}", branch),
            "sha": commit_sha,
        })))
        .await
    }

    async fn delete_branch(&self, branch: &str) -> Result<(), GitHubError> {
        let url = self.repo_url(&format!("git/refs/heads/{}", Self::encode_ref(branch)));
        self.send_empty(self.http_client.delete(&url)).await
    }

    async fn find_open_pull(&self, branch: &str) -> Result<Option<PullRequest>, GitHubError> {
        let url = self.repo_url("pulls");
        let head = format!("{}:{}", self.owner, branch);
        let pulls: Vec<PullResponse> = self
            .send(
                self.http_client
                    .get(&url)
                    .query(&[("state", "open"), ("head", head.as_str())]),
            )
            .await?;
        Ok(pulls.into_iter().next().map(PullRequest::from))
    }

    async fn open_pull(&self, request: &NewPullRequest) -> Result<PullRequest, GitHubError> {
        let url = self.repo_url("pulls");
        let pull: PullResponse = self
            .send(self.http_client.post(&url).json(&json!({
                "title": request.title,
                "body": request.body,
                "head": request.head,
                "base": request.base,
            })))
            .await?;

        tracing::info!("Opened pull request #{}: {}", pull.number, pull.html_url);
        Ok(pull.into())
    }
}
