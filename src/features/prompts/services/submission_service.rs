use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

use crate::core::config::SubmissionMode;
use crate::core::error::AppError;
use crate::features::prompts::dtos::{PromptDraft, PromptSubmission, SubmissionResponseDto};
use crate::features::prompts::services::pull_request;
use crate::features::prompts::services::repository::PromptRepository;
use crate::modules::github::{GitHubError, NewPullRequest, PullRequest, TreeChange, TreeEntry};

/// Named steps of the submission workflow, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    ResolveBase,
    ReadTree,
    LocateExisting,
    ReadPrevious,
    CheckIdempotency,
    CreateTree,
    CreateCommit,
    CreateBranch,
    OpenPullRequest,
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionStage::ResolveBase => "resolve_base",
            SubmissionStage::ReadTree => "read_tree",
            SubmissionStage::LocateExisting => "locate_existing",
            SubmissionStage::ReadPrevious => "read_previous",
            SubmissionStage::CheckIdempotency => "check_idempotency",
            SubmissionStage::CreateTree => "create_tree",
            SubmissionStage::CreateCommit => "create_commit",
            SubmissionStage::CreateBranch => "create_branch",
            SubmissionStage::OpenPullRequest => "open_pull_request",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
        }
    }
}

/// Undo steps registered as the workflow creates remote state
#[derive(Debug, Clone, PartialEq, Eq)]
enum Compensation {
    DeleteBranch(String),
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("A prompt with this id already exists at {path}")]
    Duplicate { path: String },

    #[error("{path} changed since it was loaded (expected revision {expected}, found {actual})")]
    StaleRevision {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Failed to serialize prompt: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Submission failed at stage {stage}: {source}")]
    Upstream {
        stage: SubmissionStage,
        #[source]
        source: GitHubError,
        /// Outcome of each compensating action that ran
        compensations: Vec<String>,
    },
}

impl SubmissionError {
    fn at(stage: SubmissionStage) -> impl FnOnce(GitHubError) -> SubmissionError {
        move |source| SubmissionError::Upstream {
            stage,
            source,
            compensations: Vec::new(),
        }
    }

    pub fn into_app_error(self, expose_details: bool) -> AppError {
        match self {
            SubmissionError::Duplicate { .. } => {
                AppError::Conflict("A prompt with this UUID already exists.".to_string())
            }
            e @ SubmissionError::StaleRevision { .. } => AppError::Conflict(e.to_string()),
            SubmissionError::Encode(e) => AppError::Internal(e.to_string()),
            SubmissionError::Upstream {
                stage,
                source,
                compensations,
            } => {
                let details = if expose_details {
                    let mut details = vec![format!("stage: {}", stage), source.to_string()];
                    if let Some(status) = source.status() {
                        details.push(format!("upstream status: {}", status));
                    }
                    details.extend(compensations.into_iter().map(|c| format!("compensation: {}", c)));
                    details
                } else {
                    Vec::new()
                };
                AppError::Upstream {
                    message: "Internal Server Error. Please contact support.".to_string(),
                    details,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub operation: Operation,
    pub path: String,
    pub pull_request: PullRequest,
    /// The pull request already existed for this exact submission
    pub replayed: bool,
}

/// Turns prompt submissions into a branch + pull request on the prompt repository
pub struct SubmissionService {
    repository: PromptRepository,
    mode: SubmissionMode,
    expose_error_details: bool,
}

impl SubmissionService {
    pub fn new(repository: PromptRepository, mode: SubmissionMode, expose_error_details: bool) -> Self {
        Self {
            repository,
            mode,
            expose_error_details,
        }
    }

    /// Validates the submission and runs the workflow
    pub async fn submit(&self, submission: PromptSubmission) -> Result<SubmissionResponseDto, AppError> {
        let draft = submission.into_draft().map_err(AppError::Validation)?;

        let outcome = self
            .run(draft)
            .await
            .map_err(|e| e.into_app_error(self.expose_error_details))?;

        let message = if outcome.replayed {
            "Pull request for this submission is already open."
        } else {
            match outcome.operation {
                Operation::Create => "Prompt submitted for review.",
                Operation::Update => "Prompt update submitted for review.",
            }
        };

        Ok(SubmissionResponseDto {
            message: message.to_string(),
            pull_request_url: outcome.pull_request.html_url,
            operation: outcome.operation.as_str().to_string(),
            path: outcome.path,
        })
    }

    /// Idempotency key: same id, operation and content give the same branch
    fn branch_name(operation: Operation, draft: &PromptDraft) -> Result<String, SubmissionError> {
        let canonical = serde_json::to_vec(&draft.prompt)?;
        let mut hasher = Sha256::new();
        hasher.update(operation.as_str().as_bytes());
        hasher.update(&canonical);
        let digest = hex::encode(hasher.finalize());

        Ok(format!(
            "prompt/{}/{}-{}",
            operation.as_str(),
            draft.prompt.id,
            &digest[..12]
        ))
    }

    pub async fn run(&self, draft: PromptDraft) -> Result<SubmissionOutcome, SubmissionError> {
        let host = self.repository.host();
        let id = draft.prompt.id;

        tracing::debug!(prompt_id = %id, stage = %SubmissionStage::ResolveBase, "Submission stage");
        let base_commit = self
            .repository
            .head()
            .await
            .map_err(SubmissionError::at(SubmissionStage::ResolveBase))?;

        tracing::debug!(prompt_id = %id, stage = %SubmissionStage::ReadTree, "Submission stage");
        let snapshot = self
            .repository
            .snapshot_at(base_commit)
            .await
            .map_err(SubmissionError::at(SubmissionStage::ReadTree))?;

        tracing::debug!(prompt_id = %id, stage = %SubmissionStage::LocateExisting, "Submission stage");
        let existing = PromptRepository::locate(&snapshot, &id, draft.original_category.as_deref());

        if let Some(stored) = &existing {
            if self.mode == SubmissionMode::CreateOnly {
                tracing::info!("Rejecting duplicate prompt {} at {}", id, stored.path);
                return Err(SubmissionError::Duplicate {
                    path: stored.path.clone(),
                });
            }
            if let Some(expected) = &draft.base_revision {
                if expected != &stored.revision {
                    return Err(SubmissionError::StaleRevision {
                        path: stored.path.clone(),
                        expected: expected.clone(),
                        actual: stored.revision.clone(),
                    });
                }
            }
        }

        let operation = match &existing {
            Some(stored) => {
                tracing::info!("Editing prompt {} from category '{}'", id, stored.category);
                Operation::Update
            }
            None => Operation::Create,
        };

        let now = Utc::now();
        let created_at = match &existing {
            Some(stored) => {
                tracing::debug!(prompt_id = %id, stage = %SubmissionStage::ReadPrevious, "Submission stage");
                let previous = self
                    .repository
                    .read_prompt(&TreeEntry {
                        path: stored.path.clone(),
                        sha: stored.revision.clone(),
                    })
                    .await
                    .map_err(SubmissionError::at(SubmissionStage::ReadPrevious))?;
                previous.created_at.unwrap_or(now)
            }
            None => now,
        };

        let branch = Self::branch_name(operation, &draft)?;
        let path = draft.prompt.path();
        let previous_path = existing.as_ref().map(|s| s.path.clone());

        let mut prompt = draft.prompt;
        prompt.created_at = Some(created_at);
        prompt.updated_at = Some(now);

        let pull_request = NewPullRequest {
            title: pull_request::title(operation, &prompt),
            body: pull_request::body(operation, &prompt, &path, previous_path.as_deref()),
            head: branch.clone(),
            base: self.repository.branch().to_string(),
        };

        tracing::debug!(prompt_id = %id, stage = %SubmissionStage::CheckIdempotency, "Submission stage");
        let branch_exists = host
            .branch_head(&branch)
            .await
            .map_err(SubmissionError::at(SubmissionStage::CheckIdempotency))?
            .is_some();

        if branch_exists {
            let open = host
                .find_open_pull(&branch)
                .await
                .map_err(SubmissionError::at(SubmissionStage::CheckIdempotency))?;
            if let Some(existing_pull) = open {
                tracing::info!(
                    "Submission for prompt {} already has pull request {}",
                    id,
                    existing_pull.html_url
                );
                return Ok(SubmissionOutcome {
                    operation,
                    path,
                    pull_request: existing_pull,
                    replayed: true,
                });
            }

            tracing::info!("Branch {} exists without a pull request, reopening", branch);
            let pull = host
                .open_pull(&pull_request)
                .await
                .map_err(SubmissionError::at(SubmissionStage::OpenPullRequest))?;
            return Ok(SubmissionOutcome {
                operation,
                path,
                pull_request: pull,
                replayed: false,
            });
        }

        let content = prompt.to_file_content()?;

        let mut changes = vec![TreeChange::Upsert {
            path: path.clone(),
            content,
        }];
        if let Some(old) = previous_path.as_ref().filter(|old| **old != path) {
            changes.push(TreeChange::Delete { path: old.clone() });
        }

        tracing::debug!(prompt_id = %id, stage = %SubmissionStage::CreateTree, "Submission stage");
        let tree_sha = host
            .create_tree(&snapshot.tree_sha, &changes)
            .await
            .map_err(SubmissionError::at(SubmissionStage::CreateTree))?;

        tracing::debug!(prompt_id = %id, stage = %SubmissionStage::CreateCommit, "Submission stage");
        let commit_sha = host
            .create_commit(
                &pull_request::commit_message(operation, &prompt),
                &tree_sha,
                &snapshot.commit_sha,
            )
            .await
            .map_err(SubmissionError::at(SubmissionStage::CreateCommit))?;

        tracing::debug!(prompt_id = %id, stage = %SubmissionStage::CreateBranch, "Submission stage");
        host.create_branch(&branch, &commit_sha)
            .await
            .map_err(SubmissionError::at(SubmissionStage::CreateBranch))?;
        let mut compensations = vec![Compensation::DeleteBranch(branch.clone())];

        tracing::debug!(prompt_id = %id, stage = %SubmissionStage::OpenPullRequest, "Submission stage");
        match host.open_pull(&pull_request).await {
            Ok(pull) => {
                tracing::info!(
                    "Submitted prompt {} ({}) as {}",
                    id,
                    operation.as_str(),
                    pull.html_url
                );
                Ok(SubmissionOutcome {
                    operation,
                    path,
                    pull_request: pull,
                    replayed: false,
                })
            }
            Err(source) => {
                let report = self.compensate(&mut compensations).await;
                Err(SubmissionError::Upstream {
                    stage: SubmissionStage::OpenPullRequest,
                    source,
                    compensations: report,
                })
            }
        }
    }

    /// Runs registered compensations newest first; failures are reported, not raised
    async fn compensate(&self, compensations: &mut Vec<Compensation>) -> Vec<String> {
        let mut report = Vec::new();
        while let Some(step) = compensations.pop() {
            match step {
                Compensation::DeleteBranch(branch) => {
                    match self.repository.host().delete_branch(&branch).await {
                        Ok(()) => {
                            tracing::warn!("Deleted branch {} after failed submission", branch);
                            report.push(format!("deleted branch {}", branch));
                        }
                        Err(e) => {
                            tracing::error!("Failed to delete branch {}: {}", branch, e);
                            report.push(format!("failed to delete branch {}: {}", branch, e));
                        }
                    }
                }
            }
        }
        report
    }
}

impl fmt::Debug for SubmissionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionService")
            .field("branch", &self.repository.branch())
            .field("mode", &self.mode)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::github::memory::InMemoryGitHost;
    use crate::modules::github::GitHost;
    use serde_json::{json, Value};
    use std::sync::Arc;

    const ID: &str = "6f1c1e0a-3b1d-4f8e-9a43-1c2d3e4f5a6b";

    fn submission(overrides: Value) -> PromptSubmission {
        let mut body = json!({
            "id": ID,
            "title": "Code reviewer",
            "version": "1.0.0",
            "category": "coding",
            "status": "active",
            "is_local": false,
            "is_favorite": false,
            "content": {"en": "Review the diff"}
        });
        if let (Some(base), Some(extra)) = (body.as_object_mut(), overrides.as_object()) {
            for (key, value) in extra {
                base.insert(key.clone(), value.clone());
            }
        }
        serde_json::from_value(body).unwrap()
    }

    fn draft(overrides: Value) -> PromptDraft {
        submission(overrides).into_draft().unwrap()
    }

    fn service(host: &Arc<InMemoryGitHost>, mode: SubmissionMode) -> SubmissionService {
        let repository = PromptRepository::new(host.clone(), "main");
        SubmissionService::new(repository, mode, true)
    }

    fn host() -> Arc<InMemoryGitHost> {
        Arc::new(InMemoryGitHost::new("acme", "prompts", "main"))
    }

    fn stored(category: &str, created_at: &str) -> String {
        json!({
            "id": ID,
            "title": "Old title",
            "version": "0.9.0",
            "category": category,
            "status": "active",
            "content": {"en": "Old"},
            "created_at": created_at
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_create_opens_pull_request_with_new_file() {
        let host = host();
        let outcome = service(&host, SubmissionMode::CreateOrEdit)
            .run(draft(json!({})))
            .await
            .unwrap();

        assert_eq!(outcome.operation, Operation::Create);
        assert_eq!(outcome.path, format!("prompts/coding/{}.json", ID));
        assert!(outcome
            .pull_request
            .html_url
            .starts_with("https://github.com/acme/prompts/pull/"));
        assert!(!outcome.replayed);

        let pulls = host.pulls();
        assert_eq!(pulls.len(), 1);
        assert_eq!(pulls[0].request.base, "main");
        assert_eq!(pulls[0].request.title, "Add prompt: Code reviewer");
        assert!(pulls[0].request.head.starts_with(&format!("prompt/create/{}-", ID)));

        let written = host
            .file_on_branch(&pulls[0].request.head, &outcome.path)
            .unwrap();
        let written: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(written["title"], "Code reviewer");
        assert!(written["created_at"].is_string());
        assert_eq!(written["created_at"], written["updated_at"]);

        // main is untouched until the pull request is merged
        assert_eq!(host.blob_sha_on_main(&outcome.path), None);
    }

    #[tokio::test]
    async fn test_submit_renders_response() {
        let host = host();
        let response = service(&host, SubmissionMode::CreateOrEdit)
            .submit(submission(json!({})))
            .await
            .unwrap();

        assert_eq!(response.operation, "create");
        assert_eq!(response.path, format!("prompts/coding/{}.json", ID));
        assert_eq!(response.pull_request_url, "https://github.com/acme/prompts/pull/1");
    }

    #[tokio::test]
    async fn test_invalid_submission_never_reaches_github() {
        let host = host();
        let err = service(&host, SubmissionMode::CreateOrEdit)
            .submit(submission(json!({"title": ""})))
            .await
            .unwrap_err();

        match err {
            AppError::Validation(errors) => {
                assert!(errors.iter().any(|e| e.starts_with("title:")))
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(host.pulls().is_empty());
        assert_eq!(host.branches(), vec!["main".to_string()]);
    }

    #[tokio::test]
    async fn test_create_only_rejects_existing_id() {
        let host = host();
        let path = format!("prompts/coding/{}.json", ID);
        host.seed(&[(path.as_str(), stored("coding", "2024-01-01T00:00:00Z").as_str())]);

        let err = service(&host, SubmissionMode::CreateOnly)
            .run(draft(json!({})))
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::Duplicate { path: p } if p == path));
        assert!(host.pulls().is_empty());
        assert_eq!(host.branches(), vec!["main".to_string()]);
    }

    #[tokio::test]
    async fn test_edit_moves_category_and_keeps_created_at() {
        let host = host();
        let old_path = format!("prompts/writing/{}.json", ID);
        host.seed(&[(old_path.as_str(), stored("writing", "2024-01-01T00:00:00Z").as_str())]);

        let outcome = service(&host, SubmissionMode::CreateOrEdit)
            .run(draft(json!({"original_category": "writing"})))
            .await
            .unwrap();

        assert_eq!(outcome.operation, Operation::Update);
        let new_path = format!("prompts/coding/{}.json", ID);
        assert_eq!(outcome.path, new_path);

        let pull = &host.pulls()[0].request;
        assert!(pull.head.starts_with("prompt/update/"));
        assert!(pull.body.contains(&format!("**Moved from:** `{}`", old_path)));

        assert_eq!(host.file_on_branch(&pull.head, &old_path), None);
        let written: Value =
            serde_json::from_str(&host.file_on_branch(&pull.head, &new_path).unwrap()).unwrap();
        assert_eq!(written["created_at"], "2024-01-01T00:00:00Z");
        assert_ne!(written["updated_at"], written["created_at"]);
        assert_eq!(written["title"], "Code reviewer");
    }

    #[tokio::test]
    async fn test_stale_base_revision_is_a_conflict() {
        let host = host();
        let path = format!("prompts/coding/{}.json", ID);
        host.seed(&[(path.as_str(), stored("coding", "2024-01-01T00:00:00Z").as_str())]);
        let current = host.blob_sha_on_main(&path).unwrap();

        let svc = service(&host, SubmissionMode::CreateOrEdit);
        let err = svc
            .run(draft(json!({"base_revision": "0000stale"})))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::StaleRevision { ref actual, .. } if *actual == current));
        assert!(matches!(err.into_app_error(false), AppError::Conflict(_)));

        let outcome = svc
            .run(draft(json!({"base_revision": current})))
            .await
            .unwrap();
        assert_eq!(outcome.operation, Operation::Update);
    }

    #[tokio::test]
    async fn test_identical_resubmission_returns_open_pull_request() {
        let host = host();
        let svc = service(&host, SubmissionMode::CreateOrEdit);

        let first = svc.run(draft(json!({}))).await.unwrap();
        let second = svc.run(draft(json!({}))).await.unwrap();

        assert!(second.replayed);
        assert_eq!(first.pull_request, second.pull_request);
        assert_eq!(host.pulls().len(), 1);

        let changed = svc
            .run(draft(json!({"title": "Stricter reviewer"})))
            .await
            .unwrap();
        assert!(!changed.replayed);
        assert_eq!(host.pulls().len(), 2);
    }

    #[test]
    fn test_branch_name_depends_on_operation_and_content() {
        let a = SubmissionService::branch_name(Operation::Create, &draft(json!({}))).unwrap();
        let again = SubmissionService::branch_name(Operation::Create, &draft(json!({}))).unwrap();
        let update = SubmissionService::branch_name(Operation::Update, &draft(json!({}))).unwrap();
        let edited =
            SubmissionService::branch_name(Operation::Create, &draft(json!({"title": "Other"})))
                .unwrap();

        assert_eq!(a, again);
        assert!(a.starts_with(&format!("prompt/create/{}-", ID)));
        assert_eq!(a.len(), format!("prompt/create/{}-", ID).len() + 12);
        assert!(update.starts_with("prompt/update/"));
        assert_ne!(a, edited);
    }

    #[tokio::test]
    async fn test_orphaned_branch_gets_its_pull_request() {
        let host = host();
        let svc = service(&host, SubmissionMode::CreateOrEdit);
        let draft = draft(json!({}));

        let branch = SubmissionService::branch_name(Operation::Create, &draft).unwrap();
        let head = host.branch_head("main").await.unwrap().unwrap();
        host.create_branch(&branch, &head).await.unwrap();

        let outcome = svc.run(draft).await.unwrap();
        assert!(!outcome.replayed);
        assert_eq!(host.pulls().len(), 1);
        assert_eq!(host.pulls()[0].request.head, branch);
    }

    #[tokio::test]
    async fn test_failed_pull_request_deletes_branch() {
        let host = host();
        host.fail_on("open_pull");

        let err = service(&host, SubmissionMode::CreateOrEdit)
            .run(draft(json!({})))
            .await
            .unwrap_err();

        let deleted = host.deleted_branches();
        assert_eq!(deleted.len(), 1);
        assert!(deleted[0].starts_with("prompt/create/"));
        assert_eq!(host.branches(), vec!["main".to_string()]);

        match &err {
            SubmissionError::Upstream {
                stage,
                compensations,
                ..
            } => {
                assert_eq!(*stage, SubmissionStage::OpenPullRequest);
                assert_eq!(compensations.len(), 1);
                assert!(compensations[0].starts_with("deleted branch"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        match err.into_app_error(true) {
            AppError::Upstream { details, .. } => {
                assert!(details.contains(&"stage: open_pull_request".to_string()));
                assert!(details.contains(&"upstream status: 502".to_string()));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upstream_details_hidden_outside_development() {
        let host = host();
        host.fail_on("list_tree");

        let err = service(&host, SubmissionMode::CreateOrEdit)
            .run(draft(json!({})))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::Upstream { stage: SubmissionStage::ReadTree, .. }
        ));

        match err.into_app_error(false) {
            AppError::Upstream { details, .. } => assert!(details.is_empty()),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(host.branches().len() == 1);
    }
}
