//! In-memory [`GitHost`] used by service and handler tests.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::modules::github::{
    GitHost, GitHubError, NewPullRequest, PullRequest, TreeChange, TreeEntry,
};

#[derive(Debug, Clone)]
pub struct RecordedPull {
    pub pull: PullRequest,
    pub request: NewPullRequest,
}

#[derive(Default)]
struct State {
    branches: HashMap<String, String>,
    /// commit sha -> tree sha
    commits: HashMap<String, String>,
    /// tree sha -> path -> blob sha
    trees: HashMap<String, BTreeMap<String, String>>,
    blobs: HashMap<String, Vec<u8>>,
    pulls: Vec<RecordedPull>,
    deleted_branches: Vec<String>,
    next_id: u64,
    fail_on: Option<&'static str>,
}

impl State {
    fn next_sha(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{:04}", prefix, self.next_id)
    }

    fn store_blob(&mut self, content: &[u8]) -> String {
        let sha = hex::encode(Sha256::digest(content));
        self.blobs.insert(sha.clone(), content.to_vec());
        sha
    }

    fn check(&self, operation: &'static str) -> Result<(), GitHubError> {
        if self.fail_on == Some(operation) {
            return Err(GitHubError::Status {
                status: 502,
                message: format!("injected failure in {}", operation),
            });
        }
        Ok(())
    }

    fn commit_files(&mut self, parent: Option<&str>, files: &[(&str, &str)]) -> String {
        let mut tree = parent
            .and_then(|p| self.commits.get(p))
            .and_then(|t| self.trees.get(t))
            .cloned()
            .unwrap_or_default();
        for (path, content) in files {
            let sha = self.store_blob(content.as_bytes());
            tree.insert(path.to_string(), sha);
        }
        let tree_sha = self.next_sha("tree");
        self.trees.insert(tree_sha.clone(), tree);
        let commit_sha = self.next_sha("commit");
        self.commits.insert(commit_sha.clone(), tree_sha);
        commit_sha
    }
}

pub struct InMemoryGitHost {
    owner: String,
    repo: String,
    main_branch: String,
    state: Mutex<State>,
}

impl InMemoryGitHost {
    pub fn new(owner: &str, repo: &str, main_branch: &str) -> Self {
        let mut state = State::default();
        let root = state.commit_files(None, &[]);
        state.branches.insert(main_branch.to_string(), root);

        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            main_branch: main_branch.to_string(),
            state: Mutex::new(state),
        }
    }

    /// Commits files directly onto the main branch
    pub fn seed(&self, files: &[(&str, &str)]) {
        let mut state = self.state.lock().unwrap();
        let head = state.branches.get(&self.main_branch).cloned();
        let commit = state.commit_files(head.as_deref(), files);
        state.branches.insert(self.main_branch.clone(), commit);
    }

    /// Makes every call of the named operation fail with a 502
    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().unwrap().fail_on = Some(operation);
    }

    pub fn file_on_branch(&self, branch: &str, path: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        let commit = state.branches.get(branch)?;
        let tree = state.trees.get(state.commits.get(commit)?)?;
        let blob = state.blobs.get(tree.get(path)?)?;
        Some(String::from_utf8_lossy(blob).into_owned())
    }

    pub fn blob_sha_on_main(&self, path: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        let commit = state.branches.get(&self.main_branch)?;
        let tree = state.trees.get(state.commits.get(commit)?)?;
        tree.get(path).cloned()
    }

    pub fn branches(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().unwrap().branches.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn deleted_branches(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted_branches.clone()
    }

    pub fn pulls(&self) -> Vec<RecordedPull> {
        self.state.lock().unwrap().pulls.clone()
    }
}

#[async_trait]
impl GitHost for InMemoryGitHost {
    async fn branch_head(&self, branch: &str) -> Result<Option<String>, GitHubError> {
        let state = self.state.lock().unwrap();
        state.check("branch_head")?;
        Ok(state.branches.get(branch).cloned())
    }

    async fn commit_tree(&self, commit_sha: &str) -> Result<String, GitHubError> {
        let state = self.state.lock().unwrap();
        state.check("commit_tree")?;
        state.commits.get(commit_sha).cloned().ok_or(GitHubError::Status {
            status: 404,
            message: "Not Found".to_string(),
        })
    }

    async fn list_tree(&self, tree_sha: &str) -> Result<Vec<TreeEntry>, GitHubError> {
        let state = self.state.lock().unwrap();
        state.check("list_tree")?;
        let tree = state.trees.get(tree_sha).ok_or(GitHubError::Status {
            status: 404,
            message: "Not Found".to_string(),
        })?;
        Ok(tree
            .iter()
            .map(|(path, sha)| TreeEntry {
                path: path.clone(),
                sha: sha.clone(),
            })
            .collect())
    }

    async fn read_blob(&self, blob_sha: &str) -> Result<Vec<u8>, GitHubError> {
        let state = self.state.lock().unwrap();
        state.check("read_blob")?;
        state.blobs.get(blob_sha).cloned().ok_or(GitHubError::Status {
            status: 404,
            message: "Not Found".to_string(),
        })
    }

    async fn create_tree(
        &self,
        base_tree: &str,
        changes: &[TreeChange],
    ) -> Result<String, GitHubError> {
        let mut state = self.state.lock().unwrap();
        state.check("create_tree")?;
        let mut tree = state.trees.get(base_tree).cloned().unwrap_or_default();
        for change in changes {
            match change {
                TreeChange::Upsert { path, content } => {
                    let sha = state.store_blob(content.as_bytes());
                    tree.insert(path.clone(), sha);
                }
                TreeChange::Delete { path } => {
                    tree.remove(path);
                }
            }
        }
        let sha = state.next_sha("tree");
        state.trees.insert(sha.clone(), tree);
        Ok(sha)
    }

    async fn create_commit(
        &self,
        _message: &str,
        tree_sha: &str,
        _parent_sha: &str,
    ) -> Result<String, GitHubError> {
        let mut state = self.state.lock().unwrap();
        state.check("create_commit")?;
        let sha = state.next_sha("commit");
        state.commits.insert(sha.clone(), tree_sha.to_string());
        Ok(sha)
    }

    async fn create_branch(&self, branch: &str, commit_sha: &str) -> Result<(), GitHubError> {
        let mut state = self.state.lock().unwrap();
        state.check("create_branch")?;
        if state.branches.contains_key(branch) {
            return Err(GitHubError::Status {
                status: 422,
                message: "Reference already exists".to_string(),
            });
        }
        state
            .branches
            .insert(branch.to_string(), commit_sha.to_string());
        Ok(())
    }

    async fn delete_branch(&self, branch: &str) -> Result<(), GitHubError> {
        let mut state = self.state.lock().unwrap();
        state.check("delete_branch")?;
        state.branches.remove(branch);
        state.deleted_branches.push(branch.to_string());
        Ok(())
    }

    async fn find_open_pull(&self, branch: &str) -> Result<Option<PullRequest>, GitHubError> {
        let state = self.state.lock().unwrap();
        state.check("find_open_pull")?;
        Ok(state
            .pulls
            .iter()
            .find(|p| p.request.head == branch)
            .map(|p| p.pull.clone()))
    }

    async fn open_pull(&self, request: &NewPullRequest) -> Result<PullRequest, GitHubError> {
        let mut state = self.state.lock().unwrap();
        state.check("open_pull")?;
        let number = state.pulls.len() as u64 + 1;
        let pull = PullRequest {
            number,
            html_url: format!(
                "https://github.com/{}/{}/pull/{}",
                self.owner, self.repo, number
            ),
        };
        state.pulls.push(RecordedPull {
            pull: pull.clone(),
            request: request.clone(),
        });
        Ok(pull)
    }
}
