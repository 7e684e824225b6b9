//! RepoApi trait definition

use async_trait::async_trait;
#[allow(unused_imports)]
use tracing::debug;

use super::{CommitId, RemoteError, RepositoryRef, TreeEntry};

/// Read-only view of a hosted repository
///
/// Each call is a single request; implementations never retry. Credentials,
/// base URLs and timeouts belong to the implementation, not the caller.
#[async_trait]
pub trait RepoApi: Send + Sync {
    /// Identifier of the newest commit on the repository's history
    async fn fetch_latest_commit(&self, repo: &RepositoryRef) -> Result<CommitId, RemoteError>;

    /// Paths touched between `base` (exclusive) and `head` (inclusive), in API order
    async fn fetch_changed_paths(
        &self,
        repo: &RepositoryRef,
        base: &CommitId,
        head: &CommitId,
    ) -> Result<Vec<String>, RemoteError>;

    /// Name of the repository's default branch
    async fn fetch_default_branch(&self, repo: &RepositoryRef) -> Result<String, RemoteError>;

    /// Full recursive tree listing of `branch`
    async fn fetch_tree(&self, repo: &RepositoryRef, branch: &str) -> Result<Vec<TreeEntry>, RemoteError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted RepoApi for unit tests
    ///
    /// Each `fetch_latest_commit` pops the next scripted result; once the script
    /// runs out the last commit is repeated. Diffs are keyed by `(base, head)`.
    #[derive(Default)]
    pub struct MockRepoApi {
        commits: Mutex<VecDeque<Result<CommitId, RemoteError>>>,
        last_commit: Mutex<Option<CommitId>>,
        diffs: Mutex<Vec<((CommitId, CommitId), Result<Vec<String>, RemoteError>)>>,
        tree: Mutex<Option<Result<Vec<TreeEntry>, RemoteError>>>,
        default_branch: Mutex<Option<String>>,
        commit_calls: AtomicUsize,
        diff_calls: AtomicUsize,
        tree_calls: AtomicUsize,
    }

    impl MockRepoApi {
        pub fn new() -> Self {
            debug!("MockRepoApi::new: called");
            Self::default()
        }

        pub fn push_commit(&self, sha: &str) -> &Self {
            self.commits.lock().unwrap().push_back(Ok(CommitId::from(sha)));
            self
        }

        pub fn push_commit_error(&self, err: RemoteError) -> &Self {
            self.commits.lock().unwrap().push_back(Err(err));
            self
        }

        pub fn set_diff(&self, base: &str, head: &str, files: &[&str]) -> &Self {
            let files = files.iter().map(|f| f.to_string()).collect();
            self.diffs
                .lock()
                .unwrap()
                .push(((CommitId::from(base), CommitId::from(head)), Ok(files)));
            self
        }

        pub fn set_diff_error(&self, base: &str, head: &str, err: RemoteError) -> &Self {
            self.diffs
                .lock()
                .unwrap()
                .push(((CommitId::from(base), CommitId::from(head)), Err(err)));
            self
        }

        pub fn set_tree(&self, entries: Vec<TreeEntry>) -> &Self {
            *self.tree.lock().unwrap() = Some(Ok(entries));
            self
        }

        pub fn set_tree_error(&self, err: RemoteError) -> &Self {
            *self.tree.lock().unwrap() = Some(Err(err));
            self
        }

        pub fn set_default_branch(&self, branch: &str) -> &Self {
            *self.default_branch.lock().unwrap() = Some(branch.to_string());
            self
        }

        pub fn commit_calls(&self) -> usize {
            self.commit_calls.load(Ordering::SeqCst)
        }

        pub fn diff_calls(&self) -> usize {
            self.diff_calls.load(Ordering::SeqCst)
        }

        pub fn tree_calls(&self) -> usize {
            self.tree_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RepoApi for MockRepoApi {
        async fn fetch_latest_commit(&self, _repo: &RepositoryRef) -> Result<CommitId, RemoteError> {
            debug!("MockRepoApi::fetch_latest_commit: called");
            self.commit_calls.fetch_add(1, Ordering::SeqCst);
            let next = self.commits.lock().unwrap().pop_front();
            match next {
                Some(Ok(sha)) => {
                    *self.last_commit.lock().unwrap() = Some(sha.clone());
                    Ok(sha)
                }
                Some(Err(e)) => Err(e),
                None => self
                    .last_commit
                    .lock()
                    .unwrap()
                    .clone()
                    .ok_or_else(|| RemoteError::InvalidResponse("No more mock commits".to_string())),
            }
        }

        async fn fetch_changed_paths(
            &self,
            _repo: &RepositoryRef,
            base: &CommitId,
            head: &CommitId,
        ) -> Result<Vec<String>, RemoteError> {
            debug!(%base, %head, "MockRepoApi::fetch_changed_paths: called");
            self.diff_calls.fetch_add(1, Ordering::SeqCst);
            let mut diffs = self.diffs.lock().unwrap();
            match diffs.iter().position(|((b, h), _)| b == base && h == head) {
                Some(idx) => diffs.remove(idx).1,
                None => Ok(Vec::new()),
            }
        }

        async fn fetch_default_branch(&self, _repo: &RepositoryRef) -> Result<String, RemoteError> {
            debug!("MockRepoApi::fetch_default_branch: called");
            self.default_branch
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| RemoteError::Status {
                    status: 404,
                    message: "Not Found".to_string(),
                })
        }

        async fn fetch_tree(&self, _repo: &RepositoryRef, branch: &str) -> Result<Vec<TreeEntry>, RemoteError> {
            debug!(%branch, "MockRepoApi::fetch_tree: called");
            self.tree_calls.fetch_add(1, Ordering::SeqCst);
            match self.tree.lock().unwrap().take() {
                Some(result) => result,
                None => Ok(Vec::new()),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_repeats_last_commit() {
            let api = MockRepoApi::new();
            api.push_commit("a").push_commit("b");
            let repo = RepositoryRef::new("o", "r");

            assert_eq!(api.fetch_latest_commit(&repo).await.unwrap(), CommitId::from("a"));
            assert_eq!(api.fetch_latest_commit(&repo).await.unwrap(), CommitId::from("b"));
            assert_eq!(api.fetch_latest_commit(&repo).await.unwrap(), CommitId::from("b"));
            assert_eq!(api.commit_calls(), 3);
        }

        #[tokio::test]
        async fn test_mock_errors_when_never_scripted() {
            let api = MockRepoApi::new();
            let result = api.fetch_latest_commit(&RepositoryRef::new("o", "r")).await;
            assert!(result.is_err());
        }
    }
}
