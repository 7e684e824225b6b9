//! Commit watcher implementation

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::config::WatcherConfig;
use super::state::{PollOutcome, PollState};
use crate::github::{CommitId, RemoteError, RepoApi, RepositoryRef};
use crate::registry::FileRegistry;
use crate::report::{Announcement, PollStage, Reporter};

/// The CommitWatcher polls a repository for new commits and announces the
/// tracked files each one touched
pub struct CommitWatcher {
    config: WatcherConfig,
    repo: RepositoryRef,
    web_url: String,
    api: Arc<dyn RepoApi>,
    registry: Option<FileRegistry>,
    reporter: Arc<dyn Reporter>,
    state: PollState,
}

impl CommitWatcher {
    /// Create a new CommitWatcher with no registry and no baseline
    pub fn new(
        config: WatcherConfig,
        repo: RepositoryRef,
        api: Arc<dyn RepoApi>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            config,
            repo,
            web_url: "https://github.com".to_string(),
            api,
            registry: None,
            reporter,
            state: PollState::default(),
        }
    }

    /// Registry used to filter changed files; `None` reports no files
    pub fn with_registry(mut self, registry: Option<FileRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Base URL for commit links
    pub fn with_web_url(mut self, web_url: impl Into<String>) -> Self {
        self.web_url = web_url.into();
        self
    }

    /// Establish the baseline commit before polling starts
    pub async fn seed(&mut self) -> Result<CommitId, RemoteError> {
        debug!(repo = %self.repo, "seed: called");
        match self.api.fetch_latest_commit(&self.repo).await {
            Ok(sha) => {
                info!(repo = %self.repo, sha = %sha.short(), "Baseline commit");
                self.state.record(sha.clone());
                Ok(sha)
            }
            Err(e) => {
                self.log_failure(PollStage::LatestCommit, &e);
                self.reporter.poll_failed(PollStage::LatestCommit, &e);
                Err(e)
            }
        }
    }

    /// Run one polling cycle
    async fn check_for_updates(&mut self) -> PollOutcome {
        let current = match self.api.fetch_latest_commit(&self.repo).await {
            Ok(sha) => sha,
            Err(e) => {
                self.log_failure(PollStage::LatestCommit, &e);
                self.reporter.poll_failed(PollStage::LatestCommit, &e);
                return PollOutcome::Failed(e);
            }
        };

        // No baseline yet (seed failed or was skipped): adopt without announcing
        let Some(previous) = self.state.last_seen().cloned() else {
            debug!(sha = %current.short(), "Adopting baseline commit");
            self.state.record(current.clone());
            return PollOutcome::Baseline(current);
        };

        if !self.state.is_new(&current) {
            debug!(sha = %current.short(), "No new commit");
            return PollOutcome::Unchanged(current);
        }

        info!(
            repo = %self.repo,
            old_sha = %previous.short(),
            new_sha = %current.short(),
            "New commit detected"
        );

        let (changed, diff_error) = match self.api.fetch_changed_paths(&self.repo, &previous, &current).await {
            Ok(files) => (files, None),
            Err(e) => {
                self.log_failure(PollStage::ChangedFiles, &e);
                self.reporter.poll_failed(PollStage::ChangedFiles, &e);
                (Vec::new(), Some(e))
            }
        };
        let changed_count = changed.len();

        let announcement = Announcement::new(&self.repo, &current, changed, self.registry.as_ref(), &self.web_url);
        debug!(
            changed = changed_count,
            reported = announcement.files.len(),
            "Filtered changed files through registry"
        );
        self.reporter.announce(&announcement);

        self.state.record(current.clone());
        PollOutcome::NewCommit {
            commit: current,
            previous,
            reported: announcement.files.len(),
            diff_error,
        }
    }

    fn log_failure(&self, stage: PollStage, err: &RemoteError) {
        if err.is_auth_failure() {
            error!(
                repo = %self.repo,
                stage = stage.describe(),
                error = %err,
                "Credential rejected; check the token environment variable"
            );
        } else if let Some(wait) = err.retry_after() {
            warn!(repo = %self.repo, stage = stage.describe(), wait_secs = wait.as_secs(), "Rate limited");
        } else {
            warn!(repo = %self.repo, stage = stage.describe(), error = %err, "Poll request failed");
        }
    }

    /// How long to sleep after `outcome`
    pub fn next_delay(&self, outcome: &PollOutcome) -> Duration {
        let interval = self.config.poll_interval();
        if !self.config.honor_rate_limit {
            return interval;
        }

        match outcome.error().and_then(RemoteError::retry_after) {
            Some(wait) if wait > interval => wait,
            _ => interval,
        }
    }

    /// Run the watcher loop
    ///
    /// This runs until a shutdown message arrives or the sender is dropped.
    /// Returns the final poll state.
    pub async fn run(mut self, mut shutdown_rx: mpsc::Receiver<()>) -> PollState {
        info!(
            repo = %self.repo,
            interval_secs = self.config.poll_interval_secs,
            tracked_files = self.registry.as_ref().map(FileRegistry::len),
            "CommitWatcher started"
        );

        loop {
            let outcome = self.check_for_updates().await;
            let delay = self.next_delay(&outcome);

            // Sleep until next poll
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown_rx.recv() => {
                    info!(repo = %self.repo, "CommitWatcher stopping");
                    break;
                }
            }
        }

        self.state
    }

    /// Run a single check (useful for testing)
    pub async fn check_once(&mut self) -> PollOutcome {
        self.check_for_updates().await
    }

    /// Get the last seen commit
    pub fn last_seen(&self) -> Option<&CommitId> {
        self.state.last_seen()
    }

    /// Set the last seen commit (for testing or recovery)
    pub fn set_last_seen(&mut self, sha: Option<CommitId>) {
        self.state = PollState::new(sha);
    }
}
