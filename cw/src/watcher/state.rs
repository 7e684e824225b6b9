//! Poll state and per-cycle outcomes

use crate::github::{CommitId, RemoteError};

/// What the watcher remembers between polls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollState {
    last_seen: Option<CommitId>,
}

impl PollState {
    pub fn new(last_seen: Option<CommitId>) -> Self {
        Self { last_seen }
    }

    pub fn last_seen(&self) -> Option<&CommitId> {
        self.last_seen.as_ref()
    }

    pub fn record(&mut self, commit: CommitId) {
        self.last_seen = Some(commit);
    }

    /// True when `commit` differs from the last seen one
    pub fn is_new(&self, commit: &CommitId) -> bool {
        self.last_seen.as_ref() != Some(commit)
    }
}

/// Result of one polling cycle
#[derive(Debug)]
pub enum PollOutcome {
    /// Nothing was seen before; this commit is now the baseline
    Baseline(CommitId),

    /// Latest commit equals the last seen one
    Unchanged(CommitId),

    /// A new commit was announced
    NewCommit {
        commit: CommitId,
        previous: CommitId,
        /// Files listed in the announcement after registry filtering
        reported: usize,
        /// Set when the compare request failed, so no files could be listed
        diff_error: Option<RemoteError>,
    },

    /// Fetching the latest commit failed; state is untouched
    Failed(RemoteError),
}

impl PollOutcome {
    pub fn is_new_commit(&self) -> bool {
        matches!(self, PollOutcome::NewCommit { .. })
    }

    /// Error from whichever request failed this cycle
    pub fn error(&self) -> Option<&RemoteError> {
        match self {
            PollOutcome::Failed(e) => Some(e),
            PollOutcome::NewCommit { diff_error, .. } => diff_error.as_ref(),
            _ => None,
        }
    }
}
