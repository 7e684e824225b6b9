//! Watcher module for remote commit monitoring
//!
//! The CommitWatcher polls the repository's latest commit on a fixed
//! interval and, when it moves, announces the tracked files that changed.

mod commit_watcher;
mod config;
mod state;

pub use commit_watcher::CommitWatcher;
pub use config::WatcherConfig;
pub use state::{PollOutcome, PollState};
