//! commitwatch - GitHub commit poller
//!
//! Polls a repository's latest commit on a fixed interval. When it moves, the
//! files touched since the previous commit are looked up, filtered against a
//! registry of file basenames captured at startup, and printed together with a
//! link to the commit.
//!
//! # Modules
//!
//! - [`github`] - RepoApi trait and the GitHub REST client
//! - [`registry`] - File basename registry and its CSV store
//! - [`report`] - Console notifications
//! - [`watcher`] - Polling loop and poll state
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod github;
pub mod registry;
pub mod report;
pub mod watcher;

// Re-export commonly used types
pub use config::{Config, GitHubConfig, RegistryConfig};
pub use github::{CommitId, GitHubClient, RemoteError, RepoApi, RepositoryRef, TreeEntry, TreeEntryKind};
pub use registry::{FileRegistry, RegistryLoad, basename};
pub use report::{Announcement, ConsoleReporter, PollStage, RecordingReporter, Reporter};
pub use watcher::{CommitWatcher, PollOutcome, PollState, WatcherConfig};
