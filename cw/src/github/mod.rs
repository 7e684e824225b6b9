//! GitHub API access
//!
//! Provides the [`RepoApi`] seam the watcher polls through and the
//! reqwest-backed [`GitHubClient`] that implements it.

pub mod client;
mod error;
mod rest;
mod types;

pub use client::RepoApi;
pub use error::{DEFAULT_RATE_LIMIT_WAIT, RemoteError};
pub use rest::GitHubClient;
pub use types::{CommitId, RepositoryRef, TreeEntry, TreeEntryKind};
