//! File registry
//!
//! Snapshot of every file basename in the repository at startup. Changed
//! paths are reported only when their basename is known here.
//!
//! Matching is by basename alone, so `src/mod.rs` and `tests/mod.rs` are the
//! same entry.

pub mod resolve;
mod storage;

use std::collections::HashSet;

use tracing::{debug, info};

use crate::github::{RemoteError, RepoApi, RepositoryRef, TreeEntry, TreeEntryKind};

pub use resolve::RegistryLoad;

/// Final path component of a `/`-separated repository path
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Set of file basenames known to exist in the repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRegistry {
    basenames: HashSet<String>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a tree listing, keeping regular files only
    pub fn from_tree(entries: &[TreeEntry]) -> Self {
        debug!(entry_count = entries.len(), "from_tree: called");
        entries
            .iter()
            .filter(|e| e.kind == TreeEntryKind::Blob)
            .map(|e| basename(&e.path))
            .collect()
    }

    /// Fetch the recursive tree of `branch` and build the registry from it
    pub async fn build_from_tree(
        api: &dyn RepoApi,
        repo: &RepositoryRef,
        branch: &str,
    ) -> Result<Self, RemoteError> {
        debug!(%repo, %branch, "build_from_tree: called");
        let entries = api.fetch_tree(repo, branch).await?;
        let registry = Self::from_tree(&entries);
        info!(%repo, %branch, files = registry.len(), "Built file registry from tree listing");
        Ok(registry)
    }

    pub fn insert(&mut self, basename: impl Into<String>) -> bool {
        self.basenames.insert(basename.into())
    }

    pub fn contains(&self, basename: &str) -> bool {
        self.basenames.contains(basename)
    }

    /// Membership test for a full path, by its basename
    pub fn contains_path(&self, path: &str) -> bool {
        self.contains(basename(path))
    }

    pub fn len(&self) -> usize {
        self.basenames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.basenames.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.basenames.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for FileRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            basenames: iter.into_iter().map(Into::into).collect(),
        }
    }
}
