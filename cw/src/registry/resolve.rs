//! Startup registry resolution
//!
//! Remote tree listing first, then the saved store, then nothing.

use eyre::{Context, Result};
use tracing::{debug, info, warn};

use super::FileRegistry;
use crate::config::RegistryConfig;
use crate::github::{RepoApi, RepositoryRef};

/// Where the startup registry came from
#[derive(Debug)]
pub enum RegistryLoad {
    /// Built from the tree listing
    Remote(FileRegistry),

    /// The remote failed; loaded from the saved store instead
    Saved { registry: FileRegistry, error: eyre::Report },

    /// Neither source worked; no file can be reported
    Unavailable(eyre::Report),
}

impl RegistryLoad {
    pub fn registry(&self) -> Option<&FileRegistry> {
        match self {
            RegistryLoad::Remote(registry) | RegistryLoad::Saved { registry, .. } => Some(registry),
            RegistryLoad::Unavailable(_) => None,
        }
    }

    pub fn into_registry(self) -> Option<FileRegistry> {
        match self {
            RegistryLoad::Remote(registry) | RegistryLoad::Saved { registry, .. } => Some(registry),
            RegistryLoad::Unavailable(_) => None,
        }
    }
}

/// Configured branch, or the repository's default branch
pub async fn resolve_branch(api: &dyn RepoApi, repo: &RepositoryRef, config: &RegistryConfig) -> Result<String> {
    if let Some(branch) = &config.branch {
        debug!(%branch, "resolve_branch: using configured branch");
        return Ok(branch.clone());
    }

    let branch = api
        .fetch_default_branch(repo)
        .await
        .with_context(|| format!("Failed to resolve the default branch of {}", repo))?;
    info!(%repo, %branch, "Resolved default branch");
    Ok(branch)
}

/// List the resolved branch and build the registry from it
pub async fn build(api: &dyn RepoApi, repo: &RepositoryRef, config: &RegistryConfig) -> Result<FileRegistry> {
    let branch = resolve_branch(api, repo, config).await?;
    FileRegistry::build_from_tree(api, repo, &branch)
        .await
        .with_context(|| format!("Failed to list files of {} at {}", repo, branch))
}

/// Build the registry, falling back to the saved store when the remote fails
///
/// A freshly built registry is saved when `persist` is on; a failed save is
/// logged and otherwise ignored.
pub async fn load(api: &dyn RepoApi, repo: &RepositoryRef, config: &RegistryConfig) -> RegistryLoad {
    let store = &config.store_path;

    let error = match build(api, repo, config).await {
        Ok(registry) => {
            if config.persist {
                match registry.save(store) {
                    Ok(()) => info!(path = %store.display(), files = registry.len(), "Saved file registry"),
                    Err(e) => warn!(path = %store.display(), error = %e, "Failed to save file registry"),
                }
            }
            return RegistryLoad::Remote(registry);
        }
        Err(e) => e,
    };

    warn!(error = %error, "Could not build file registry from the remote");
    if store.exists() {
        match FileRegistry::load(store) {
            Ok(registry) => {
                info!(path = %store.display(), files = registry.len(), "Loaded saved file registry");
                return RegistryLoad::Saved { registry, error };
            }
            Err(e) => warn!(path = %store.display(), error = %e, "Failed to load saved file registry"),
        }
    }

    RegistryLoad::Unavailable(error)
}
