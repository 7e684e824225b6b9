//! commitwatch configuration types and loading

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::github::RepositoryRef;
use crate::watcher::WatcherConfig;

/// Main commitwatch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repository to watch, as OWNER/NAME
    pub repository: Option<String>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// GitHub API configuration
    pub github: GitHubConfig,

    /// Polling configuration
    pub watcher: WatcherConfig,

    /// File registry configuration
    pub registry: RegistryConfig,
}

impl Config {
    /// Resolve the repository to watch
    ///
    /// Call this early in startup to fail fast with a clear error message.
    pub fn repository(&self) -> Result<RepositoryRef> {
        let raw = self.repository.as_deref().ok_or_else(|| {
            eyre!("No repository configured. Pass --repo OWNER/NAME or set `repository` in the config file.")
        })?;
        raw.parse()
    }

    /// Check values serde cannot express constraints for
    pub fn validate(&self) -> Result<()> {
        self.watcher.validate()
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            let config = Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()))?;
            config.validate()?;
            return Ok(config);
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => {
                        config
                            .validate()
                            .with_context(|| format!("Invalid config in {}", candidate.display()))?;
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only `log-level`, before logging is set up
    ///
    /// Errors are ignored here; the full `load` reports them once logging exists.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        #[derive(Deserialize)]
        struct LogLevelOnly {
            #[serde(rename = "log-level")]
            log_level: Option<String>,
        }

        let path = match config_path {
            Some(p) => p.clone(),
            None => Self::default_paths().into_iter().find(|p| p.exists())?,
        };

        let content = fs::read_to_string(path).ok()?;
        serde_yaml::from_str::<LogLevelOnly>(&content).ok()?.log_level
    }

    /// Project-local `.commitwatch.yml`, then `~/.config/commitwatch/commitwatch.yml`
    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".commitwatch.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("commitwatch").join("commitwatch.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// GitHub API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// REST API base URL
    #[serde(rename = "api-url")]
    pub api_url: String,

    /// Web UI base URL, used for commit links
    #[serde(rename = "web-url")]
    pub web_url: String,

    /// Environment variable containing the access token
    #[serde(rename = "token-env")]
    pub token_env: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            web_url: "https://github.com".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl GitHubConfig {
    /// Token from the configured environment variable; empty counts as unset
    pub fn get_token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

/// File registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// CSV record store for the registry
    #[serde(rename = "store-path")]
    pub store_path: PathBuf,

    /// Branch to list; unset means the repository's default branch
    pub branch: Option<String>,

    /// Save the registry to `store-path` after building it
    pub persist: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("repo_files.csv"),
            branch: None,
            persist: true,
        }
    }
}
