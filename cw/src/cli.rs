//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;

/// commitwatch - GitHub commit poller
#[derive(Debug, Parser)]
#[command(
    name = "cw",
    about = "Poll a GitHub repository and report which tracked files each new commit touched",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Repository to watch (OWNER/NAME)
    #[arg(short, long, global = true, value_name = "OWNER/NAME")]
    pub repo: Option<String>,

    /// Polling interval in seconds (at least 1)
    #[arg(short, long, global = true, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Branch to build the file registry from (default: the repository's default branch)
    #[arg(short, long, global = true)]
    pub branch: Option<String>,

    /// CSV file the registry is saved to and loaded from
    #[arg(short, long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Subcommand to execute (default: watch)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config
    pub fn apply_overrides(&self, config: &mut Config) {
        debug!("apply_overrides: called");
        if let Some(repo) = &self.repo {
            config.repository = Some(repo.clone());
        }
        if let Some(interval) = self.interval {
            config.watcher.poll_interval_secs = interval;
        }
        if let Some(branch) = &self.branch {
            config.registry.branch = Some(branch.clone());
        }
        if let Some(store) = &self.store {
            config.registry.store_path = store.clone();
        }
    }
}

/// CLI subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Poll for new commits until interrupted
    Watch,

    /// Compare a known commit against the current head once and exit
    Check {
        /// Commit to treat as last seen
        #[arg(value_name = "SHA")]
        since: String,
    },

    /// Build the file registry from the tree listing and save it
    Snapshot,

    /// Show logs
    Logs {
        /// Follow log output (like tail -f)
        #[arg(short, long)]
        follow: bool,

        /// Number of lines to show
        #[arg(short = 'n', long, default_value = "50")]
        lines: usize,
    },
}

/// Get the path to the log file
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("commitwatch")
        .join("logs")
        .join("commitwatch.log");
    debug!(?path, "get_log_path: returning path");
    path
}
