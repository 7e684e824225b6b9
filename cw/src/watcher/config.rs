//! Watcher configuration

use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the CommitWatcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Polling interval in seconds
    #[serde(rename = "poll-interval-secs", default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Stretch the next sleep to the wait a rate-limited response asks for
    #[serde(rename = "honor-rate-limit", default = "default_honor_rate_limit")]
    pub honor_rate_limit: bool,
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_honor_rate_limit() -> bool {
    true
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            honor_rate_limit: default_honor_rate_limit(),
        }
    }
}

impl WatcherConfig {
    /// Get the poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Reject settings that would poll without pause
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(eyre!("watcher.poll-interval-secs must be at least 1"));
        }
        Ok(())
    }
}
