//! Console notifications
//!
//! The [`Reporter`] is the only user-facing channel. Formatting lives on
//! [`Announcement`] so the text can be checked without capturing stdout.

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

use colored::*;
use tracing::debug;

use crate::github::{CommitId, RemoteError, RepositoryRef};
use crate::registry::FileRegistry;

/// Which request a failed poll was making
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStage {
    LatestCommit,
    ChangedFiles,
}

impl PollStage {
    pub fn describe(&self) -> &'static str {
        match self {
            PollStage::LatestCommit => "latest commit",
            PollStage::ChangedFiles => "changed files",
        }
    }
}

/// A detected commit transition, already filtered through the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub repo: RepositoryRef,
    pub commit: CommitId,
    pub files: Vec<String>,
    pub commit_url: String,
}

impl Announcement {
    /// Keep the changed paths whose basename the registry knows
    ///
    /// Without a registry nothing is known, so no files are kept.
    pub fn new(
        repo: &RepositoryRef,
        commit: &CommitId,
        changed: Vec<String>,
        registry: Option<&FileRegistry>,
        web_url: &str,
    ) -> Self {
        debug!(changed = changed.len(), has_registry = registry.is_some(), "Announcement::new: called");
        let files = match registry {
            Some(registry) => changed.into_iter().filter(|f| registry.contains_path(f)).collect(),
            None => Vec::new(),
        };

        Self {
            repo: repo.clone(),
            commit: commit.clone(),
            files,
            commit_url: commit_url(web_url, repo, commit),
        }
    }

    /// Plain-text lines in display order
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("New commit detected in {}! SHA: {}", self.repo, self.commit)];
        if !self.files.is_empty() {
            lines.push("Changed files:".to_string());
            lines.extend(self.files.iter().map(|f| format!("- {}", f)));
        }
        lines.push(format!("Commit URL: {}", self.commit_url));
        lines
    }
}

/// Web UI link for a commit; built from a template, never fetched
pub fn commit_url(web_url: &str, repo: &RepositoryRef, commit: &CommitId) -> String {
    format!(
        "{}/{}/{}/commit/{}",
        web_url.trim_end_matches('/'),
        repo.owner,
        repo.name,
        commit
    )
}

/// Console line for a failed request
pub fn failure_line(stage: PollStage, err: &RemoteError) -> String {
    match err.status() {
        Some(status) => format!("Error: Unable to fetch {}. Status code: {}", stage.describe(), status),
        None => format!("Error: Unable to fetch {}. {}", stage.describe(), err),
    }
}

/// Receives watcher events worth telling a human about
pub trait Reporter: Send + Sync {
    fn announce(&self, announcement: &Announcement);

    fn poll_failed(&self, stage: PollStage, err: &RemoteError);
}

/// Writes [`Announcement::lines`] and failure lines to the console
///
/// Colour is applied per line on top of the plain text, so what is printed is
/// always what `lines()` returns.
pub struct ConsoleReporter {
    out: Mutex<Box<dyn Write + Send>>,
    color: bool,
}

impl fmt::Debug for ConsoleReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleReporter").field("color", &self.color).finish()
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleReporter {
    /// Coloured output on stdout
    pub fn new() -> Self {
        Self {
            out: Mutex::new(Box::new(io::stdout())),
            color: true,
        }
    }

    /// Plain output on any writer
    pub fn with_writer(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
            color: false,
        }
    }

    fn paint(&self, line: &str, style: fn(&str) -> ColoredString) -> String {
        if self.color { style(line).to_string() } else { line.to_string() }
    }

    fn emit(&self, lines: &[String]) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        for line in lines {
            if let Err(e) = writeln!(out, "{}", line) {
                debug!(error = %e, "ConsoleReporter: write failed");
                return;
            }
        }
        let _ = out.flush();
    }
}

impl Reporter for ConsoleReporter {
    fn announce(&self, announcement: &Announcement) {
        let lines = announcement.lines();
        let last = lines.len().saturating_sub(1);
        let painted: Vec<String> = lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    self.paint(line, |s| s.cyan().bold())
                } else if i == last {
                    self.paint(line, |s| s.dimmed())
                } else if line.starts_with("- ") {
                    self.paint(line, |s| s.green())
                } else {
                    line.clone()
                }
            })
            .collect();
        self.emit(&painted);
    }

    fn poll_failed(&self, stage: PollStage, err: &RemoteError) {
        let line = self.paint(&failure_line(stage, err), |s| s.red());
        self.emit(&[line]);
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingReporter {
    announcements: Mutex<Vec<Announcement>>,
    failures: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn announcements(&self) -> Vec<Announcement> {
        self.announcements.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

impl Reporter for RecordingReporter {
    fn announce(&self, announcement: &Announcement) {
        if let Ok(mut a) = self.announcements.lock() {
            a.push(announcement.clone());
        }
    }

    fn poll_failed(&self, stage: PollStage, err: &RemoteError) {
        if let Ok(mut f) = self.failures.lock() {
            f.push(failure_line(stage, err));
        }
    }
}
