//! commitwatch - GitHub commit poller
//!
//! CLI entry point for watching a repository.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use commitwatch::cli::{Cli, Command, get_log_path};
use commitwatch::config::Config;
use commitwatch::github::{CommitId, GitHubClient, RepoApi, RepositoryRef};
use commitwatch::registry::{FileRegistry, RegistryLoad, resolve};
use commitwatch::report::ConsoleReporter;
use commitwatch::watcher::{CommitWatcher, PollOutcome};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    // Load configuration, then let flags override it
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);

    // Dispatch command
    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command.clone().unwrap_or(Command::Watch) {
        Command::Watch => cmd_watch(&config).await,
        Command::Check { since } => cmd_check(&config, since).await,
        Command::Snapshot => cmd_snapshot(&config).await,
        Command::Logs { follow, lines } => cmd_logs(follow, lines),
    }
}

fn create_client(config: &Config) -> Result<Arc<dyn RepoApi>> {
    let client = GitHubClient::from_config(&config.github).context("Failed to create GitHub client")?;
    if !client.is_authenticated() {
        warn!(token_env = %config.github.token_env, "No token found, using anonymous (rate-limited) access");
    }
    Ok(Arc::new(client))
}

/// Startup registry with a console notice when the remote could not supply it
async fn load_registry(api: &dyn RepoApi, repo: &RepositoryRef, config: &Config) -> Option<FileRegistry> {
    let store = &config.registry.store_path;

    match resolve::load(api, repo, &config.registry).await {
        RegistryLoad::Remote(registry) => Some(registry),
        RegistryLoad::Saved { registry, .. } => {
            println!(
                "{} Using saved file list from {} ({} files)",
                "!".yellow(),
                store.display(),
                registry.len()
            );
            Some(registry)
        }
        RegistryLoad::Unavailable(e) => {
            println!("{} No file list available ({}); changed files will not be listed", "!".yellow(), e);
            None
        }
    }
}

/// Watch the repository until SIGINT/SIGTERM
async fn cmd_watch(config: &Config) -> Result<()> {
    let repo = config.repository()?;
    let api = create_client(config)?;

    println!(
        "Monitoring changes in {} every {} seconds...",
        repo.to_string().cyan(),
        config.watcher.poll_interval_secs
    );

    let registry = load_registry(api.as_ref(), &repo, config).await;
    let reporter = Arc::new(ConsoleReporter::new());
    let mut watcher = CommitWatcher::new(config.watcher.clone(), repo.clone(), api, reporter)
        .with_registry(registry)
        .with_web_url(config.github.web_url.clone());

    watcher
        .seed()
        .await
        .with_context(|| format!("Failed to fetch the initial commit of {}", repo))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    let watcher_handle = tokio::spawn(watcher.run(shutdown_rx));

    // Set up signal handlers
    debug!("cmd_watch: setting up signal handlers");
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => warn!("SIGINT received"),
            _ = sigterm.recv() => warn!("SIGTERM received"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        warn!("Ctrl+C received");
    }

    let _ = shutdown_tx.send(()).await;
    let state = watcher_handle.await.context("Watcher task failed")?;
    info!(last_seen = ?state.last_seen().map(CommitId::as_str), "Watcher stopped");
    Ok(())
}

/// Compare `since` against the current head once
async fn cmd_check(config: &Config, since: String) -> Result<()> {
    let repo = config.repository()?;
    let api = create_client(config)?;

    let registry = load_registry(api.as_ref(), &repo, config).await;
    let reporter = Arc::new(ConsoleReporter::new());
    let mut watcher = CommitWatcher::new(config.watcher.clone(), repo.clone(), api, reporter)
        .with_registry(registry)
        .with_web_url(config.github.web_url.clone());
    watcher.set_last_seen(Some(CommitId::new(since)));

    match watcher.check_once().await {
        PollOutcome::Failed(e) => Err(e).with_context(|| format!("Failed to poll {}", repo)),
        PollOutcome::Unchanged(sha) | PollOutcome::Baseline(sha) => {
            println!("No new commit in {} (head: {})", repo, sha.short());
            Ok(())
        }
        PollOutcome::NewCommit { .. } => Ok(()),
    }
}

/// Build the registry and write it to the store
async fn cmd_snapshot(config: &Config) -> Result<()> {
    let repo = config.repository()?;
    let api = create_client(config)?;
    let store: &PathBuf = &config.registry.store_path;

    let registry = resolve::build(api.as_ref(), &repo, &config.registry).await?;
    registry
        .save(store)
        .with_context(|| format!("Failed to save registry to {}", store.display()))?;

    println!(
        "{} Saved {} file names from {} to {}",
        "✓".green(),
        registry.len(),
        repo.to_string().cyan(),
        store.display()
    );
    Ok(())
}

/// Show the tail of the log file
fn cmd_logs(follow: bool, lines: usize) -> Result<()> {
    debug!(follow, lines, "cmd_logs: called");
    let log_path = get_log_path();

    if !log_path.exists() {
        println!("No log file found at: {}", log_path.display());
        return Ok(());
    }

    if follow {
        println!("Following log file: {} (Ctrl+C to stop)", log_path.display());
        println!();

        // Use tail -f for following
        let mut child = std::process::Command::new("tail")
            .args(["-f", "-n", &lines.to_string()])
            .arg(&log_path)
            .spawn()
            .context("Failed to run tail -f")?;

        child.wait()?;
    } else {
        let file = fs::File::open(&log_path).context("Failed to open log file")?;
        let reader = BufReader::new(file);
        let all_lines: Vec<String> = reader.lines().map_while(|l| l.ok()).collect();

        let start = all_lines.len().saturating_sub(lines);
        for line in &all_lines[start..] {
            println!("{}", line);
        }
    }

    Ok(())
}
