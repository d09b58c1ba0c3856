//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Find the work tree root by walking up from `start` (or cwd) to a `.git`
pub fn find_repo_root(start: Option<&Path>) -> Result<PathBuf> {
    let start = match start {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let mut current = start
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", start.display()))?;

    loop {
        // A file here means a linked worktree or submodule
        if current.join(".git").exists() {
            return Ok(current);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => anyhow::bail!(
                "Not a git repository (no .git found above {})",
                start.display()
            ),
        }
    }
}

/// Resolve the git directory of a work tree
///
/// Follows the `gitdir:` pointer when `.git` is a file.
pub fn git_dir(repo_root: &Path) -> Result<PathBuf> {
    let dot_git = repo_root.join(".git");
    if dot_git.is_dir() {
        return Ok(dot_git);
    }

    let contents = std::fs::read_to_string(&dot_git)
        .with_context(|| format!("Failed to read {}", dot_git.display()))?;
    let pointer = contents
        .lines()
        .find_map(|line| line.strip_prefix("gitdir:"))
        .map(str::trim)
        .with_context(|| format!("Malformed .git file at {}", dot_git.display()))?;

    let path = Path::new(pointer);
    Ok(if path.is_absolute() {
        path.to_path_buf()
    } else {
        repo_root.join(path)
    })
}

/// Per-repository state directory (`<git-dir>/autocommit`)
pub fn state_dir(repo_root: &Path) -> Result<PathBuf> {
    Ok(git_dir(repo_root)?.join("autocommit"))
}

/// File name prefix of rolling log files; the date is appended
pub const LOG_FILE_PREFIX: &str = "autocommit.log";

/// Install the global tracing subscriber
///
/// With `log_dir`, output goes to a daily rolling file through a
/// non-blocking writer; keep the returned guard alive to flush it.
pub fn init_logging(log_dir: Option<&Path>, default_level: &str) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .init();
            Ok(None)
        }
    }
}

/// Format an elapsed duration in milliseconds ("5 minutes")
pub fn format_elapsed(ms: u64) -> String {
    let seconds = ms / 1000;

    if seconds < 60 {
        format!("{} seconds", seconds)
    } else if seconds < 3600 {
        format!("{} minutes", seconds / 60)
    } else if seconds < 86400 {
        format!("{} hours", seconds / 3600)
    } else {
        format!("{} days", seconds / 86400)
    }
}

/// Milliseconds since the Unix epoch
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
