//! Stop a background watcher

use crate::locks::DaemonLock;
use crate::util;
use anyhow::{Context, Result};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use owo_colors::OwoColorize;
use std::path::Path;
use std::time::Duration;

pub async fn run(path: Option<&Path>) -> Result<()> {
    let repo_root = util::find_repo_root(path)?;
    let state_dir = util::state_dir(&repo_root)?;

    let Some(holder) = DaemonLock::holder(&state_dir) else {
        println!("{}", "Daemon is not running".yellow());
        return Ok(());
    };

    kill(Pid::from_raw(holder.pid as i32), Signal::SIGTERM)
        .with_context(|| format!("Failed to signal daemon (pid {})", holder.pid))?;

    // Wait for the lock to be released
    for _ in 0..50 {
        if DaemonLock::holder(&state_dir).is_none() {
            println!("{} Daemon stopped (pid {})", "✓".green(), holder.pid);
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    anyhow::bail!("Daemon (pid {}) did not stop within 5 seconds", holder.pid)
}
