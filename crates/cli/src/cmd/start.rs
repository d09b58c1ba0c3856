//! Start a watcher in the background

use crate::locks::DaemonLock;
use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

pub async fn run(path: Option<&Path>, foreground: bool) -> Result<()> {
    if foreground {
        super::watch::run(path, None, false).await
    } else {
        start_background(path).await
    }
}

async fn start_background(path: Option<&Path>) -> Result<()> {
    let repo_root = util::find_repo_root(path)?;
    let state_dir = util::state_dir(&repo_root)?;

    if let Some(holder) = DaemonLock::holder(&state_dir) {
        println!("{} Daemon already running (pid {})", "✓".green(), holder.pid);
        return Ok(());
    }

    std::fs::create_dir_all(&state_dir).context("Failed to create state directory")?;
    // Tracing goes to rolling files; this only catches startup errors and panics
    let output_file = state_dir.join("daemon.out");

    let exe = std::env::current_exe().context("Failed to get current executable path")?;

    let output_writer = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&output_file)
        .context("Failed to open daemon output file")?;

    Command::new("nohup")
        .arg(&exe)
        .arg("watch")
        .arg(&repo_root)
        .arg("--log-dir")
        .arg(&state_dir)
        .stdin(Stdio::null())
        .stdout(output_writer.try_clone()?)
        .stderr(output_writer)
        .spawn()
        .context("Failed to spawn daemon process")?;

    let logs = state_dir.join(format!("{}.*", util::LOG_FILE_PREFIX));

    // Give the child time to take the lock
    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if let Some(holder) = DaemonLock::holder(&state_dir) {
            println!("{} Daemon started (pid {})", "✓".green(), holder.pid);
            println!("Logs: {}", logs.display());
            return Ok(());
        }
    }

    anyhow::bail!(
        "Daemon failed to start (check {} and {})",
        output_file.display(),
        logs.display()
    )
}
