//! Watch a repository and commit changes after each quiet period

use crate::locks::DaemonLock;
use crate::{system_config, util};
use anyhow::{Context, Result};
use git::GitPublisher;
use owo_colors::OwoColorize;
use pipeline::{Pipeline, PipelineHandle};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

pub async fn run(path: Option<&Path>, debounce_ms: Option<u64>, no_push: bool) -> Result<()> {
    let repo_root = util::find_repo_root(path)?;

    let mut config = system_config::load()?;
    if let Some(ms) = debounce_ms {
        config.watch.debounce_ms = ms;
    }
    if no_push {
        config.git.push = false;
    }
    config.validate().context("Invalid configuration")?;

    let lock = DaemonLock::acquire(&util::state_dir(&repo_root)?)?;
    debug!(path = %lock.path().display(), "Acquired daemon lock");

    let publisher = GitPublisher::open(&repo_root, &config.git_settings())
        .await
        .context("Failed to open git repository")?;
    let remote = publisher.remote().map(str::to_string);

    let handle = Pipeline::new(publisher, config.pipeline_config())
        .watch(&repo_root, config.watcher_config())?;

    info!(
        root = %repo_root.display(),
        debounce_ms = config.watch.debounce_ms,
        push = config.git.push,
        "Watching for changes"
    );
    println!("Watching {}", repo_root.display().to_string().cyan());
    println!(
        "  Debounce: {}ms, push: {}",
        config.watch.debounce_ms,
        match (&remote, config.git.push) {
            (Some(remote), true) => remote.clone(),
            (None, true) => "no remote".to_string(),
            (_, false) => "disabled".to_string(),
        }
    );
    println!("{}", "Press Ctrl-C to stop".dimmed());

    tokio::select! {
        result = shutdown_signal() => result?,
        _ = wait_finished(&handle) => warn!("Pipeline exited unexpectedly"),
    }

    let stats = handle.stats();
    handle.stop().await?;

    info!(
        commits = stats.commits,
        failures = stats.failures,
        "Stopped watching"
    );
    println!(
        "{} Stopped ({} commits, {} failed cycles)",
        "✓".green(),
        stats.commits,
        stats.failures
    );
    drop(lock);
    Ok(())
}

async fn wait_finished(handle: &PipelineHandle) {
    while !handle.is_finished() {
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

/// Resolve on Ctrl-C or SIGTERM
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.context("Failed to listen for Ctrl-C")?,
        _ = terminate.recv() => info!("Received SIGTERM"),
    }
    Ok(())
}
