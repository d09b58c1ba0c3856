//! Show watcher state and what the next commit would contain

use crate::locks::DaemonLock;
use crate::{system_config, util};
use anyhow::{Context, Result};
use autocommit_core::CommitPlan;
use git::GitPublisher;
use owo_colors::OwoColorize;
use std::path::Path;

/// Changed paths listed before truncating
const MAX_LISTED: usize = 10;

pub async fn run(path: Option<&Path>) -> Result<()> {
    let repo_root = util::find_repo_root(path)?;
    let state_dir = util::state_dir(&repo_root)?;
    let config = system_config::load()?;

    let publisher = GitPublisher::open(&repo_root, &config.git_settings())
        .await
        .context("Failed to open git repository")?;

    println!("{}", "Repository Status".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("Repository:    {}", repo_root.display().to_string().cyan());

    print!("Daemon:        ");
    match DaemonLock::holder(&state_dir) {
        Some(holder) => {
            println!("{}", "Running ✓".green());
            println!("  PID:         {}", holder.pid);
            let uptime = util::now_ms().saturating_sub(holder.started_at);
            println!("  Uptime:      {}", util::format_elapsed(uptime));
        }
        None => {
            println!("{}", "Not running".yellow());
            println!("  {}", "Tip: Start with 'autocommit start'".dimmed());
        }
    }

    let branch = publisher.current_branch().await?;
    println!(
        "Branch:        {}",
        branch.as_deref().unwrap_or("(detached HEAD)")
    );
    match (publisher.remote(), config.git.push) {
        (_, false) => println!("Push:          {}", "disabled".dimmed()),
        (Some(remote), true) => println!("Push:          {}", remote),
        (None, true) => println!("Push:          {}", "no remote configured".yellow()),
    }
    println!("Debounce:      {}ms", config.watch.debounce_ms);
    println!();

    let changes: Vec<String> = publisher
        .pending_changes()
        .await?
        .iter()
        .map(ToString::to_string)
        .collect();

    println!("Pending changes:");
    if changes.is_empty() {
        println!("  {}", "Working tree clean".dimmed());
        return Ok(());
    }

    for change in changes.iter().take(MAX_LISTED) {
        println!("    - {}", change);
    }
    if changes.len() > MAX_LISTED {
        println!("    ... and {} more", changes.len() - MAX_LISTED);
    }

    if let Some(plan) =
        CommitPlan::from_changes(&changes, &config.git.message_prefix, chrono::Local::now().time())
    {
        println!();
        println!("Next message:  {}", plan.message.cyan());
    }

    Ok(())
}
