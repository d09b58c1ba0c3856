//! Run one publish cycle immediately

use crate::{system_config, util};
use anyhow::{Context, Result};
use autocommit_core::{CommitPlan, Publish, PublishOutcome};
use git::GitPublisher;
use std::path::Path;

pub async fn run(path: Option<&Path>, no_push: bool) -> Result<()> {
    let repo_root = util::find_repo_root(path)?;

    let mut config = system_config::load()?;
    if no_push {
        config.git.push = false;
    }

    let publisher = GitPublisher::open(&repo_root, &config.git_settings())
        .await
        .context("Failed to open git repository")?;

    let changes: Vec<String> = publisher
        .pending_changes()
        .await?
        .iter()
        .map(ToString::to_string)
        .collect();

    let now = chrono::Local::now().time();
    let Some(plan) = CommitPlan::from_changes(&changes, &config.git.message_prefix, now) else {
        super::print_outcome(&PublishOutcome::NoChanges);
        return Ok(());
    };

    println!("{}", plan.message);
    let outcome = publisher.publish(&plan).await?;
    super::print_outcome(&outcome);
    Ok(())
}
