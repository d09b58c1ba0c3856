//! Commit and push a change set with git
//!
//! One publish cycle is: status → add → commit → push. A clean working tree
//! ends the cycle early. A push that fails because the branch has no upstream
//! is retried exactly once with `push -u <remote> <branch>`; any other push
//! failure is logged and the commit stays local.

use crate::push::PushFailure;
use crate::runner::{GitOutput, GitRunner, ProcessGit};
use crate::status::parse_porcelain;
use crate::GitError;
use anyhow::Result;
use async_trait::async_trait;
use autocommit_core::{ChangeEvent, CommitPlan, Publish, PublishOutcome, PushResult};
use std::path::Path;
use tracing::{debug, info, warn};

/// Publisher settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSettings {
    /// Preferred remote name
    pub remote: String,

    /// Push after committing
    pub push: bool,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            push: true,
        }
    }
}

/// Publishes commit plans to a git working tree
pub struct GitPublisher<R: GitRunner = ProcessGit> {
    runner: R,

    /// Remote used for upstream creation, None when the repo has no remotes
    remote: Option<String>,

    push_enabled: bool,
}

impl GitPublisher<ProcessGit> {
    /// Open the working tree at `root`
    pub async fn open(root: &Path, settings: &GitSettings) -> Result<Self, GitError> {
        Self::with_runner(ProcessGit::new(root), settings).await
    }
}

impl<R: GitRunner> GitPublisher<R> {
    /// Validate the working tree and resolve the remote
    ///
    /// Fails if the directory is not a git work tree. A repository without
    /// remotes is accepted with a warning; its commits stay local.
    pub async fn with_runner(runner: R, settings: &GitSettings) -> Result<Self, GitError> {
        let inside = runner.run(&["rev-parse", "--is-inside-work-tree"]).await?;
        if !inside.success() || inside.stdout.trim() != "true" {
            return Err(GitError::NotARepository(runner.workdir().to_path_buf()));
        }

        let remote = select_remote(&runner, &settings.remote).await?;
        match &remote {
            Some(name) => info!(remote = %name, "Using git remote"),
            None => warn!("No git remote configured; commits will not be pushed"),
        }

        Ok(Self {
            runner,
            remote,
            push_enabled: settings.push,
        })
    }

    /// Remote that pushes target, if any
    pub fn remote(&self) -> Option<&str> {
        self.remote.as_deref()
    }

    pub fn workdir(&self) -> &Path {
        self.runner.workdir()
    }

    /// Uncommitted changes in the working tree, untracked files listed
    /// individually
    pub async fn pending_changes(&self) -> Result<Vec<ChangeEvent>, GitError> {
        let status = self.git(&["status", "--porcelain", "--untracked-files=all"]).await?;
        Ok(parse_porcelain(&status.stdout))
    }

    /// Name of the checked-out branch, None on a detached HEAD
    pub async fn current_branch(&self) -> Result<Option<String>, GitError> {
        let output = self.git(&["branch", "--show-current"]).await?;
        let branch = output.stdout.trim();
        Ok((!branch.is_empty()).then(|| branch.to_string()))
    }

    /// Run a step whose failure is fatal for the cycle
    async fn git(&self, args: &[&str]) -> Result<GitOutput, GitError> {
        self.runner.run(args).await?.check(args)
    }

    async fn push(&self) -> PushResult {
        if !self.push_enabled {
            debug!("Push disabled, keeping commit local");
            return PushResult::Skipped;
        }
        let Some(remote) = self.remote.as_deref() else {
            warn!("No git remote configured, skipping push");
            return PushResult::Skipped;
        };

        let output = match self.runner.run(&["push"]).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Push failed: {}", e);
                return PushResult::Failed { reason: e.to_string() };
            }
        };
        if output.success() {
            info!("Pushed to upstream");
            return PushResult::Pushed;
        }

        // Ask git about the upstream only for unrecognized (e.g. localized) text
        let failure = PushFailure::classify(&output.stderr);
        let missing_upstream = match failure {
            PushFailure::MissingUpstream => true,
            PushFailure::Other => !self.has_upstream().await,
            _ => false,
        };
        if missing_upstream {
            return self.push_with_upstream(remote).await;
        }

        warn!(
            stderr = %output.stderr.trim(),
            "Push failed ({}); commit kept locally",
            failure.hint()
        );
        PushResult::Failed {
            reason: failure.hint().to_string(),
        }
    }

    /// Whether the current branch tracks an upstream branch
    ///
    /// Structured check used when the push error text is not recognized.
    async fn has_upstream(&self) -> bool {
        match self
            .runner
            .run(&["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"])
            .await
        {
            Ok(output) => output.success(),
            // Cannot tell; treat as present so no retry happens
            Err(_) => true,
        }
    }

    /// The single retry: push while creating the upstream branch
    async fn push_with_upstream(&self, remote: &str) -> PushResult {
        let branch = match self.current_branch().await {
            Ok(Some(branch)) => branch,
            Ok(None) => {
                warn!("No upstream branch and HEAD is detached; commit kept locally");
                return PushResult::Failed {
                    reason: "detached HEAD has no branch to track".to_string(),
                };
            }
            Err(e) => {
                warn!("Failed to determine current branch: {}", e);
                return PushResult::Failed { reason: e.to_string() };
            }
        };

        info!(remote, branch = %branch, "No upstream branch, pushing with -u");
        match self.runner.run(&["push", "-u", remote, &branch]).await {
            Ok(output) if output.success() => PushResult::PushedWithUpstream { branch },
            Ok(output) => {
                let failure = PushFailure::classify(&output.stderr);
                warn!(
                    stderr = %output.stderr.trim(),
                    "Push with upstream failed ({}); commit kept locally",
                    failure.hint()
                );
                PushResult::Failed {
                    reason: failure.hint().to_string(),
                }
            }
            Err(e) => {
                warn!("Push with upstream failed: {}", e);
                PushResult::Failed { reason: e.to_string() }
            }
        }
    }
}

#[async_trait]
impl<R: GitRunner> Publish for GitPublisher<R> {
    async fn publish(&self, plan: &CommitPlan) -> Result<PublishOutcome> {
        let status = self.git(&["status", "--porcelain"]).await?;
        if status.stdout.trim().is_empty() {
            info!("Working tree clean, nothing to commit");
            return Ok(PublishOutcome::NoChanges);
        }

        self.git(&["add", "-A"]).await?;
        self.git(&["commit", "-m", &plan.message]).await?;
        info!(message = %plan.message, changes = plan.change_count, "Committed");

        let push = self.push().await;
        Ok(PublishOutcome::Committed { push })
    }
}

/// Pick the configured remote if it exists, else the first one listed
async fn select_remote<R: GitRunner>(runner: &R, preferred: &str) -> Result<Option<String>, GitError> {
    let args = ["remote"];
    let output = runner.run(&args).await?.check(&args)?;
    let remotes: Vec<&str> = output.stdout.lines().map(str::trim).filter(|r| !r.is_empty()).collect();

    if remotes.contains(&preferred) {
        return Ok(Some(preferred.to_string()));
    }
    if let Some(first) = remotes.first() {
        warn!(preferred, using = %first, "Configured remote not found");
        return Ok(Some(first.to_string()));
    }
    Ok(None)
}
