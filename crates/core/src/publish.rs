//! Publisher seam between the pipeline and the version-control system

use crate::CommitPlan;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

/// Result of the push step of a publish cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushResult {
    /// Pushed to the existing upstream
    Pushed,
    /// No upstream existed; pushed once more while creating it
    PushedWithUpstream { branch: String },
    /// Push failed, commit stays local
    Failed { reason: String },
    /// Push disabled or no remote configured
    Skipped,
}

/// Result of one publish cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Working tree was clean, nothing committed
    NoChanges,
    /// A commit was created
    Committed { push: PushResult },
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishOutcome::NoChanges => f.write_str("no changes"),
            PublishOutcome::Committed { push } => match push {
                PushResult::Pushed => f.write_str("committed and pushed"),
                PushResult::PushedWithUpstream { branch } => {
                    write!(f, "committed and pushed (created upstream for {})", branch)
                }
                PushResult::Failed { reason } => write!(f, "committed, push failed: {}", reason),
                PushResult::Skipped => f.write_str("committed (push skipped)"),
            },
        }
    }
}

/// Publishes a commit plan to version control
///
/// An `Err` means the cycle failed before a commit could be made
/// (status, stage or commit). Push failures are reported through
/// `PushResult::Failed` instead.
#[async_trait]
pub trait Publish: Send + Sync {
    async fn publish(&self, plan: &CommitPlan) -> Result<PublishOutcome>;
}
