//! git subprocess execution
//!
//! Exit code and captured output are the whole contract with git. A non-zero
//! exit is returned as a `GitOutput`, not an error; callers decide what a
//! failure means for the step they are running.

use crate::GitError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Captured result of one git invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into `GitError::CommandFailed`
    pub fn check(self, args: &[&str]) -> Result<Self, GitError> {
        if self.success() {
            Ok(self)
        } else {
            Err(GitError::CommandFailed {
                command: args.join(" "),
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs git commands in a working tree
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// Working tree the commands run in
    fn workdir(&self) -> &Path;

    /// Run `git <args>` to completion
    async fn run(&self, args: &[&str]) -> Result<GitOutput, GitError>;
}

/// `GitRunner` backed by the `git` executable
#[derive(Debug, Clone)]
pub struct ProcessGit {
    workdir: PathBuf,
}

impl ProcessGit {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }
}

#[async_trait]
impl GitRunner for ProcessGit {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    async fn run(&self, args: &[&str]) -> Result<GitOutput, GitError> {
        tracing::debug!(args = ?args, "git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            // Never block a background process on a credential prompt
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .output()
            .await?;

        Ok(GitOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
