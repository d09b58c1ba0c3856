//! Error types for git operations

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("{} is not inside a git work tree", .0.display())]
    NotARepository(PathBuf),

    #[error("`git {command}` failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),
}
