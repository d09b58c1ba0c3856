//! git integration for autocommit
//!
//! This crate provides:
//! - A subprocess runner for the `git` executable (`GitRunner`)
//! - `git status --porcelain` parsing into change events
//! - Push failure classification
//! - `GitPublisher`: status → add → commit → push with upstream creation

pub mod error;
pub mod publish;
pub mod push;
pub mod runner;
pub mod status;

// Re-exports
pub use error::GitError;
pub use publish::{GitPublisher, GitSettings};
pub use push::PushFailure;
pub use runner::{GitOutput, GitRunner, ProcessGit};
pub use status::parse_porcelain;
