//! Core types for autocommit
//!
//! This crate provides:
//! - Change events (added/modified/deleted) and their `"action: path"` form
//! - The pending change set with idempotent insertion
//! - Commit message synthesis from an aggregated change set
//! - The `Publish` seam implemented by VCS publishers

pub mod change;
pub mod aggregate;
pub mod message;
pub mod publish;

// Re-exports
pub use aggregate::ChangeAggregator;
pub use change::{ChangeAction, ChangeEvent, ChangeParseError};
pub use message::{synthesize, CommitPlan, Scope, Verb, DEFAULT_PREFIX};
pub use publish::{Publish, PublishOutcome, PushResult};
