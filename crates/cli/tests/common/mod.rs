//! Common utilities for integration tests

pub mod cli;
pub mod repo;

// Re-export commonly used items
pub use cli::{AutocommitCommand, CommandResult};
pub use repo::TestRepo;
