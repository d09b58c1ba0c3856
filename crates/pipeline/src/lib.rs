//! Change-aggregation and auto-commit pipeline
//!
//! This crate provides:
//! - `DebounceScheduler`: a single resettable quiet-period timer
//! - `ChangeSource`: the event stream a pipeline consumes (watcher or channel)
//! - `Pipeline`: one instance per watched root, owning its pending change
//!   set and timer, publishing through any `Publish` implementation

pub mod pipeline;
pub mod scheduler;
pub mod source;

// Re-exports
pub use pipeline::{Pipeline, PipelineConfig, PipelineHandle, PipelineStats};
pub use scheduler::{DebounceScheduler, TimerState, DEFAULT_DEBOUNCE};
pub use source::ChangeSource;
