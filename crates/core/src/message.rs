//! Commit message synthesis
//!
//! Turns an aggregated change set into a one-line message:
//! `[Auto] {verb} {scope}: {N} file{s} at {HH:MM}`.
//!
//! The verb comes from the set of actions, the scope from the set of file
//! extensions (first match in a fixed precedence order wins).

use crate::{ChangeAction, ChangeEvent};
use ahash::AHashSet;
use chrono::NaiveTime;
use std::fmt;
use std::path::Path;

/// Default message prefix
pub const DEFAULT_PREFIX: &str = "[Auto]";

/// Commit verb derived from the change actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Add,
    Remove,
    Update,
    Refactor,
}

impl Verb {
    /// Pick the verb for a set of actions
    ///
    /// Uniform actions map to their own verb, anything mixed is a refactor.
    /// An empty set (no parseable entries) reads as an update.
    pub fn for_actions(actions: &AHashSet<ChangeAction>) -> Self {
        if actions.len() != 1 {
            return if actions.is_empty() { Verb::Update } else { Verb::Refactor };
        }

        match actions.iter().next() {
            Some(ChangeAction::Added) => Verb::Add,
            Some(ChangeAction::Deleted) => Verb::Remove,
            Some(ChangeAction::Modified) | None => Verb::Update,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Add => "Add",
            Verb::Remove => "Remove",
            Verb::Update => "Update",
            Verb::Refactor => "Refactor",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commit scope derived from file extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Code,
    Docs,
    Config,
    Styles,
    Files,
}

impl Scope {
    /// Precedence table, first match wins
    const RULES: &'static [(&'static [&'static str], Scope)] = &[
        (&["ts", "js"], Scope::Code),
        (&["md"], Scope::Docs),
        (&["json"], Scope::Config),
        (&["css", "scss"], Scope::Styles),
    ];

    /// Pick the scope for a set of lowercase extensions (without the dot)
    pub fn for_extensions(extensions: &AHashSet<String>) -> Self {
        Self::RULES
            .iter()
            .find(|(exts, _)| exts.iter().any(|ext| extensions.contains(*ext)))
            .map(|(_, scope)| *scope)
            .unwrap_or(Scope::Files)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Code => "code",
            Scope::Docs => "docs",
            Scope::Config => "config",
            Scope::Styles => "styles",
            Scope::Files => "files",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message and size of one commit, computed once per debounce firing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitPlan {
    pub message: String,
    pub change_count: usize,
}

impl CommitPlan {
    /// Build a plan from drained change entries
    ///
    /// Returns None for an empty change set.
    pub fn from_changes<S: AsRef<str>>(changes: &[S], prefix: &str, at: NaiveTime) -> Option<Self> {
        if changes.is_empty() {
            return None;
        }

        Some(Self {
            message: synthesize(changes, prefix, at),
            change_count: changes.len(),
        })
    }
}

/// Synthesize a commit message from recorded `"action: path"` entries
///
/// Entries that fail to parse still count towards N but do not influence
/// the verb or scope.
pub fn synthesize<S: AsRef<str>>(changes: &[S], prefix: &str, at: NaiveTime) -> String {
    let mut actions = AHashSet::new();
    let mut extensions = AHashSet::new();

    for entry in changes {
        let Ok(event) = entry.as_ref().parse::<ChangeEvent>() else {
            tracing::debug!(entry = entry.as_ref(), "skipping unparseable change entry");
            continue;
        };

        actions.insert(event.action);
        if let Some(ext) = Path::new(&event.path).extension().and_then(|e| e.to_str()) {
            extensions.insert(ext.to_ascii_lowercase());
        }
    }

    let verb = Verb::for_actions(&actions);
    let scope = Scope::for_extensions(&extensions);
    let count = changes.len();
    let plural = if count > 1 { "s" } else { "" };

    format!(
        "{} {} {}: {} file{} at {}",
        prefix,
        verb,
        scope,
        count,
        plural,
        at.format("%H:%M")
    )
}
