//! Change events produced by the watcher

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of change observed on a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    /// File created
    Added,
    /// File contents changed
    Modified,
    /// File removed
    Deleted,
}

impl ChangeAction {
    /// Lowercase word used in the `"action: path"` form
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Added => "added",
            ChangeAction::Modified => "modified",
            ChangeAction::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeAction {
    type Err = ChangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "added" => Ok(ChangeAction::Added),
            "modified" => Ok(ChangeAction::Modified),
            "deleted" => Ok(ChangeAction::Deleted),
            other => Err(ChangeParseError::UnknownAction(other.to_string())),
        }
    }
}

/// A single file-system change, relative to the watched root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeEvent {
    /// What happened
    pub action: ChangeAction,
    /// Path relative to the watched root, `/`-separated
    pub path: String,
}

impl ChangeEvent {
    pub fn new(action: ChangeAction, path: impl Into<String>) -> Self {
        Self {
            action,
            path: path.into(),
        }
    }

    pub fn added(path: impl Into<String>) -> Self {
        Self::new(ChangeAction::Added, path)
    }

    pub fn modified(path: impl Into<String>) -> Self {
        Self::new(ChangeAction::Modified, path)
    }

    pub fn deleted(path: impl Into<String>) -> Self {
        Self::new(ChangeAction::Deleted, path)
    }

    /// Key used by the pending change set (`"action: path"`)
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.action, self.path)
    }
}

impl FromStr for ChangeEvent {
    type Err = ChangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (action, path) = s
            .split_once(": ")
            .ok_or_else(|| ChangeParseError::MissingSeparator(s.to_string()))?;

        if path.is_empty() {
            return Err(ChangeParseError::EmptyPath(s.to_string()));
        }

        Ok(Self {
            action: action.parse()?,
            path: path.to_string(),
        })
    }
}

/// Errors from parsing a recorded change entry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangeParseError {
    #[error("change entry '{0}' has no ': ' separator")]
    MissingSeparator(String),

    #[error("unknown change action '{0}'")]
    UnknownAction(String),

    #[error("change entry '{0}' has an empty path")]
    EmptyPath(String),
}
