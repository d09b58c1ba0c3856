//! Push failure classification
//!
//! git reports push failures only as text on stderr, so the kind of failure
//! is recovered by substring matching. The missing-upstream case is the only
//! one acted upon; when its text heuristic does not match, the publisher
//! falls back to probing `@{u}` directly.

/// Why a push was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushFailure {
    /// Current branch has no upstream tracking branch
    MissingUpstream,
    /// Credentials rejected or unavailable
    Authentication,
    /// Remote refused the update (non-fast-forward, hooks)
    Rejected,
    /// Remote name or URL does not resolve
    NoSuchRemote,
    /// Transport problem
    Network,
    Other,
}

impl PushFailure {
    /// Classify push stderr
    pub fn classify(stderr: &str) -> Self {
        let lower = stderr.to_lowercase();

        if lower.contains("no upstream branch")
            || lower.contains("has no upstream")
            || lower.contains("--set-upstream") {
            PushFailure::MissingUpstream
        } else if lower.contains("authentication")
            || lower.contains("permission denied")
            || lower.contains("could not read username") {
            PushFailure::Authentication
        } else if lower.contains("non-fast-forward") || lower.contains("rejected") {
            PushFailure::Rejected
        } else if lower.contains("does not appear to be a git repository")
            || lower.contains("no such remote")
            || lower.contains("not found") {
            PushFailure::NoSuchRemote
        } else if lower.contains("could not resolve host")
            || lower.contains("timed out")
            || lower.contains("connection") {
            PushFailure::Network
        } else {
            PushFailure::Other
        }
    }

    /// Short operator hint for logs
    pub fn hint(&self) -> &'static str {
        match self {
            PushFailure::MissingUpstream => "no upstream branch",
            PushFailure::Authentication => "authentication failed; check SSH keys or credentials",
            PushFailure::Rejected => "push rejected by remote; pull and reconcile manually",
            PushFailure::NoSuchRemote => "remote repository not found; verify `git remote -v`",
            PushFailure::Network => "network error; check connectivity",
            PushFailure::Other => "push failed",
        }
    }
}
