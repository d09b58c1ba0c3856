//! Pending change set
//!
//! Collects change events between debounce firings. Entries are keyed by
//! `"action: path"`, so repeated notifications for the same pair collapse
//! into one. First-insertion order is kept for message tie-breaks.

use crate::ChangeEvent;
use ahash::AHashSet;

/// Aggregates change events into a deduplicated, ordered set
///
/// Owned by a single pipeline instance; there is no concurrent drain.
#[derive(Debug, Default)]
pub struct ChangeAggregator {
    /// Entries in first-insertion order
    order: Vec<String>,

    /// Membership index over `order`
    seen: AHashSet<String>,
}

impl ChangeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event
    ///
    /// Returns true if the `"action: path"` entry was not already pending.
    pub fn record(&mut self, event: &ChangeEvent) -> bool {
        let key = event.key();
        if self.seen.contains(&key) {
            return false;
        }

        self.seen.insert(key.clone());
        self.order.push(key);
        true
    }

    /// Take every pending entry and leave the set empty
    pub fn drain(&mut self) -> Vec<String> {
        self.seen.clear();
        std::mem::take(&mut self.order)
    }

    /// Pending entries in insertion order
    pub fn entries(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
