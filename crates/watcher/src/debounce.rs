//! Per-path write stabilization
//!
//! Holds each path's latest change until the path has been quiet for the
//! stability threshold, so a burst of partial writes surfaces as a single
//! event. Successive changes to one path merge into the net change.

use ahash::AHashMap;
use autocommit_core::{ChangeAction, ChangeEvent};
use std::time::Duration;
use tokio::time::Instant;

/// A change waiting for its path to settle
#[derive(Debug, Clone, Copy)]
struct Pending {
    action: ChangeAction,
    last_seen: Instant,
}

/// Per-path stability tracker
#[derive(Debug)]
pub struct WriteStabilizer {
    /// Quiet period a path needs before its change is released
    threshold: Duration,

    /// Unsettled changes keyed by relative path
    pending: AHashMap<String, Pending>,
}

impl WriteStabilizer {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            pending: AHashMap::new(),
        }
    }

    /// Record a raw change observed at `now`
    pub fn observe(&mut self, event: ChangeEvent, now: Instant) {
        let merged = match self.pending.get(&event.path) {
            Some(prev) => merge(prev.action, event.action),
            None => Some(event.action),
        };

        match merged {
            Some(action) => {
                self.pending.insert(event.path, Pending { action, last_seen: now });
            }
            None => {
                // Created and removed before it settled
                self.pending.remove(&event.path);
            }
        }
    }

    /// Release every change whose path has been quiet for the threshold
    ///
    /// Released events are ordered by when they were last touched.
    pub fn take_stable(&mut self, now: Instant) -> Vec<ChangeEvent> {
        let threshold = self.threshold;
        let mut stable: Vec<(Instant, ChangeEvent)> = Vec::new();

        self.pending.retain(|path, pending| {
            if now.saturating_duration_since(pending.last_seen) >= threshold {
                stable.push((pending.last_seen, ChangeEvent::new(pending.action, path.clone())));
                false
            } else {
                true
            }
        });

        stable.sort_by(|(a_seen, a), (b_seen, b)| a_seen.cmp(b_seen).then_with(|| a.path.cmp(&b.path)));
        stable.into_iter().map(|(_, event)| event).collect()
    }

    /// Number of paths still settling
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Net effect of `next` following an unsettled `prev` on the same path
///
/// None means the two cancel out.
fn merge(prev: ChangeAction, next: ChangeAction) -> Option<ChangeAction> {
    use ChangeAction::*;

    match (prev, next) {
        (Added, Deleted) => None,
        (Added, _) => Some(Added),
        (Deleted, Added) | (Deleted, Modified) => Some(Modified),
        (Deleted, Deleted) => Some(Deleted),
        (Modified, Deleted) => Some(Deleted),
        (Modified, _) => Some(Modified),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: Duration = Duration::from_millis(1000);

    #[test]
    fn test_rapid_writes_coalesce() {
        let start = Instant::now();
        let mut stab = WriteStabilizer::new(THRESHOLD);

        for i in 0..5 {
            stab.observe(ChangeEvent::modified("src/a.ts"), start + Duration::from_millis(i * 100));
        }

        // Still settling 999ms after the last write
        assert!(stab.take_stable(start + Duration::from_millis(1399)).is_empty());

        let released = stab.take_stable(start + Duration::from_millis(1400));
        assert_eq!(released, vec![ChangeEvent::modified("src/a.ts")]);
        assert!(stab.is_empty());
    }

    #[test]
    fn test_create_then_write_is_added() {
        let start = Instant::now();
        let mut stab = WriteStabilizer::new(THRESHOLD);

        stab.observe(ChangeEvent::added("new.md"), start);
        stab.observe(ChangeEvent::modified("new.md"), start);

        assert_eq!(stab.take_stable(start + THRESHOLD), vec![ChangeEvent::added("new.md")]);
    }

    #[test]
    fn test_create_then_delete_cancels() {
        let start = Instant::now();
        let mut stab = WriteStabilizer::new(THRESHOLD);

        stab.observe(ChangeEvent::added("scratch.txt"), start);
        stab.observe(ChangeEvent::deleted("scratch.txt"), start);

        assert_eq!(stab.pending_len(), 0);
        assert!(stab.take_stable(start + THRESHOLD).is_empty());
    }

    #[test]
    fn test_delete_then_recreate_is_modified() {
        let start = Instant::now();
        let mut stab = WriteStabilizer::new(THRESHOLD);

        // Atomic-save editors replace the file
        stab.observe(ChangeEvent::deleted("config.json"), start);
        stab.observe(ChangeEvent::added("config.json"), start);

        assert_eq!(
            stab.take_stable(start + THRESHOLD),
            vec![ChangeEvent::modified("config.json")]
        );
    }

    #[test]
    fn test_modify_then_delete_is_deleted() {
        let start = Instant::now();
        let mut stab = WriteStabilizer::new(THRESHOLD);

        stab.observe(ChangeEvent::modified("old.css"), start);
        stab.observe(ChangeEvent::deleted("old.css"), start);

        assert_eq!(stab.take_stable(start + THRESHOLD), vec![ChangeEvent::deleted("old.css")]);
    }

    #[test]
    fn test_paths_settle_independently() {
        let start = Instant::now();
        let mut stab = WriteStabilizer::new(THRESHOLD);

        stab.observe(ChangeEvent::added("a.ts"), start);
        stab.observe(ChangeEvent::added("b.ts"), start + Duration::from_millis(600));

        let first = stab.take_stable(start + Duration::from_millis(1000));
        assert_eq!(first, vec![ChangeEvent::added("a.ts")]);

        let second = stab.take_stable(start + Duration::from_millis(1600));
        assert_eq!(second, vec![ChangeEvent::added("b.ts")]);
    }

    #[test]
    fn test_zero_threshold_releases_immediately() {
        let start = Instant::now();
        let mut stab = WriteStabilizer::new(Duration::ZERO);

        stab.observe(ChangeEvent::deleted("x.md"), start);
        assert_eq!(stab.take_stable(start), vec![ChangeEvent::deleted("x.md")]);
    }
}
