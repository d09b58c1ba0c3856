//! The change-aggregation and auto-commit pipeline
//!
//! One `Pipeline` per watched root. It owns its pending change set and its
//! debounce timer; nothing is shared between instances.
//!
//! Control flow: source → aggregator → (debounce) → synthesizer → publisher.
//! Publishing is awaited inside the event loop, so changes that arrive during
//! a publish wait in the source and land in the next change set.

use crate::scheduler::DebounceScheduler;
use crate::source::ChangeSource;
use anyhow::{Context, Result};
use autocommit_core::{ChangeAggregator, ChangeEvent, CommitPlan, Publish, PublishOutcome, DEFAULT_PREFIX};
use chrono::{Local, NaiveTime};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};
use watcher::{FsWatcher, WatcherConfig};

/// Pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Quiet period before publishing
    pub debounce: Duration,

    /// Commit message prefix
    pub message_prefix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debounce: crate::scheduler::DEFAULT_DEBOUNCE,
            message_prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// Counters shared with the pipeline handle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// New entries added to a pending set
    pub changes_recorded: u64,
    /// Debounce expirations that reached the publisher
    pub firings: u64,
    /// Cycles that created a commit
    pub commits: u64,
    /// Cycles aborted by a status/add/commit error
    pub failures: u64,
    /// Human readable result of the latest cycle
    pub last_outcome: Option<String>,
}

type Clock = Arc<dyn Fn() -> NaiveTime + Send + Sync>;

/// A single auto-commit pipeline
pub struct Pipeline<P> {
    aggregator: ChangeAggregator,
    scheduler: DebounceScheduler,
    publisher: P,
    prefix: String,
    clock: Clock,
    stats: Arc<Mutex<PipelineStats>>,
}

impl<P: Publish + 'static> Pipeline<P> {
    pub fn new(publisher: P, config: PipelineConfig) -> Self {
        Self {
            aggregator: ChangeAggregator::new(),
            scheduler: DebounceScheduler::new(config.debounce),
            publisher,
            prefix: config.message_prefix,
            clock: Arc::new(|| Local::now().time()),
            stats: Arc::new(Mutex::new(PipelineStats::default())),
        }
    }

    /// Replace the wall clock used for message timestamps
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveTime + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Record a change and re-arm the debounce timer
    pub fn record(&mut self, event: &ChangeEvent) {
        if self.aggregator.record(event) {
            self.stats.lock().changes_recorded += 1;
            debug!(change = %event, pending = self.aggregator.len(), "Recorded change");
        }
        self.scheduler.arm(Instant::now());
    }

    /// Number of changes waiting for the next firing
    pub fn pending(&self) -> usize {
        self.aggregator.len()
    }

    /// Drain the pending set and publish it
    ///
    /// The pending set is cleared whether or not publishing succeeds.
    /// Returns None when there was nothing pending.
    pub async fn fire(&mut self) -> Option<Result<PublishOutcome>> {
        let changes = self.aggregator.drain();
        let plan = CommitPlan::from_changes(&changes, &self.prefix, (self.clock)())?;

        info!(changes = plan.change_count, message = %plan.message, "Quiet period elapsed, publishing");
        let result = self.publisher.publish(&plan).await;

        let mut stats = self.stats.lock();
        stats.firings += 1;
        match &result {
            Ok(outcome) => {
                info!(%outcome, "Publish cycle finished");
                if matches!(outcome, PublishOutcome::Committed { .. }) {
                    stats.commits += 1;
                }
                stats.last_outcome = Some(outcome.to_string());
            }
            Err(e) => {
                error!(discarded = plan.change_count, "Publish cycle failed: {:#}", e);
                stats.failures += 1;
                stats.last_outcome = Some(format!("failed: {:#}", e));
            }
        }
        drop(stats);

        Some(result)
    }

    /// Drive the pipeline until `stop` resolves or the source ends
    ///
    /// On exit the source is closed and an armed timer is cancelled without
    /// firing.
    pub async fn run<S: ChangeSource>(mut self, mut source: S, mut stop: oneshot::Receiver<()>) {
        loop {
            tokio::select! {
                biased;
                _ = &mut stop => {
                    info!("Stop requested");
                    break;
                }
                _ = self.scheduler.expired(), if self.scheduler.is_armed() => {
                    // Errors are logged and counted in fire()
                    let _ = self.fire().await;
                }
                event = source.next() => match event {
                    Some(event) => self.record(&event),
                    None => {
                        info!("Change source ended");
                        break;
                    }
                },
            }
        }

        source.close();
        self.scheduler.cancel();
        if !self.aggregator.is_empty() {
            info!(discarded = self.aggregator.len(), "Dropping unpublished changes on shutdown");
        }
    }

    /// Watch `root` and run on a new task
    pub fn watch(self, root: &Path, config: WatcherConfig) -> Result<PipelineHandle> {
        let watcher = FsWatcher::start(root, config)
            .with_context(|| format!("Failed to start watcher for {}", root.display()))?;
        Ok(self.spawn(watcher))
    }

    /// Run on a new task
    pub fn spawn<S: ChangeSource + 'static>(self, source: S) -> PipelineHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let stats = Arc::clone(&self.stats);
        let task = tokio::spawn(self.run(source, stop_rx));

        PipelineHandle {
            stop_tx: Some(stop_tx),
            task,
            stats,
        }
    }
}

/// Control handle for a spawned pipeline
pub struct PipelineHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    stats: Arc<Mutex<PipelineStats>>,
}

impl PipelineHandle {
    /// Snapshot of the pipeline counters
    pub fn stats(&self) -> PipelineStats {
        self.stats.lock().clone()
    }

    /// Whether the pipeline task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the pipeline and wait for it to shut down
    pub async fn stop(mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            // Task may already have exited on its own
            let _ = stop_tx.send(());
        }
        self.task.await.context("Pipeline task panicked")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use autocommit_core::PushResult;
    use tokio::sync::mpsc;
    use tokio::time::sleep;

    /// Publisher that records plans and replays scripted results
    #[derive(Clone, Default)]
    struct Recorder {
        plans: Arc<Mutex<Vec<CommitPlan>>>,
        fail_next: Arc<Mutex<u32>>,
        delay: Duration,
    }

    impl Recorder {
        fn plans(&self) -> Vec<CommitPlan> {
            self.plans.lock().clone()
        }

        fn messages(&self) -> Vec<String> {
            self.plans().into_iter().map(|p| p.message).collect()
        }
    }

    #[async_trait]
    impl Publish for Recorder {
        async fn publish(&self, plan: &CommitPlan) -> Result<PublishOutcome> {
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            self.plans.lock().push(plan.clone());

            let mut fail_next = self.fail_next.lock();
            if *fail_next > 0 {
                *fail_next -= 1;
                anyhow::bail!("commit failed");
            }
            Ok(PublishOutcome::Committed { push: PushResult::Pushed })
        }
    }

    fn fixed_clock() -> NaiveTime {
        NaiveTime::from_hms_opt(14, 5, 0).unwrap()
    }

    fn start(recorder: &Recorder) -> (mpsc::UnboundedSender<ChangeEvent>, PipelineHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = Pipeline::new(recorder.clone(), PipelineConfig::default())
            .with_clock(fixed_clock)
            .spawn(rx);
        (tx, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_fires_once_after_last_event() {
        let recorder = Recorder::default();
        let (tx, handle) = start(&recorder);

        tx.send(ChangeEvent::added("a.ts")).unwrap();
        sleep(Duration::from_millis(1000)).await;
        tx.send(ChangeEvent::added("b.ts")).unwrap();
        sleep(Duration::from_millis(2000)).await;
        tx.send(ChangeEvent::added("a.ts")).unwrap();

        // 2999ms after the last event: still quiet period
        sleep(Duration::from_millis(2999)).await;
        assert!(recorder.plans().is_empty());

        sleep(Duration::from_millis(2)).await;
        assert_eq!(recorder.messages(), vec!["[Auto] Add code: 2 files at 14:05"]);

        // Nothing else fires without new events
        sleep(Duration::from_secs(30)).await;
        assert_eq!(recorder.plans().len(), 1);

        let stats = handle.stats();
        assert_eq!(stats.firings, 1);
        assert_eq!(stats.commits, 1);
        assert_eq!(stats.changes_recorded, 2);
        handle.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_events_count_once() {
        let recorder = Recorder::default();
        let (tx, handle) = start(&recorder);

        for _ in 0..5 {
            tx.send(ChangeEvent::modified("guide.md")).unwrap();
        }
        sleep(Duration::from_millis(3100)).await;

        assert_eq!(recorder.plans()[0].change_count, 1);
        assert_eq!(recorder.messages(), vec!["[Auto] Update docs: 1 file at 14:05"]);
        handle.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycle_discards_pending_changes() {
        let recorder = Recorder::default();
        *recorder.fail_next.lock() = 1;
        let (tx, handle) = start(&recorder);

        tx.send(ChangeEvent::added("a.ts")).unwrap();
        tx.send(ChangeEvent::deleted("b.ts")).unwrap();
        sleep(Duration::from_millis(3100)).await;
        assert_eq!(handle.stats().failures, 1);

        tx.send(ChangeEvent::modified("c.css")).unwrap();
        sleep(Duration::from_millis(3100)).await;

        let plans = recorder.plans();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].message, "[Auto] Refactor code: 2 files at 14:05");
        assert_eq!(plans[1].message, "[Auto] Update styles: 1 file at 14:05");
        assert_eq!(handle.stats().commits, 1);
        handle.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_during_publish_go_to_next_cycle() {
        let recorder = Recorder {
            delay: Duration::from_millis(5000),
            ..Recorder::default()
        };
        let (tx, handle) = start(&recorder);

        tx.send(ChangeEvent::added("a.md")).unwrap();
        // Fires at 3000ms, publish runs until 8000ms
        sleep(Duration::from_millis(4000)).await;
        tx.send(ChangeEvent::added("b.json")).unwrap();

        sleep(Duration::from_millis(4100)).await;
        assert_eq!(recorder.messages(), vec!["[Auto] Add docs: 1 file at 14:05"]);

        // Second cycle: 3000ms quiet after the queued event, then 5000ms publish
        sleep(Duration::from_millis(8000)).await;
        assert_eq!(
            recorder.messages(),
            vec![
                "[Auto] Add docs: 1 file at 14:05",
                "[Auto] Add config: 1 file at 14:05",
            ]
        );
        handle.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_armed_timer() {
        let recorder = Recorder::default();
        let (tx, handle) = start(&recorder);

        tx.send(ChangeEvent::added("a.ts")).unwrap();
        sleep(Duration::from_millis(1000)).await;
        handle.stop().await.unwrap();

        sleep(Duration::from_secs(10)).await;
        assert!(recorder.plans().is_empty());
        // Source was closed by the pipeline
        assert!(tx.send(ChangeEvent::added("b.ts")).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_end_stops_pipeline() {
        let recorder = Recorder::default();
        let (tx, handle) = start(&recorder);

        drop(tx);
        sleep(Duration::from_millis(10)).await;

        assert!(handle.is_finished());
        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_fire_with_nothing_pending() {
        let mut pipeline = Pipeline::new(Recorder::default(), PipelineConfig::default());

        assert!(pipeline.fire().await.is_none());
        assert_eq!(pipeline.pending(), 0);
    }

    #[tokio::test]
    async fn test_custom_prefix_and_debounce() {
        let recorder = Recorder::default();
        let config = PipelineConfig {
            debounce: Duration::from_millis(10),
            message_prefix: "[agent]".to_string(),
        };
        let mut pipeline = Pipeline::new(recorder.clone(), config).with_clock(fixed_clock);

        pipeline.record(&ChangeEvent::deleted("old.ts"));
        assert_eq!(pipeline.pending(), 1);

        let outcome = pipeline.fire().await.unwrap().unwrap();
        assert_eq!(outcome, PublishOutcome::Committed { push: PushResult::Pushed });
        assert_eq!(recorder.messages(), vec!["[agent] Remove code: 1 file at 14:05"]);
        assert_eq!(pipeline.pending(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_watched_directory_end_to_end() -> Result<()> {
        let temp_dir = tempfile::TempDir::new()?;
        let recorder = Recorder::default();
        let config = PipelineConfig {
            debounce: Duration::from_millis(300),
            ..PipelineConfig::default()
        };
        let watcher_config = WatcherConfig {
            stability_threshold: Duration::from_millis(50),
            poll_interval: Duration::from_millis(10),
            ..WatcherConfig::default()
        };

        let handle = Pipeline::new(recorder.clone(), config)
            .with_clock(fixed_clock)
            .watch(temp_dir.path(), watcher_config)?;

        std::fs::write(temp_dir.path().join("a.ts"), b"export {}")?;
        std::fs::write(temp_dir.path().join("b.ts"), b"export {}")?;
        std::fs::write(temp_dir.path().join("debug.log"), b"ignored")?;

        let deadline = Instant::now() + Duration::from_secs(10);
        while recorder.plans().is_empty() && Instant::now() < deadline {
            sleep(Duration::from_millis(50)).await;
        }

        let plans = recorder.plans();
        assert_eq!(plans.len(), 1);
        assert!(plans[0].change_count >= 2);
        assert!(plans[0].message.contains(" code: "), "{}", plans[0].message);
        assert!(plans[0].message.ends_with("at 14:05"));

        handle.stop().await
    }
}
