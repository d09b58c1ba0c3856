//! File system watching for autocommit
//!
//! This crate turns raw notify events into a stream of `ChangeEvent`s:
//! - Paths relative to the watched root, `/`-separated
//! - Ignore rules (built-in, .autocommitignore, .gitignore, config)
//! - Per-path write stabilization (coalesces partial writes)

pub mod debounce;
pub mod ignore;

use anyhow::{Context, Result};
use autocommit_core::{ChangeAction, ChangeEvent};
use debounce::WriteStabilizer;
use crate::ignore::{IgnoreConfig, IgnoreRules};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Watcher configuration
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Quiet period before a path's change is emitted
    pub stability_threshold: Duration,

    /// How often settling paths are checked
    pub poll_interval: Duration,

    /// Ignore rule sources
    pub ignore: IgnoreConfig,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            stability_threshold: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(100),
            ignore: IgnoreConfig::default(),
        }
    }
}

/// Recursive file system watcher
///
/// Produces change events until stopped. A stopped watcher cannot be
/// restarted; start a new one instead.
pub struct FsWatcher {
    root: PathBuf,
    watcher: Option<RecommendedWatcher>,
    events: mpsc::UnboundedReceiver<ChangeEvent>,
    task: JoinHandle<()>,
}

impl FsWatcher {
    /// Start watching `root`
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(root: &Path, config: WatcherConfig) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Failed to resolve watch root {}", root.display()))?;
        let rules = IgnoreRules::load(&root, config.ignore.clone())
            .context("Failed to load ignore rules")?;

        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            // Receiver gone means the watcher is shutting down
            let _ = raw_tx.send(res);
        })
        .context("Failed to create file watcher")?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", root.display()))?;

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(stabilize(root.clone(), rules, config, raw_rx, out_tx));

        info!(root = %root.display(), "Started file watcher");

        Ok(Self {
            root,
            watcher: Some(watcher),
            events: out_rx,
            task,
        })
    }

    /// Next settled change, or None once the watcher has stopped
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Canonical watched root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stop watching
    ///
    /// Changes that have not been delivered yet are dropped.
    pub fn stop(&mut self) {
        if self.watcher.take().is_some() {
            self.task.abort();
            self.events.close();
            while self.events.try_recv().is_ok() {}
            info!(root = %self.root.display(), "Stopped file watcher");
        }
    }
}

impl Drop for FsWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Settle raw notify events into change events
async fn stabilize(
    root: PathBuf,
    mut rules: IgnoreRules,
    config: WatcherConfig,
    mut raw_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    out_tx: mpsc::UnboundedSender<ChangeEvent>,
) {
    let mut stabilizer = WriteStabilizer::new(config.stability_threshold);
    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            raw = raw_rx.recv() => {
                let event = match raw {
                    Some(Ok(event)) => event,
                    Some(Err(e)) => {
                        warn!("File watcher error: {}", e);
                        continue;
                    }
                    None => break,
                };

                if event.paths.iter().any(|p| IgnoreRules::is_ignore_file(p)) {
                    if let Err(e) = rules.reload_ignore_files() {
                        warn!("Failed to reload ignore files: {}", e);
                    }
                }

                let now = tokio::time::Instant::now();
                for change in translate(&event, &root, &rules) {
                    debug!(action = %change.action, path = %change.path, "Raw change");
                    stabilizer.observe(change, now);
                }
            }
            _ = ticker.tick(), if !stabilizer.is_empty() => {
                for change in stabilizer.take_stable(tokio::time::Instant::now()) {
                    if out_tx.send(change).is_err() {
                        return;
                    }
                }
            }
        }
    }
}

/// Map one notify event to change events under `root`
///
/// Directory events, access and metadata-only notifications are dropped.
pub fn translate(event: &Event, root: &Path, rules: &IgnoreRules) -> Vec<ChangeEvent> {
    let actions: Vec<(ChangeAction, &PathBuf)> = match event.kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => vec![],
        EventKind::Create(_) => tag(ChangeAction::Added, &event.paths),
        EventKind::Remove(_) => tag(ChangeAction::Deleted, &event.paths),
        EventKind::Modify(ModifyKind::Metadata(_)) => vec![],
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => tag(ChangeAction::Deleted, &event.paths),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => tag(ChangeAction::Added, &event.paths),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [from, to] => vec![(ChangeAction::Deleted, from), (ChangeAction::Added, to)],
            _ => vec![],
        },
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| {
                let action = if p.exists() { ChangeAction::Added } else { ChangeAction::Deleted };
                (action, p)
            })
            .collect(),
        EventKind::Modify(_) => tag(ChangeAction::Modified, &event.paths),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => vec![],
    };

    actions
        .into_iter()
        .filter(|(_, path)| !path.is_dir())
        .filter_map(|(action, path)| {
            let rel = relative_to(root, path)?;
            if rules.should_ignore(&rel) {
                return None;
            }
            Some(ChangeEvent::new(action, to_slash(&rel)))
        })
        .collect()
}

fn tag(action: ChangeAction, paths: &[PathBuf]) -> Vec<(ChangeAction, &PathBuf)> {
    paths.iter().map(|p| (action, p)).collect()
}

fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    let rel = path.strip_prefix(root).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    Some(rel.to_path_buf())
}

/// Render a relative path with `/` separators
fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
