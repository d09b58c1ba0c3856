//! Where a pipeline's change events come from

use async_trait::async_trait;
use autocommit_core::ChangeEvent;
use tokio::sync::mpsc;
use watcher::FsWatcher;

/// A stream of change events owned by one pipeline
#[async_trait]
pub trait ChangeSource: Send {
    /// Next change, or None once the source is exhausted
    async fn next(&mut self) -> Option<ChangeEvent>;

    /// Stop producing events
    fn close(&mut self);
}

#[async_trait]
impl ChangeSource for FsWatcher {
    async fn next(&mut self) -> Option<ChangeEvent> {
        FsWatcher::next(self).await
    }

    fn close(&mut self) {
        self.stop();
    }
}

#[async_trait]
impl ChangeSource for mpsc::UnboundedReceiver<ChangeEvent> {
    async fn next(&mut self) -> Option<ChangeEvent> {
        self.recv().await
    }

    fn close(&mut self) {
        mpsc::UnboundedReceiver::close(self);
    }
}
