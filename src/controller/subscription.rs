//! Progress subscriptions.
//!
//! Both forms are released by dropping them; a subscriber registered after an
//! event was broadcast never sees that event.

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tokio::task::JoinHandle;

use vconv_common::ProgressEvent;

/// A pull-based stream of progress events.
#[derive(Debug)]
pub struct ProgressSubscription {
    rx: broadcast::Receiver<ProgressEvent>,
}

impl ProgressSubscription {
    pub(crate) fn new(rx: broadcast::Receiver<ProgressEvent>) -> Self {
        Self { rx }
    }

    /// Wait for the next event. Returns `None` once the controller is gone.
    ///
    /// A subscriber that falls more than `controller.event_capacity` events
    /// behind skips the oldest ones and keeps going.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Progress subscriber lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-delivered event, without waiting.
    pub fn try_recv(&mut self) -> Option<ProgressEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("Progress subscriber lagged, skipped {} events", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

/// A callback registration created by
/// [`JobController::on_progress`](super::JobController::on_progress).
///
/// The forwarding task stops when this value is dropped.
#[derive(Debug)]
#[must_use = "dropping a Subscription unregisters its handler"]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn spawn<F>(mut events: ProgressSubscription, mut handler: F) -> Self
    where
        F: FnMut(ProgressEvent) + Send + 'static,
    {
        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                handler(event);
            }
        });
        Self { task }
    }

    /// Whether the handler is still receiving events.
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
