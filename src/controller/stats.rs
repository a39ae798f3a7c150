use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of controller counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerStats {
    /// Submissions accepted into the job slot.
    pub submitted: u64,
    /// Submissions refused before reaching the engine.
    pub rejected: u64,
    /// Progress events applied and broadcast to subscribers.
    pub progress_relayed: u64,
    /// Engine events dropped because their job was superseded or finished.
    pub stale_events_ignored: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub cancelled: u64,
}

impl ControllerStats {
    /// Jobs that reached any terminal state.
    pub fn finished(&self) -> u64 {
        self.succeeded + self.failed + self.cancelled
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub submitted: AtomicU64,
    pub rejected: AtomicU64,
    pub progress_relayed: AtomicU64,
    pub stale_events_ignored: AtomicU64,
    pub succeeded: AtomicU64,
    pub failed: AtomicU64,
    pub cancelled: AtomicU64,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ControllerStats {
        ControllerStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            progress_relayed: self.progress_relayed.load(Ordering::Relaxed),
            stale_events_ignored: self.stale_events_ignored.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}
