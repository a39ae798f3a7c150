//! Shared test harness for integration tests.
//!
//! Provides [`MockEngine`], a scripted [`ConversionEngine`] that records every
//! `start` call and hands each accepted run to the test as a [`MockRun`], so
//! tests decide exactly which progress and terminal events the controller
//! sees and when.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};

use vconv::JobController;
use vconv_av::{
    CancelHandle, ConversionEngine, EngineEvent, EngineOutcome, EngineProgress, EngineRequest,
    EngineRun,
};
use vconv_common::{Error, Result};

/// Test-side control of one accepted engine run.
#[derive(Clone)]
pub struct MockRun {
    tx: mpsc::UnboundedSender<EngineEvent>,
    cancel: CancelHandle,
}

impl MockRun {
    pub fn progress(&self, eta: &str, percent: Option<f32>) {
        let _ = self
            .tx
            .send(EngineEvent::Progress(EngineProgress::new(eta, percent)));
    }

    pub fn succeed(&self, output: impl Into<PathBuf>) {
        let _ = self.tx.send(EngineEvent::Finished(EngineOutcome::Success {
            output: output.into(),
        }));
    }

    pub fn fail(&self, reason: &str) {
        let _ = self
            .tx
            .send(EngineEvent::Finished(EngineOutcome::failure(reason)));
    }

    /// Whether the controller asked this run to stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[derive(Default)]
pub struct MockEngine {
    starts: AtomicUsize,
    requests: Mutex<Vec<EngineRequest>>,
    runs: Mutex<Vec<MockRun>>,
    refusal: Mutex<Option<String>>,
    gate: Option<Arc<Notify>>,
    ack_cancel: bool,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Engine that answers cancellation with `Failure("cancelled")`, like
    /// the ffmpeg engine does.
    pub fn acknowledging_cancel() -> Arc<Self> {
        Arc::new(Self {
            ack_cancel: true,
            ..Self::default()
        })
    }

    /// Engine whose `start` blocks until the returned [`Notify`] fires,
    /// keeping the job Pending in the meantime.
    pub fn gated() -> (Arc<Self>, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let engine = Arc::new(Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        });
        (engine, gate)
    }

    /// Make subsequent `start` calls fail with `reason`.
    pub fn refuse_with(&self, reason: &str) {
        *self.refusal.lock() = Some(reason.to_string());
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<EngineRequest> {
        self.requests.lock().clone()
    }

    /// Control for the `index`-th accepted run.
    pub fn run(&self, index: usize) -> MockRun {
        self.runs.lock()[index].clone()
    }

    pub fn last_run(&self) -> MockRun {
        self.runs
            .lock()
            .last()
            .cloned()
            .expect("no run has been started")
    }

    /// Drop the engine's senders for every run, closing their event streams.
    pub fn close_all(&self) {
        self.runs.lock().clear();
    }
}

#[async_trait]
impl ConversionEngine for MockEngine {
    async fn start(&self, request: EngineRequest) -> Result<EngineRun> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(reason) = self.refusal.lock().clone() {
            return Err(Error::engine(reason));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancelHandle::new();

        if self.ack_cancel {
            let token = cancel.token();
            let ack = tx.clone();
            tokio::spawn(async move {
                token.cancelled().await;
                let _ = ack.send(EngineEvent::Finished(EngineOutcome::cancelled()));
            });
        }

        self.runs.lock().push(MockRun {
            tx,
            cancel: cancel.clone(),
        });
        Ok(EngineRun::new(rx, cancel))
    }
}

/// Controller backed by a fresh [`MockEngine`].
pub fn controller() -> (JobController, Arc<MockEngine>) {
    let engine = MockEngine::new();
    (JobController::new(engine.clone()), engine)
}

/// Poll `condition` until it holds, panicking after two seconds.
pub async fn eventually<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
