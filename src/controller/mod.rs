//! Single-slot job controller.
//!
//! The [`JobController`] owns at most one [`ConversionJob`]. It validates
//! submissions, hands accepted ones to a [`ConversionEngine`], relays the
//! engine's progress to subscribers and drives the job to exactly one
//! terminal state. Engine events that belong to a superseded or already
//! finished submission are dropped and counted in [`ControllerStats`].
//!
//! Every transition happens under the slot's write lock. Progress events are
//! broadcast while that lock is held, so no progress for a submission is
//! published after its terminal transition.

mod handle;
mod stats;
mod subscription;

pub use handle::JobHandle;
pub use stats::ControllerStats;
pub use subscription::{ProgressSubscription, Subscription};

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc, watch};

use vconv_av::{CancelHandle, ConversionEngine, EngineEvent, EngineOutcome, EngineProgress, EngineRequest};
use vconv_common::config::ControllerConfig;
use vconv_common::{ConversionJob, Error, JobState, ProgressEvent, ResolutionProfile, Result, SubmissionId};

use stats::Counters;

/// Failure reason for runs whose event stream ended without an outcome.
pub const ENGINE_VANISHED_REASON: &str = "engine stopped without reporting an outcome";

/// The job slot: the tracked job plus what is needed to publish its state
/// and stop its engine run.
#[derive(Default)]
struct Slot {
    job: Option<ConversionJob>,
    state_tx: Option<watch::Sender<JobState>>,
    cancel: Option<CancelHandle>,
}

impl Slot {
    fn tracks(&self, submission: SubmissionId) -> bool {
        self.job.as_ref().is_some_and(|j| j.submission == submission)
    }
}

fn publish(state_tx: &Option<watch::Sender<JobState>>, state: &JobState) {
    if let Some(tx) = state_tx {
        tx.send_replace(state.clone());
    }
}

struct Inner {
    engine: Arc<dyn ConversionEngine>,
    slot: RwLock<Slot>,
    next_submission: AtomicU64,
    progress_tx: broadcast::Sender<ProgressEvent>,
    history: RwLock<VecDeque<ConversionJob>>,
    history_size: usize,
    counters: Counters,
}

/// Accepts conversion requests one at a time and tracks the active job.
///
/// Cloning is cheap; clones share the same slot.
#[derive(Clone)]
pub struct JobController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for JobController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobController")
            .field("job", &self.inner.slot.read().job)
            .field("stats", &self.inner.counters.snapshot())
            .finish()
    }
}

impl JobController {
    pub fn new(engine: Arc<dyn ConversionEngine>) -> Self {
        Self::with_config(engine, &ControllerConfig::default())
    }

    pub fn with_config(engine: Arc<dyn ConversionEngine>, config: &ControllerConfig) -> Self {
        let (progress_tx, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                engine,
                slot: RwLock::new(Slot::default()),
                next_submission: AtomicU64::new(0),
                progress_tx,
                history: RwLock::new(VecDeque::new()),
                history_size: config.history_size,
                counters: Counters::default(),
            }),
        }
    }

    /// Submit a conversion of `source_path` to the profile named by
    /// `profile` (an empty identifier keeps the source resolution).
    ///
    /// Resolves once the engine has accepted or refused the work.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for an empty path or unknown profile; the
    ///   engine is not called.
    /// - [`Error::JobAlreadyInProgress`] while another job is pending or
    ///   running; that job is left untouched.
    /// - [`Error::Engine`] when the engine refuses to start. The job is
    ///   recorded as failed.
    pub async fn submit(&self, source_path: impl AsRef<Path>, profile: &str) -> Result<JobHandle> {
        let source_path = source_path.as_ref();
        if source_path.as_os_str().is_empty() {
            return Err(self.reject(Error::invalid_input("source path is empty")));
        }
        let profile = ResolutionProfile::resolve(profile).map_err(|e| self.reject(e))?;

        let (submission, state_rx) = self
            .inner
            .claim_slot(source_path, profile)
            .map_err(|e| self.reject(e))?;
        let handle = JobHandle::new(submission, profile, source_path.to_path_buf(), state_rx);

        tracing::info!(
            submission = %submission,
            profile = %profile,
            "Submitting conversion of {:?}",
            source_path
        );

        // Start on a separate task so a dropped submit future cannot strand
        // the job in Pending.
        let inner = Arc::clone(&self.inner);
        let request = EngineRequest::new(source_path, profile);
        tokio::spawn(async move { inner.launch(submission, request).await })
            .await
            .map_err(|e| Error::internal(format!("engine start task failed: {e}")))??;

        Ok(handle)
    }

    /// Register a pull-based progress subscriber.
    pub fn subscribe(&self) -> ProgressSubscription {
        ProgressSubscription::new(self.inner.progress_tx.subscribe())
    }

    /// Call `handler` for every subsequent progress event until the returned
    /// [`Subscription`] is dropped. Must be called within a Tokio runtime.
    pub fn on_progress<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(ProgressEvent) + Send + 'static,
    {
        Subscription::spawn(self.subscribe(), handler)
    }

    /// Cancel the active job. Returns `false` when there is nothing to
    /// cancel (no job, or the job already finished).
    ///
    /// The job is `Cancelled` when this returns; the engine is told to stop
    /// and whatever it reports afterwards is ignored.
    pub fn cancel(&self) -> bool {
        let mut guard = self.inner.slot.write();
        let Slot {
            job,
            state_tx,
            cancel,
        } = &mut *guard;

        let Some(job) = job.as_mut() else {
            tracing::debug!("Cancel requested with no job in the slot");
            return false;
        };
        if !job.cancel() {
            tracing::debug!(submission = %job.submission, "Cancel ignored, job is {}", job.state);
            return false;
        }

        if let Some(handle) = cancel.take() {
            handle.cancel();
        }
        Counters::bump(&self.inner.counters.cancelled);
        publish(state_tx, &job.state);
        tracing::info!(submission = %job.submission, "Conversion cancelled");
        true
    }

    /// Snapshot of the tracked job, if any.
    pub fn current_state(&self) -> Option<ConversionJob> {
        self.inner.slot.read().job.clone()
    }

    /// Move a finished job to history and clear the slot. Returns the job,
    /// or `None` if the slot is empty or the job is still active.
    pub fn acknowledge(&self) -> Option<ConversionJob> {
        let mut slot = self.inner.slot.write();
        if !slot.job.as_ref().is_some_and(|j| j.state.is_terminal()) {
            return None;
        }
        let job = slot.job.take()?;
        slot.state_tx = None;
        slot.cancel = None;
        drop(slot);

        self.inner.archive(job.clone());
        Some(job)
    }

    /// Most recently archived jobs, newest first.
    pub fn history(&self, limit: usize) -> Vec<ConversionJob> {
        self.inner.history.read().iter().take(limit).cloned().collect()
    }

    pub fn stats(&self) -> ControllerStats {
        self.inner.counters.snapshot()
    }

    /// Count validation and slot rejections; other errors pass through.
    fn reject(&self, err: Error) -> Error {
        if err.is_rejection() {
            Counters::bump(&self.inner.counters.rejected);
            tracing::debug!("Submission rejected: {}", err);
        }
        err
    }
}

impl Inner {
    /// Put a fresh Pending job into the slot, archiving a finished one.
    fn claim_slot(
        &self,
        source_path: &Path,
        profile: ResolutionProfile,
    ) -> Result<(SubmissionId, watch::Receiver<JobState>)> {
        let mut slot = self.slot.write();

        if let Some(active) = slot.job.as_ref().filter(|j| j.state.is_active()) {
            return Err(Error::JobAlreadyInProgress {
                active: active.submission,
            });
        }

        if let Some(previous) = slot.job.take() {
            self.archive(previous);
        }

        let submission = SubmissionId::new(self.next_submission.fetch_add(1, Ordering::Relaxed) + 1);
        let (state_tx, state_rx) = watch::channel(JobState::Pending);
        *slot = Slot {
            job: Some(ConversionJob::new(submission, source_path.to_path_buf(), profile)),
            state_tx: Some(state_tx),
            cancel: None,
        };
        Counters::bump(&self.counters.submitted);

        Ok((submission, state_rx))
    }

    /// Ask the engine to start and move the job out of Pending.
    async fn launch(self: Arc<Self>, submission: SubmissionId, request: EngineRequest) -> Result<()> {
        match self.engine.start(request).await {
            Ok(run) => {
                if !self.mark_running(submission, &run.cancel) {
                    // Cancelled while the engine was starting.
                    tracing::debug!(submission = %submission, "Job left Pending before start; stopping run");
                    run.cancel.cancel();
                }
                tokio::spawn(Arc::clone(&self).relay(submission, run.events));
                Ok(())
            }
            Err(err) => {
                let reason = match err {
                    Error::Engine(reason) => reason,
                    other => other.to_string(),
                };
                if self.finish(submission, EngineOutcome::Failure(reason.clone())) {
                    tracing::debug!(submission = %submission, "Engine refused to start: {}", reason);
                    Err(Error::engine(reason))
                } else {
                    // Cancelled before the refusal arrived; cancellation stands.
                    Ok(())
                }
            }
        }
    }

    fn mark_running(&self, submission: SubmissionId, cancel: &CancelHandle) -> bool {
        let mut guard = self.slot.write();
        if !guard.tracks(submission) {
            return false;
        }
        let Slot {
            job,
            state_tx,
            cancel: slot_cancel,
        } = &mut *guard;
        let Some(job) = job.as_mut() else {
            return false;
        };
        if !job.start() {
            return false;
        }

        *slot_cancel = Some(cancel.clone());
        publish(state_tx, &job.state);
        tracing::info!(submission = %submission, "Conversion running");
        true
    }

    /// Apply engine events in the order the engine sent them.
    async fn relay(self: Arc<Self>, submission: SubmissionId, mut events: mpsc::UnboundedReceiver<EngineEvent>) {
        let mut finished = false;

        while let Some(event) = events.recv().await {
            match event {
                EngineEvent::Progress(progress) => self.apply_progress(submission, progress),
                EngineEvent::Finished(outcome) => {
                    if finished {
                        self.ignore_stale(submission, "duplicate outcome");
                    } else {
                        finished = true;
                        self.apply_outcome(submission, outcome);
                    }
                }
            }
        }

        if !finished {
            let applied = self.finish(submission, EngineOutcome::failure(ENGINE_VANISHED_REASON));
            if applied {
                tracing::error!(submission = %submission, "{}", ENGINE_VANISHED_REASON);
            }
        }
    }

    fn apply_progress(&self, submission: SubmissionId, progress: EngineProgress) {
        let mut slot = self.slot.write();
        let Some(job) = slot.job.as_mut().filter(|j| j.submission == submission) else {
            self.ignore_stale(submission, "progress for superseded job");
            return;
        };
        if !job.update_progress(&progress.eta, progress.percent) {
            self.ignore_stale(submission, "progress after job left Running");
            return;
        }

        let percent = job.progress.as_ref().and_then(|p| p.percent);
        // No receivers is not an error.
        let _ = self
            .progress_tx
            .send(ProgressEvent::new(submission, progress.eta, percent));
        Counters::bump(&self.counters.progress_relayed);
    }

    fn apply_outcome(&self, submission: SubmissionId, outcome: EngineOutcome) {
        if !self.finish(submission, outcome) {
            self.ignore_stale(submission, "outcome for finished or superseded job");
        }
    }

    /// Move the tracked job to the terminal state described by `outcome`.
    /// Returns `false` when the job is no longer the tracked one or already
    /// finished.
    fn finish(&self, submission: SubmissionId, outcome: EngineOutcome) -> bool {
        let mut guard = self.slot.write();
        let Slot {
            job,
            state_tx,
            cancel,
        } = &mut *guard;
        let Some(job) = job.as_mut().filter(|j| j.submission == submission) else {
            return false;
        };

        let applied = match outcome {
            EngineOutcome::Success { output } => job.succeed(output),
            EngineOutcome::Failure(reason) => job.fail(&reason),
        };
        if !applied {
            return false;
        }

        *cancel = None;
        publish(state_tx, &job.state);
        match &job.state {
            JobState::Succeeded => {
                Counters::bump(&self.counters.succeeded);
                tracing::info!(
                    submission = %submission,
                    "Conversion succeeded: {:?}",
                    job.output_path.as_deref().unwrap_or(Path::new(""))
                );
            }
            state => {
                Counters::bump(&self.counters.failed);
                tracing::error!(submission = %submission, "Conversion {}", state);
            }
        }
        true
    }

    fn ignore_stale(&self, submission: SubmissionId, what: &str) {
        Counters::bump(&self.counters.stale_events_ignored);
        tracing::debug!(submission = %submission, "Ignoring stale engine event: {}", what);
    }

    fn archive(&self, job: ConversionJob) {
        if self.history_size == 0 {
            return;
        }
        let mut history = self.history.write();
        history.push_front(job);
        history.truncate(self.history_size);
    }
}
