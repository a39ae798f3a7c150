use std::path::{Path, PathBuf};

use tokio::sync::watch;

use vconv_common::{JobState, ResolutionProfile, SubmissionId};

/// Caller-side view of one accepted submission.
///
/// The handle only observes; cancelling goes through the controller.
#[derive(Debug, Clone)]
pub struct JobHandle {
    submission: SubmissionId,
    profile: ResolutionProfile,
    source_path: PathBuf,
    state: watch::Receiver<JobState>,
}

impl JobHandle {
    pub(crate) fn new(
        submission: SubmissionId,
        profile: ResolutionProfile,
        source_path: PathBuf,
        state: watch::Receiver<JobState>,
    ) -> Self {
        Self {
            submission,
            profile,
            source_path,
            state,
        }
    }

    pub fn submission(&self) -> SubmissionId {
        self.submission
    }

    pub fn profile(&self) -> ResolutionProfile {
        self.profile
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Current state of this submission. Does not wait.
    pub fn state(&self) -> JobState {
        self.state.borrow().clone()
    }

    /// Wait until the job reaches a terminal state and return it.
    pub async fn wait(&self) -> JobState {
        let mut rx = self.state.clone();
        let reached = rx.wait_for(JobState::is_terminal).await.map(|s| s.clone());
        // Sender gone means the controller was dropped; report the last state.
        reached.unwrap_or_else(|_| rx.borrow().clone())
    }
}
