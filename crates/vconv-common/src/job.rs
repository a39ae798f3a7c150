use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ids::SubmissionId;
use crate::profile::ResolutionProfile;

/// One requested transcode, tracked from submission to a terminal state.
///
/// Transition methods return `false` and leave the job untouched when the
/// transition is not valid from the current state. Terminal states are
/// absorbing: only a fresh submission creates a new job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionJob {
    pub submission: SubmissionId,
    pub source_path: PathBuf,
    pub file_name: String,
    pub profile: ResolutionProfile,
    pub state: JobState,
    /// Latest progress estimate; present only while running.
    pub progress: Option<JobProgress>,
    pub output_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed(String),
    Cancelled,
}

impl JobState {
    /// Succeeded, failed, and cancelled jobs accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed(_) | JobState::Cancelled
        )
    }

    /// Pending and running jobs occupy the controller's job slot.
    pub fn is_active(&self) -> bool {
        matches!(self, JobState::Pending | JobState::Running)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Pending => f.write_str("pending"),
            JobState::Running => f.write_str("running"),
            JobState::Succeeded => f.write_str("succeeded"),
            JobState::Failed(reason) => write!(f, "failed: {reason}"),
            JobState::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobProgress {
    /// Estimated time remaining (`MM:SS`, `H:MM:SS`, or `unknown`).
    pub eta: String,
    /// Completion percentage in `0.0..=100.0`, when known.
    pub percent: Option<f32>,
    pub updated_at: DateTime<Utc>,
}

impl ConversionJob {
    pub fn new(submission: SubmissionId, source_path: PathBuf, profile: ResolutionProfile) -> Self {
        let file_name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            submission,
            source_path,
            file_name,
            profile,
            state: JobState::Pending,
            progress: None,
            output_path: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn start(&mut self) -> bool {
        if self.state != JobState::Pending {
            return false;
        }
        self.state = JobState::Running;
        self.started_at = Some(Utc::now());
        true
    }

    pub fn update_progress(&mut self, eta: &str, percent: Option<f32>) -> bool {
        if self.state != JobState::Running {
            return false;
        }
        self.progress = Some(JobProgress {
            eta: eta.to_string(),
            percent: percent.map(|p| p.clamp(0.0, 100.0)),
            updated_at: Utc::now(),
        });
        true
    }

    pub fn succeed(&mut self, output_path: PathBuf) -> bool {
        if self.state != JobState::Running {
            return false;
        }
        self.state = JobState::Succeeded;
        self.output_path = Some(output_path);
        self.finish();
        true
    }

    /// Failure is valid from pending (engine refused to start) and running.
    pub fn fail(&mut self, reason: &str) -> bool {
        if !self.state.is_active() {
            return false;
        }
        self.state = JobState::Failed(reason.to_string());
        self.finish();
        true
    }

    pub fn cancel(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }
        self.state = JobState::Cancelled;
        self.finish();
        true
    }

    fn finish(&mut self) {
        self.progress = None;
        self.finished_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> ConversionJob {
        ConversionJob::new(
            SubmissionId::new(1),
            PathBuf::from("/videos/in.mp4"),
            ResolutionProfile::Hd,
        )
    }

    #[test]
    fn test_new_job_is_pending() {
        let job = job();
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.file_name, "in.mp4");
        assert!(job.progress.is_none());
        assert!(job.started_at.is_none());
    }

    #[test]
    fn test_happy_path() {
        let mut job = job();
        assert!(job.start());
        assert!(job.started_at.is_some());
        assert!(job.update_progress("00:10", Some(40.0)));
        assert_eq!(job.progress.as_ref().unwrap().eta, "00:10");
        assert!(job.succeed(PathBuf::from("/videos/in-converted.mp4")));
        assert_eq!(job.state, JobState::Succeeded);
        assert!(job.progress.is_none());
        assert!(job.finished_at.is_some());
        assert_eq!(
            job.output_path.as_deref(),
            Some(std::path::Path::new("/videos/in-converted.mp4"))
        );
    }

    #[test]
    fn test_progress_requires_running() {
        let mut job = job();
        assert!(!job.update_progress("00:05", None));
        assert!(job.progress.is_none());
    }

    #[test]
    fn test_progress_percent_is_clamped() {
        let mut job = job();
        job.start();
        job.update_progress("00:01", Some(140.0));
        assert_eq!(job.progress.unwrap().percent, Some(100.0));
    }

    #[test]
    fn test_terminal_states_are_absorbing() {
        let mut job = job();
        job.start();
        assert!(job.cancel());
        assert!(!job.succeed(PathBuf::from("/out.mp4")));
        assert!(!job.fail("late"));
        assert!(!job.cancel());
        assert!(!job.update_progress("00:01", None));
        assert_eq!(job.state, JobState::Cancelled);
    }

    #[test]
    fn test_fail_from_pending() {
        let mut job = job();
        assert!(job.fail("ffmpeg not found"));
        assert_eq!(job.state, JobState::Failed("ffmpeg not found".into()));
        assert!(!job.start());
    }

    #[test]
    fn test_succeed_requires_running() {
        let mut job = job();
        assert!(!job.succeed(PathBuf::from("/out.mp4")));
        assert_eq!(job.state, JobState::Pending);
    }

    #[test]
    fn test_state_predicates() {
        assert!(JobState::Pending.is_active());
        assert!(JobState::Running.is_active());
        assert!(JobState::Succeeded.is_terminal());
        assert!(JobState::Failed("x".into()).is_terminal());
        assert!(JobState::Cancelled.is_terminal());
        assert!(!JobState::Running.is_terminal());
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&JobState::Failed("disk full".into())).unwrap();
        assert_eq!(json, r#"{"status":"failed","reason":"disk full"}"#);
        let json = serde_json::to_string(&JobState::Running).unwrap();
        assert_eq!(json, r#"{"status":"running"}"#);
    }
}
