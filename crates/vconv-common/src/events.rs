//! Progress events relayed to subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::SubmissionId;

/// ETA string used when the remaining time cannot be estimated.
pub const UNKNOWN_ETA: &str = "unknown";

/// The most recent progress estimate for a running job.
///
/// Events are immutable once emitted and are only delivered while the job
/// they belong to is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Submission this estimate belongs to.
    pub submission: SubmissionId,
    /// Estimated time remaining (`MM:SS`, `H:MM:SS`, or `unknown`).
    pub eta: String,
    /// Completion percentage, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<f32>,
    /// When the controller relayed the estimate.
    pub emitted_at: DateTime<Utc>,
}

impl ProgressEvent {
    /// Create a new event stamped with the current time.
    pub fn new(submission: SubmissionId, eta: impl Into<String>, percent: Option<f32>) -> Self {
        Self {
            submission,
            eta: eta.into(),
            percent,
            emitted_at: Utc::now(),
        }
    }

    /// Whether the engine could not estimate the remaining time.
    pub fn eta_is_unknown(&self) -> bool {
        self.eta == UNKNOWN_ETA
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_without_missing_percent() {
        let event = ProgressEvent::new(SubmissionId::new(2), "00:10", None);
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["submission"], 2);
        assert_eq!(json["eta"], "00:10");
        assert!(json.get("percent").is_none());
    }

    #[test]
    fn unknown_eta() {
        let event = ProgressEvent::new(SubmissionId::new(1), UNKNOWN_ETA, Some(12.5));
        assert!(event.eta_is_unknown());
    }
}
