//! Submission identifiers.
//!
//! Every accepted `submit` call receives the next number from a controller's
//! sequence. Events carry the number of the submission they belong to, which
//! is how stale engine callbacks are told apart from the active job even when
//! two submissions share a source path.

use serde::{Deserialize, Serialize};

/// Monotonically increasing identity of a conversion submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(u64);

impl SubmissionId {
    /// Wrap a raw sequence number.
    #[must_use]
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// The raw sequence number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for SubmissionId {
    fn from(seq: u64) -> Self {
        Self(seq)
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(SubmissionId::new(42).to_string(), "#42");
    }

    #[test]
    fn test_ordering_follows_sequence() {
        assert!(SubmissionId::new(1) < SubmissionId::new(2));
        assert_eq!(SubmissionId::from(7).get(), 7);
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&SubmissionId::new(5)).unwrap();
        assert_eq!(json, "5");
        let back: SubmissionId = serde_json::from_str("5").unwrap();
        assert_eq!(back, SubmissionId::new(5));
    }
}
