//! Conversion engine contract.
//!
//! An engine accepts a [`EngineRequest`], starts work without blocking the
//! caller, and hands back an [`EngineRun`]: a stream of [`EngineEvent`]s and a
//! [`CancelHandle`]. A well-behaved engine delivers zero or more
//! [`EngineEvent::Progress`] notifications followed by exactly one
//! [`EngineEvent::Finished`]. Consumers must still tolerate engines that break
//! this (progress after the outcome, a second outcome, or a closed stream
//! with no outcome at all).

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use vconv_common::{ResolutionProfile, Result};

/// Reason reported by engines for runs stopped through their [`CancelHandle`].
pub const CANCELLED_REASON: &str = "cancelled";

/// What to convert and to which profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRequest {
    pub source: PathBuf,
    pub profile: ResolutionProfile,
}

impl EngineRequest {
    pub fn new(source: impl Into<PathBuf>, profile: ResolutionProfile) -> Self {
        Self {
            source: source.into(),
            profile,
        }
    }
}

/// A progress notification from the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineProgress {
    /// Estimated time remaining (`MM:SS`, `H:MM:SS`, or `unknown`).
    pub eta: String,
    /// Completion percentage, when known.
    pub percent: Option<f32>,
}

impl EngineProgress {
    pub fn new(eta: impl Into<String>, percent: Option<f32>) -> Self {
        Self {
            eta: eta.into(),
            percent,
        }
    }
}

/// Terminal outcome of an engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutcome {
    Success { output: PathBuf },
    /// Opaque, human-readable reason. Cancelled runs report
    /// [`CANCELLED_REASON`].
    Failure(String),
}

impl EngineOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        EngineOutcome::Failure(reason.into())
    }

    pub fn cancelled() -> Self {
        EngineOutcome::Failure(CANCELLED_REASON.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Progress(EngineProgress),
    Finished(EngineOutcome),
}

/// Best-effort, idempotent cancellation of an engine run.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the engine to stop. Calling this more than once is harmless.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The token the engine's worker observes.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl From<CancellationToken> for CancelHandle {
    fn from(token: CancellationToken) -> Self {
        Self { token }
    }
}

/// An accepted engine run.
#[derive(Debug)]
pub struct EngineRun {
    pub events: mpsc::UnboundedReceiver<EngineEvent>,
    pub cancel: CancelHandle,
}

impl EngineRun {
    pub fn new(events: mpsc::UnboundedReceiver<EngineEvent>, cancel: CancelHandle) -> Self {
        Self { events, cancel }
    }
}

/// The backend that performs conversions.
///
/// `start` must return as soon as the work has been accepted (or refused);
/// the conversion itself runs on the engine's own task or process.
#[async_trait]
pub trait ConversionEngine: Send + Sync {
    async fn start(&self, request: EngineRequest) -> Result<EngineRun>;
}
