//! Common error types used throughout vconv.
//!
//! Input validation errors are raised synchronously by the job controller,
//! engine failures travel through the job's terminal state, and tool errors
//! are produced by the ffmpeg-backed engine.

use std::path::PathBuf;

use crate::ids::SubmissionId;

/// Common error type for vconv.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input was provided (empty path, unknown profile, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A conversion is already pending or running in this controller.
    #[error("A conversion is already in progress (submission {active})")]
    JobAlreadyInProgress {
        /// The submission currently occupying the job slot.
        active: SubmissionId,
    },

    /// The conversion engine reported a failure. The reason is opaque.
    #[error("Conversion failed: {0}")]
    Engine(String),

    /// An external tool is missing or returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// The specified file was not found.
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The operation was cancelled before it finished.
    #[error("Cancelled")]
    Cancelled,

    /// Configuration could not be loaded or is invalid.
    #[error("Config error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Engine error.
    pub fn engine<S: Into<String>>(reason: S) -> Self {
        Self::Engine(reason.into())
    }

    /// Create a new Tool error.
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a new FileNotFound error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a new Config error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error was raised synchronously by input validation,
    /// before any engine work was started.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::JobAlreadyInProgress { .. }
        )
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_input("empty path");
        assert_eq!(err.to_string(), "Invalid input: empty path");

        let err = Error::JobAlreadyInProgress {
            active: SubmissionId::new(3),
        };
        assert_eq!(
            err.to_string(),
            "A conversion is already in progress (submission #3)"
        );

        let err = Error::engine("ffmpeg exited with status 1");
        assert_eq!(err.to_string(), "Conversion failed: ffmpeg exited with status 1");

        let err = Error::tool("ffmpeg", "not found");
        assert_eq!(err.to_string(), "Tool error [ffmpeg]: not found");

        let err = Error::file_not_found("/videos/missing.mp4");
        assert_eq!(err.to_string(), "File not found: /videos/missing.mp4");

        let err = Error::Cancelled;
        assert_eq!(err.to_string(), "Cancelled");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_is_rejection() {
        assert!(Error::invalid_input("x").is_rejection());
        assert!(Error::JobAlreadyInProgress {
            active: SubmissionId::new(1)
        }
        .is_rejection());
        assert!(!Error::engine("boom").is_rejection());
        assert!(!Error::Cancelled.is_rejection());
    }
}
