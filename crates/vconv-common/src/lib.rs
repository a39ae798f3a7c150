//! vconv-common: shared types, constants, and utilities.
//!
//! This crate provides the vocabulary used across vconv:
//!
//! - **Resolution profiles**: the fixed table of target output sizes
//! - **Job model**: [`ConversionJob`] and its [`JobState`] lifecycle
//! - **Progress events**: the record relayed to progress subscribers
//! - **Submission IDs**: monotonically increasing job identities
//! - **Path utilities**: accepted media extensions for file selection
//! - **Configuration**: serde types for the `vconv.toml` file
//! - **Error handling**: common error type and result alias
//!
//! # Examples
//!
//! ```
//! use vconv_common::{ResolutionProfile, Error, Result};
//! use vconv_common::paths::is_accepted_media_file;
//! use std::path::Path;
//!
//! let profile = ResolutionProfile::resolve("Hd").unwrap();
//! assert_eq!(profile.target_height(), Some(720));
//!
//! assert!(is_accepted_media_file(Path::new("clip.mkv")));
//!
//! fn example() -> Result<()> {
//!     Err(Error::invalid_input("empty path"))
//! }
//! assert!(example().is_err());
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod job;
pub mod paths;
pub mod profile;

pub use error::{Error, Result};
pub use events::ProgressEvent;
pub use ids::SubmissionId;
pub use job::{ConversionJob, JobProgress, JobState};
pub use profile::ResolutionProfile;
