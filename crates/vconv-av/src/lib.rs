//! # vconv-av
//!
//! Conversion engine contract and the ffmpeg-backed engine.
//!
//! This crate provides:
//!
//! - **Engine contract** ([`ConversionEngine`]) -- the typed boundary between
//!   the job controller and whatever performs the transcode: start a run,
//!   receive progress, receive exactly one terminal outcome, cancel.
//! - **ffmpeg engine** ([`FfmpegEngine`]) -- implements the contract by
//!   driving the external `ffmpeg` binary.
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg
//!   and ffprobe.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout and
//!   cancellation support for running external processes.
//! - **Progress parsing** ([`progress`]) -- turn ffmpeg `-progress` output into
//!   percentage and ETA estimates.

pub mod command;
pub mod engine;
pub mod ffmpeg;
pub mod probe;
pub mod progress;
pub mod tools;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use engine::{
    CancelHandle, ConversionEngine, EngineEvent, EngineOutcome, EngineProgress, EngineRequest,
    EngineRun,
};
pub use ffmpeg::{FfmpegEngine, FfmpegSettings};
pub use progress::{format_eta, ProgressParser, ProgressSample};
pub use tools::{ToolInfo, ToolRegistry};
