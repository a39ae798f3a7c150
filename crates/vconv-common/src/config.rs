//! Application configuration types.
//!
//! The top-level [`Config`] is deserialized from `vconv.toml` (see the root
//! crate's `config` module for file discovery). Every section defaults
//! sensibly so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tools: ToolsConfig,
    pub conversion: ConversionConfig,
    pub controller: ControllerConfig,
}

impl Config {
    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(ref p) = self.tools.ffmpeg_path {
            if !p.exists() {
                warnings.push(format!(
                    "tools.ffmpeg_path {} does not exist; falling back to PATH",
                    p.display()
                ));
            }
        }
        if let Some(ref p) = self.tools.ffprobe_path {
            if !p.exists() {
                warnings.push(format!(
                    "tools.ffprobe_path {} does not exist; falling back to PATH",
                    p.display()
                ));
            }
        }
        if let Some(ref dir) = self.conversion.output_dir {
            if !dir.is_dir() {
                warnings.push(format!(
                    "conversion.output_dir {} does not exist yet; it is created on first conversion",
                    dir.display()
                ));
            }
        }
        if self.controller.history_size == 0 {
            warnings.push("controller.history_size is 0; finished jobs are not kept".into());
        }

        warnings
    }

    /// Reject values the controller or engine cannot run with.
    pub fn check(&self) -> Result<()> {
        if self.controller.event_capacity == 0 {
            return Err(Error::config("controller.event_capacity must be at least 1"));
        }
        if self.conversion.timeout_secs == 0 {
            return Err(Error::config("conversion.timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ToolsConfig
// ---------------------------------------------------------------------------

/// Optional overrides for external tool locations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// ConversionConfig
// ---------------------------------------------------------------------------

/// Settings for the ffmpeg-backed conversion engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Directory for converted files. Defaults to the source file's directory.
    pub output_dir: Option<PathBuf>,
    /// Overwrite an existing output file instead of failing.
    pub overwrite: bool,
    /// Minimum interval between progress notifications.
    pub progress_interval_ms: u64,
    /// Maximum runtime of a single conversion.
    pub timeout_secs: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            overwrite: true,
            progress_interval_ms: 500,
            timeout_secs: 86_400,
        }
    }
}

// ---------------------------------------------------------------------------
// ControllerConfig
// ---------------------------------------------------------------------------

/// Settings for the job controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Buffer size of the progress broadcast channel.
    pub event_capacity: usize,
    /// Number of finished jobs kept in history.
    pub history_size: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            event_capacity: 256,
            history_size: 100,
        }
    }
}
