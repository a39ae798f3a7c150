//! ffmpeg-backed [`ConversionEngine`].
//!
//! Each run spawns `ffmpeg` with `-progress pipe:1`, parses the progress
//! blocks into ETA/percentage notifications, and finishes with exactly one
//! outcome. Cancelling a run kills the child process.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::mpsc;

use vconv_common::config::ConversionConfig;
use vconv_common::{Error, ResolutionProfile, Result};

use crate::command::ToolCommand;
use crate::engine::{
    CancelHandle, ConversionEngine, EngineEvent, EngineOutcome, EngineProgress, EngineRequest,
    EngineRun,
};
use crate::probe::probe_duration;
use crate::progress::ProgressParser;
use crate::tools::ToolRegistry;

/// Runtime settings for [`FfmpegEngine`].
#[derive(Debug, Clone)]
pub struct FfmpegSettings {
    /// Directory for converted files; `None` writes next to the source.
    pub output_dir: Option<PathBuf>,
    /// Pass `-y` (overwrite) instead of `-n` (fail if the output exists).
    pub overwrite: bool,
    /// Minimum interval between progress notifications.
    pub progress_interval: Duration,
    /// Maximum runtime of a single conversion.
    pub timeout: Duration,
}

impl Default for FfmpegSettings {
    fn default() -> Self {
        Self::from(&ConversionConfig::default())
    }
}

impl From<&ConversionConfig> for FfmpegSettings {
    fn from(config: &ConversionConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            overwrite: config.overwrite,
            progress_interval: Duration::from_millis(config.progress_interval_ms),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Conversion engine driving the external `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    tools: ToolRegistry,
    settings: FfmpegSettings,
}

impl FfmpegEngine {
    pub fn new(tools: ToolRegistry, settings: FfmpegSettings) -> Self {
        Self { tools, settings }
    }

    pub fn settings(&self) -> &FfmpegSettings {
        &self.settings
    }

    async fn source_duration(&self, source: &Path) -> Option<Duration> {
        let ffprobe = self.tools.get("ffprobe")?;
        match probe_duration(ffprobe, source).await {
            Ok(duration) => Some(duration),
            Err(e) => {
                tracing::warn!("Could not probe duration of {:?}: {}", source, e);
                None
            }
        }
    }
}

#[async_trait]
impl ConversionEngine for FfmpegEngine {
    async fn start(&self, request: EngineRequest) -> Result<EngineRun> {
        if !request.source.is_file() {
            return Err(Error::file_not_found(&request.source));
        }
        let ffmpeg = self.tools.require("ffmpeg")?.to_path_buf();

        let duration = self.source_duration(&request.source).await;
        let output = output_path_for(&request.source, self.settings.output_dir.as_deref());
        if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.is_dir() {
                tracing::debug!("Creating output directory {:?}", dir);
                tokio::fs::create_dir_all(dir).await?;
            }
        }

        let mut cmd = ToolCommand::new(ffmpeg);
        cmd.timeout(self.settings.timeout);
        cmd.args(build_args(
            &request.source,
            &output,
            request.profile,
            self.settings.overwrite,
        ));

        tracing::info!(
            "ffmpeg encode: {:?} -> {:?} (profile={}, duration={:?})",
            request.source,
            output,
            request.profile,
            duration
        );
        tracing::debug!("ffmpeg args: {:?}", cmd.get_args());

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancelHandle::new();
        let token = cancel.token();
        let interval = self.settings.progress_interval;

        tokio::spawn(async move {
            let mut parser = ProgressParser::new(duration);
            let mut last_sent: Option<Instant> = None;

            let result = cmd
                .execute_streaming(
                    |line| {
                        let Some(sample) = parser.feed(line) else {
                            return;
                        };
                        // Throttle, but always report the final block.
                        let due = last_sent.map_or(true, |t| t.elapsed() >= interval);
                        if due || sample.finished {
                            last_sent = Some(Instant::now());
                            let _ = tx.send(EngineEvent::Progress(EngineProgress::new(
                                sample.eta_string(),
                                sample.percent,
                            )));
                        }
                    },
                    Some(token),
                )
                .await;

            let outcome = match result {
                Ok(_) => EngineOutcome::Success { output },
                Err(Error::Cancelled) => EngineOutcome::cancelled(),
                Err(e) => EngineOutcome::failure(e.to_string()),
            };
            let _ = tx.send(EngineEvent::Finished(outcome));
        });

        Ok(EngineRun::new(rx, cancel))
    }
}

/// Where the converted file goes: `<dir>/<stem>.mp4`, or
/// `<dir>/<stem>-converted.mp4` when that would overwrite the source.
pub fn output_path_for(source: &Path, output_dir: Option<&Path>) -> PathBuf {
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| source.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let candidate = dir.join(format!("{stem}.mp4"));
    if candidate == source {
        dir.join(format!("{stem}-converted.mp4"))
    } else {
        candidate
    }
}

/// The `-vf` scale filter for a profile. Width follows the aspect ratio and
/// is kept divisible by two.
pub fn scale_filter(profile: ResolutionProfile) -> Option<String> {
    profile.target_height().map(|h| format!("scale=-2:{h}"))
}

/// Full ffmpeg argument list for one conversion.
pub fn build_args(
    source: &Path,
    output: &Path,
    profile: ResolutionProfile,
    overwrite: bool,
) -> Vec<String> {
    let mut args: Vec<String> = [
        "-hide_banner",
        "-nostdin",
        "-loglevel",
        "error",
        if overwrite { "-y" } else { "-n" },
        "-progress",
        "pipe:1",
        "-nostats",
        "-i",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    args.push(source.to_string_lossy().to_string());

    if let Some(filter) = scale_filter(profile) {
        args.push("-vf".to_string());
        args.push(filter);
    }

    args.push(output.to_string_lossy().to_string());
    args
}
