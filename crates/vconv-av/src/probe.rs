//! Source duration probing via ffprobe.

use std::path::Path;
use std::time::Duration;

use vconv_common::{Error, Result};

use crate::command::ToolCommand;

/// Probe timeout; probing only reads container headers.
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Read a media file's duration with ffprobe.
pub async fn probe_duration(ffprobe: &Path, source: &Path) -> Result<Duration> {
    let output = ToolCommand::new(ffprobe.to_path_buf())
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(source.to_string_lossy())
        .timeout(PROBE_TIMEOUT)
        .execute()
        .await?;

    parse_duration(&output.stdout)
        .ok_or_else(|| Error::tool("ffprobe", format!("no duration in output: {}", output.stdout.trim())))
}

/// Parse the seconds value printed by ffprobe (`"12.345000"`).
fn parse_duration(stdout: &str) -> Option<Duration> {
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())?
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(Duration::from_secs_f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_values() {
        assert_eq!(parse_duration("12.500000\n"), Some(Duration::from_millis(12_500)));
        assert_eq!(parse_duration("\n  7200.0 \n"), Some(Duration::from_secs(7200)));
        assert_eq!(parse_duration("N/A\n"), None);
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("0.000000"), None);
    }

    #[tokio::test]
    async fn probe_missing_tool_is_tool_error() {
        let result = probe_duration(
            Path::new("/nonexistent/ffprobe_xyz"),
            Path::new("/videos/in.mp4"),
        )
        .await;
        assert!(matches!(result, Err(Error::Tool { .. })));
    }
}
