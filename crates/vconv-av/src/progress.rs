//! ffmpeg `-progress` output parsing and ETA estimation.
//!
//! With `-progress pipe:1` ffmpeg writes blocks of `key=value` lines, each
//! block terminated by `progress=continue` (or `progress=end` for the last
//! one). [`ProgressParser`] accumulates the keys it cares about and yields a
//! [`ProgressSample`] at the end of every block.

use std::time::Duration;

use vconv_common::events::UNKNOWN_ETA;

/// Progress derived from one ffmpeg progress block.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSample {
    /// Media time encoded so far.
    pub out_time: Duration,
    /// Completion percentage, when the source duration is known.
    pub percent: Option<f32>,
    /// Encoding speed relative to realtime (`1.0` = realtime).
    pub speed: Option<f64>,
    /// Estimated wall-clock time remaining.
    pub eta: Option<Duration>,
    /// Set on the final `progress=end` block.
    pub finished: bool,
}

impl ProgressSample {
    /// ETA formatted for progress events.
    pub fn eta_string(&self) -> String {
        match self.eta {
            Some(eta) => format_eta(eta),
            None => UNKNOWN_ETA.to_string(),
        }
    }
}

/// Stateful parser for ffmpeg `-progress` output.
#[derive(Debug, Clone, Default)]
pub struct ProgressParser {
    duration: Option<Duration>,
    out_time_us: Option<i64>,
    speed: Option<f64>,
}

impl ProgressParser {
    /// Create a parser. `duration` is the source duration used for
    /// percentage and ETA; without it the ETA is reported as unknown.
    pub fn new(duration: Option<Duration>) -> Self {
        Self {
            duration: duration.filter(|d| !d.is_zero()),
            out_time_us: None,
            speed: None,
        }
    }

    /// Feed one output line. Returns a sample when the line closes a block.
    pub fn feed(&mut self, line: &str) -> Option<ProgressSample> {
        let (key, value) = line.trim().split_once('=')?;
        let value = value.trim();

        match key {
            // ffmpeg reports out_time_ms in microseconds as well.
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.out_time_us = Some(us.max(0));
                }
                None
            }
            "speed" => {
                self.speed = parse_speed(value);
                None
            }
            "progress" => Some(self.sample(value == "end")),
            _ => None,
        }
    }

    fn sample(&self, finished: bool) -> ProgressSample {
        let out_time = Duration::from_micros(self.out_time_us.unwrap_or(0) as u64);

        let percent = if finished {
            Some(100.0)
        } else {
            self.duration.map(|total| {
                ((out_time.as_secs_f64() / total.as_secs_f64()) * 100.0).clamp(0.0, 100.0) as f32
            })
        };

        let eta = if finished {
            Some(Duration::ZERO)
        } else {
            match (self.duration, self.speed) {
                (Some(total), Some(speed)) if speed > 0.0 => {
                    let remaining = total.saturating_sub(out_time);
                    // Near-zero speeds overflow Duration; treat as unknown.
                    Duration::try_from_secs_f64(remaining.as_secs_f64() / speed).ok()
                }
                _ => None,
            }
        };

        ProgressSample {
            out_time,
            percent,
            speed: self.speed,
            eta,
            finished,
        }
    }
}

/// Parse ffmpeg's `speed=` value (`"1.53x"`, `" 0.9x"`, `"N/A"`).
pub fn parse_speed(value: &str) -> Option<f64> {
    value
        .trim()
        .trim_end_matches('x')
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s >= 0.0)
}

/// Format a remaining duration as `MM:SS`, or `H:MM:SS` from one hour up.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use vconv_av::format_eta;
///
/// assert_eq!(format_eta(Duration::from_secs(10)), "00:10");
/// assert_eq!(format_eta(Duration::from_secs(3725)), "1:02:05");
/// ```
pub fn format_eta(remaining: Duration) -> String {
    let total = remaining.as_secs_f64().round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: &str = "frame=240\nfps=48.0\nbitrate=1200.0kbits/s\nout_time_us=10000000\nout_time=00:00:10.000000\nspeed=2.0x\nprogress=continue\n";

    fn feed_all(parser: &mut ProgressParser, text: &str) -> Vec<ProgressSample> {
        text.lines().filter_map(|l| parser.feed(l)).collect()
    }

    #[test]
    fn block_yields_one_sample() {
        let mut parser = ProgressParser::new(Some(Duration::from_secs(40)));
        let samples = feed_all(&mut parser, BLOCK);
        assert_eq!(samples.len(), 1);

        let s = &samples[0];
        assert_eq!(s.out_time, Duration::from_secs(10));
        assert_eq!(s.percent, Some(25.0));
        assert_eq!(s.speed, Some(2.0));
        // 30s of media left at 2x.
        assert_eq!(s.eta, Some(Duration::from_secs(15)));
        assert_eq!(s.eta_string(), "00:15");
        assert!(!s.finished);
    }

    #[test]
    fn unknown_duration_gives_unknown_eta() {
        let mut parser = ProgressParser::new(None);
        let samples = feed_all(&mut parser, BLOCK);
        assert_eq!(samples[0].percent, None);
        assert_eq!(samples[0].eta, None);
        assert_eq!(samples[0].eta_string(), "unknown");
    }

    #[test]
    fn zero_duration_is_treated_as_unknown() {
        let mut parser = ProgressParser::new(Some(Duration::ZERO));
        let samples = feed_all(&mut parser, BLOCK);
        assert_eq!(samples[0].percent, None);
    }

    #[test]
    fn speed_not_available_gives_unknown_eta() {
        let mut parser = ProgressParser::new(Some(Duration::from_secs(40)));
        let samples = feed_all(&mut parser, "out_time_us=1000000\nspeed=N/A\nprogress=continue\n");
        assert_eq!(samples[0].eta, None);
        assert_eq!(samples[0].percent, Some(2.5));
    }

    #[test]
    fn end_block_is_complete() {
        let mut parser = ProgressParser::new(Some(Duration::from_secs(40)));
        let text = format!("{BLOCK}out_time_us=39000000\nspeed=2.1x\nprogress=end\n");
        let samples = feed_all(&mut parser, &text);
        assert_eq!(samples.len(), 2);
        let last = samples.last().unwrap();
        assert!(last.finished);
        assert_eq!(last.percent, Some(100.0));
        assert_eq!(last.eta_string(), "00:00");
    }

    #[test]
    fn percent_is_clamped_when_output_overruns_duration() {
        let mut parser = ProgressParser::new(Some(Duration::from_secs(10)));
        let samples = feed_all(&mut parser, "out_time_us=12000000\nspeed=1x\nprogress=continue\n");
        assert_eq!(samples[0].percent, Some(100.0));
        assert_eq!(samples[0].eta, Some(Duration::ZERO));
    }

    #[test]
    fn stalled_speed_gives_unknown_eta() {
        let mut parser = ProgressParser::new(Some(Duration::from_secs(3600)));
        let samples = feed_all(&mut parser, "out_time_us=1\nspeed=1e-300x\nprogress=continue\n");
        assert_eq!(samples[0].eta, None);
        assert_eq!(samples[0].eta_string(), "unknown");
    }

    #[test]
    fn negative_out_time_is_ignored() {
        let mut parser = ProgressParser::new(Some(Duration::from_secs(10)));
        let samples = feed_all(&mut parser, "out_time_us=-9223372036854775807\nprogress=continue\n");
        assert_eq!(samples[0].out_time, Duration::ZERO);
    }

    #[test]
    fn non_progress_lines_are_skipped() {
        let mut parser = ProgressParser::new(None);
        assert!(parser.feed("").is_none());
        assert!(parser.feed("Press [q] to stop").is_none());
        assert!(parser.feed("fps=30").is_none());
    }

    #[test]
    fn parse_speed_values() {
        assert_eq!(parse_speed("1.53x"), Some(1.53));
        assert_eq!(parse_speed(" 0.9x"), Some(0.9));
        assert_eq!(parse_speed("N/A"), None);
        assert_eq!(parse_speed(""), None);
    }

    #[test]
    fn format_eta_values() {
        assert_eq!(format_eta(Duration::ZERO), "00:00");
        assert_eq!(format_eta(Duration::from_secs(5)), "00:05");
        assert_eq!(format_eta(Duration::from_millis(59_600)), "01:00");
        assert_eq!(format_eta(Duration::from_secs(600)), "10:00");
        assert_eq!(format_eta(Duration::from_secs(3600)), "1:00:00");
        assert_eq!(format_eta(Duration::from_secs(36_061)), "10:01:01");
    }
}
