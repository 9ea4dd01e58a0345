//! Silence detection via FFmpeg's `silencedetect` filter.
//!
//! FFmpeg reports each silence as a pair of log lines:
//!
//! ```text
//! [silencedetect @ 0x55d0c8] silence_start: 10.25
//! [silencedetect @ 0x55d0c8] silence_end: 12.75 | silence_duration: 2.5
//! ```
//!
//! Only the end line is used. The start is derived as `end - duration`
//! in exact decimal arithmetic.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use silencer_models::{parse_seconds, SilenceInterval, SilenceSet};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(?:Parsed_)?silencedetect(?:_\d+)? @ [^\]]*\]").expect("valid regex")
});
static END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"silence_end:\s*(\d+(?:\.\d+)?)").expect("valid regex"));
static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"silence_duration:\s*(\d+(?:\.\d+)?)").expect("valid regex"));

/// Parameters for one silence detection pass.
#[derive(Debug, Clone)]
pub struct SilenceDetectRequest {
    pub input: PathBuf,
    /// Audio stream ordinal (`0:a:N`)
    pub audio_index: usize,
    /// Noise floor in dB, e.g. `-40`
    pub threshold_db: f64,
    /// Minimum silence length in seconds
    pub min_duration_secs: f64,
    /// Suffix recorded on the resulting set
    pub suffix: String,
}

impl SilenceDetectRequest {
    /// The `silencedetect` filter expression.
    pub fn filter(&self) -> String {
        format!(
            "silencedetect=n={}dB:d={}",
            self.threshold_db, self.min_duration_secs
        )
    }
}

/// Parse one diagnostic line into an interval.
///
/// Lines that are not `silencedetect` end events, or that are malformed,
/// yield `None`.
pub fn parse_silence_line(line: &str) -> Option<SilenceInterval> {
    let line = line.trim();
    if !PREFIX_RE.is_match(line) || line.contains("silence_start:") {
        return None;
    }

    let end = END_RE.captures(line)?.get(1)?.as_str();
    let duration = DURATION_RE.captures(line)?.get(1)?.as_str();

    SilenceInterval::from_end(parse_seconds(end).ok()?, parse_seconds(duration).ok()?)
}

/// Parse a full `silencedetect` log into chronological intervals.
pub fn parse_silence_log(text: &str) -> Vec<SilenceInterval> {
    text.lines().filter_map(parse_silence_line).collect()
}

/// Run silence detection and collect the reported intervals.
///
/// Fewer than two intervals is a normal result; callers decide whether
/// there is anything to split.
pub async fn detect_silence(
    runner: &FfmpegRunner,
    request: &SilenceDetectRequest,
) -> MediaResult<SilenceSet> {
    let input = resolve_input(&request.input)?;

    info!(
        input = %input.display(),
        audio_index = request.audio_index,
        threshold_db = request.threshold_db,
        min_duration_secs = request.min_duration_secs,
        "Detecting silence"
    );

    let cmd = FfmpegCommand::new(&input, "-")
        .log_level("info")
        .map_audio(request.audio_index)
        .audio_filter(request.filter())
        .format("null");

    let mut intervals = Vec::new();
    let output = runner
        .run_streaming(&cmd, |line| match parse_silence_line(line) {
            Some(interval) => {
                debug!(
                    start = %interval.start,
                    end = %interval.end,
                    duration = %interval.duration,
                    "Silence detected"
                );
                intervals.push(interval);
                true
            }
            None => PREFIX_RE.is_match(line),
        })
        .await?;

    if !output.success() {
        return Err(MediaError::ffmpeg_failed(
            format!("silence detection failed for {}", input.display()),
            output.stderr_text(),
            output.exit_code(),
        ));
    }

    Ok(SilenceSet::new(
        input,
        request.audio_index,
        request.suffix.clone(),
        intervals,
    ))
}

/// Absolute path of an existing regular file.
pub(crate) fn resolve_input(path: &Path) -> MediaResult<PathBuf> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(MediaError::NotAFile(path.to_path_buf()));
    }
    Ok(path.canonicalize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use silencer_models::Decimal;

    const LOG: &str = "\
Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'talk.m4a':
  Duration: 00:31:02.35, start: 0.000000, bitrate: 129 kb/s
[silencedetect @ 0x55d0c8] silence_start: 10.25
[silencedetect @ 0x55d0c8] silence_end: 12.75 | silence_duration: 2.5
[silencedetect @ 0x55d0c8] silence_start: 1920.106813
[silencedetect @ 0x55d0c8] silence_end: 1922.306813 | silence_duration: 2.2
[Parsed_silencedetect_0 @ 0x6000] silence_end: 1930.5 | silence_duration: 1.5
[silencedetect @ 0x55d0c8] silence_end: garbage | silence_duration: 1
[aac @ 0x55d0c9] silence_end: 5.0 | silence_duration: 1.0
size=N/A time=00:31:02.35 bitrate=N/A speed= 812x
";

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_log_keeps_only_end_events() {
        let intervals = parse_silence_log(LOG);
        assert_eq!(intervals.len(), 3);

        assert_eq!(intervals[0].start, dec("10.25"));
        assert_eq!(intervals[0].end, dec("12.75"));
        assert_eq!(intervals[1].start, dec("1920.106813"));
        assert_eq!(intervals[2].start, dec("1929.0"));
    }

    #[test]
    fn test_duration_is_exact_difference() {
        for interval in parse_silence_log(LOG) {
            assert_eq!(interval.end - interval.start, interval.duration);
        }
    }

    #[test]
    fn test_parsing_is_idempotent() {
        assert_eq!(parse_silence_log(LOG), parse_silence_log(LOG));
    }

    #[test]
    fn test_head_silence_with_negative_start_is_kept() {
        let log = "\
[silencedetect @ 0x1] silence_start: -0.001
[silencedetect @ 0x1] silence_end: 1.5 | silence_duration: 1.501
[silencedetect @ 0x1] silence_end: 6 | silence_duration: 2
[silencedetect @ 0x1] silence_end: 10 | silence_duration: 1
";
        let intervals = parse_silence_log(log);
        assert_eq!(intervals.len(), 3);
        assert_eq!(intervals[0].start, dec("-0.001"));
        assert_eq!(intervals[0].end, dec("1.5"));
        assert_eq!(intervals[1].start, dec("4"));
    }

    #[test]
    fn test_start_lines_are_ignored() {
        assert!(parse_silence_line("[silencedetect @ 0x1] silence_start: 4.5").is_none());
        assert!(parse_silence_line("").is_none());
        assert!(parse_silence_line("[silencedetect @ 0x1] silence_end: 4.5").is_none());
    }

    #[test]
    fn test_filter_expression() {
        let request = SilenceDetectRequest {
            input: PathBuf::from("talk.m4a"),
            audio_index: 0,
            threshold_db: -40.0,
            min_duration_secs: 0.5,
            suffix: "aac".to_string(),
        };
        assert_eq!(request.filter(), "silencedetect=n=-40dB:d=0.5");
    }

    #[test]
    fn test_resolve_input_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_input(dir.path()),
            Err(MediaError::NotAFile(_))
        ));
        assert!(matches!(
            resolve_input(&dir.path().join("missing.wav")),
            Err(MediaError::FileNotFound(_))
        ));
    }
}
