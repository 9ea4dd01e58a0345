//! Lossless extraction of one non-silent span.

use std::path::PathBuf;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use silencer_models::{format_seconds, ExtractionResult, SegmentSpan};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::progress::FfmpegProgress;

/// One extraction invocation.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub source: PathBuf,
    /// Audio stream ordinal (`0:a:N`)
    pub audio_index: usize,
    pub span: SegmentSpan,
    /// Absolute output path
    pub output: PathBuf,
}

impl ExtractRequest {
    pub fn command(&self, progress: bool) -> FfmpegCommand {
        FfmpegCommand::new(&self.source, &self.output)
            .map_audio(self.audio_index)
            .range(self.span.start, self.span.end)
            .codec_copy()
            .with_progress(progress)
    }
}

/// Extract `request.span` with stream copy.
///
/// The returned result carries FFmpeg's exit code; a non-zero exit is
/// reported there rather than as an error.
pub async fn extract_segment(
    runner: &FfmpegRunner,
    request: &ExtractRequest,
    show_progress: bool,
) -> MediaResult<ExtractionResult> {
    let span = request.span;
    debug!(
        segment = span.index,
        start = %format_seconds(span.start),
        end = %span.end.map(format_seconds).unwrap_or_else(|| "eof".to_string()),
        output = %request.output.display(),
        "Extracting segment"
    );

    let cmd = request.command(show_progress);
    let output = if show_progress {
        let segment = span.index;
        let total_ms = span
            .duration()
            .and_then(|d| (d * Decimal::from(1000)).to_i64())
            .unwrap_or(0);
        runner
            .run_with_progress(&cmd, move |progress: FfmpegProgress| {
                if progress.is_complete {
                    info!(segment, out_time = %progress.out_time, "Segment written");
                } else {
                    info!(
                        segment,
                        out_time = %progress.out_time,
                        percent = format!("{:.1}%", progress.percentage(total_ms)),
                        speed = progress.speed,
                        "Extraction progress"
                    );
                }
            })
            .await?
    } else {
        runner.run(&cmd).await?
    };

    if !output.success() {
        warn!(
            segment = span.index,
            exit_code = ?output.exit_code(),
            stderr = %output.stderr_text().unwrap_or_default(),
            "FFmpeg extraction exited with failure"
        );
    }

    Ok(ExtractionResult::new(
        span.index,
        output.exit_code(),
        request.output.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_command_selects_stream_and_range() {
        let request = ExtractRequest {
            source: PathBuf::from("/media/talk.m4a"),
            audio_index: 2,
            span: SegmentSpan {
                index: 4,
                start: Decimal::new(1275, 2),
                end: None,
            },
            output: PathBuf::from("/out/talk_12.75-end#2_4.aac"),
        };

        let args = request.command(false).build_args();
        assert!(args.windows(2).any(|w| w == ["-i", "/media/talk.m4a"]));
        assert!(args.windows(2).any(|w| w == ["-map", "0:a:2"]));
        assert!(args.windows(2).any(|w| w == ["-ss", "12.75"]));
        assert!(!args.contains(&"-to".to_string()));
        assert_eq!(
            args.last().map(String::as_str),
            Some("/out/talk_12.75-end#2_4.aac")
        );
    }
}
