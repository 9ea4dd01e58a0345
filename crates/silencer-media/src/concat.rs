//! Concatenation of extracted segments with the concat demuxer.

use std::path::Path;

use tracing::{info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// One concat-list line for `path`.
///
/// Single quotes are closed, escaped and reopened as the demuxer expects.
pub fn concat_list_entry(path: &Path) -> String {
    let escaped = path.to_string_lossy().replace('\'', r"'\''");
    format!("file '{}'\n", escaped)
}

/// Concatenate the files listed in `manifest` into `output` without
/// re-encoding. Returns FFmpeg's exit code.
pub async fn concat_segments(
    runner: &FfmpegRunner,
    manifest: &Path,
    output: &Path,
    show_progress: bool,
) -> MediaResult<Option<i32>> {
    if !manifest.is_file() {
        return Err(MediaError::FileNotFound(manifest.to_path_buf()));
    }

    info!(
        manifest = %manifest.display(),
        output = %output.display(),
        "Concatenating segments"
    );

    let cmd = FfmpegCommand::new(manifest, output)
        .concat_input()
        .codec_copy()
        .with_progress(show_progress);

    let result = if show_progress {
        runner
            .run_with_progress(&cmd, |progress| {
                info!(out_time = %progress.out_time, speed = progress.speed, "Merge progress");
            })
            .await?
    } else {
        runner.run(&cmd).await?
    };

    if !result.success() {
        warn!(
            exit_code = ?result.exit_code(),
            stderr = %result.stderr_text().unwrap_or_default(),
            "FFmpeg concat exited with failure"
        );
    }

    Ok(result.exit_code())
}
