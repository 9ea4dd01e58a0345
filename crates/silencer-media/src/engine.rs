//! The media engine seam used by the pipeline.
//!
//! The pipeline only needs four capabilities from the outside world:
//! stream metadata, silence detection, range extraction and
//! concatenation. [`FfmpegEngine`] provides them with the FFmpeg CLI;
//! tests substitute an in-memory engine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use silencer_models::{ExtractionResult, SilenceSet};

use crate::command::{check_ffmpeg, check_ffprobe, FfmpegRunner};
use crate::concat::concat_segments;
use crate::error::MediaResult;
use crate::extract::{extract_segment, ExtractRequest};
use crate::probe::{probe_media, MediaInfo};
use crate::silence::{detect_silence, SilenceDetectRequest};

/// External media-processing capability.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Stream metadata for `input`.
    async fn probe(&self, input: &Path) -> MediaResult<MediaInfo>;

    /// Silence intervals of one audio stream.
    async fn detect_silence(&self, request: &SilenceDetectRequest) -> MediaResult<SilenceSet>;

    /// Extract one span into a new file.
    async fn extract(&self, request: &ExtractRequest) -> MediaResult<ExtractionResult>;

    /// Concatenate the files listed in `manifest`; returns the exit code.
    async fn concat(&self, manifest: &Path, output: &Path) -> MediaResult<Option<i32>>;
}

/// Engine options.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Log FFmpeg progress records for extraction and merge
    pub show_progress: bool,
    /// Per-invocation timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

/// [`MediaEngine`] backed by the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEngine {
    options: EngineOptions,
    runner: FfmpegRunner,
}

impl FfmpegEngine {
    pub fn new(options: EngineOptions) -> Self {
        let runner = FfmpegRunner::new().with_timeout(options.timeout);
        Self { options, runner }
    }

    /// Locate both binaries; fails when either is missing.
    pub fn check_tools() -> MediaResult<(PathBuf, PathBuf)> {
        Ok((check_ffmpeg()?, check_ffprobe()?))
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn probe(&self, input: &Path) -> MediaResult<MediaInfo> {
        probe_media(input).await
    }

    async fn detect_silence(&self, request: &SilenceDetectRequest) -> MediaResult<SilenceSet> {
        detect_silence(&self.runner, request).await
    }

    async fn extract(&self, request: &ExtractRequest) -> MediaResult<ExtractionResult> {
        extract_segment(&self.runner, request, self.options.show_progress).await
    }

    async fn concat(&self, manifest: &Path, output: &Path) -> MediaResult<Option<i32>> {
        concat_segments(&self.runner, manifest, output, self.options.show_progress).await
    }
}
