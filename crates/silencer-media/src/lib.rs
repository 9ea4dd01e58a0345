#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for silence-based audio splitting.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Optional per-invocation timeouts
//! - Stream probing, silence detection, lossless range extraction and
//!   concat-demuxer merging
//! - The [`MediaEngine`] trait the pipeline is written against

pub mod command;
pub mod concat;
pub mod engine;
pub mod error;
pub mod extract;
pub mod probe;
pub mod progress;
pub mod silence;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner, RunOutput};
pub use concat::{concat_list_entry, concat_segments};
pub use engine::{EngineOptions, FfmpegEngine, MediaEngine};
pub use error::{MediaError, MediaResult};
pub use extract::{extract_segment, ExtractRequest};
pub use probe::{probe_media, MediaInfo, StreamInfo};
pub use progress::FfmpegProgress;
pub use silence::{detect_silence, parse_silence_line, parse_silence_log, SilenceDetectRequest};
