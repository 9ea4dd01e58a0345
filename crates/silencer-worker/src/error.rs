//! Pipeline error types.
//!
//! Only fatal conditions are errors. A failed segment extraction or a
//! failed merge is recorded on the [`PipelineReport`](crate::PipelineReport)
//! instead.

use std::path::PathBuf;
use thiserror::Error;

use silencer_media::MediaError;

use crate::allocator::AllocationError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("No audio stream in {0}")]
    NoAudioStream(PathBuf),

    #[error("{available} audio streams found and none selected")]
    AmbiguousStream { available: usize },

    #[error("Audio stream index {index} out of range (must be < {available})")]
    InvalidStreamIndex { index: usize, available: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("External tool failure: {0}")]
    ExternalTool(#[from] MediaError),

    #[error("Allocation failed: {0}")]
    Allocation(#[from] AllocationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether the run was rejected before any work started.
    pub fn is_precondition(&self) -> bool {
        match self {
            WorkerError::Precondition(_)
            | WorkerError::InputNotFound(_)
            | WorkerError::NoAudioStream(_)
            | WorkerError::AmbiguousStream { .. }
            | WorkerError::InvalidStreamIndex { .. }
            | WorkerError::ConfigError(_) => true,
            WorkerError::ExternalTool(e) => matches!(
                e,
                MediaError::FfmpegNotFound
                    | MediaError::FfprobeNotFound
                    | MediaError::FileNotFound(_)
                    | MediaError::NotAFile(_)
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_classification() {
        assert!(WorkerError::precondition("output missing").is_precondition());
        assert!(WorkerError::AmbiguousStream { available: 2 }.is_precondition());
        assert!(WorkerError::from(MediaError::FfmpegNotFound).is_precondition());
        assert!(!WorkerError::from(MediaError::Timeout(30)).is_precondition());
        assert!(!WorkerError::from(std::io::Error::other("disk full")).is_precondition());
    }

    #[test]
    fn test_messages() {
        let err = WorkerError::InvalidStreamIndex {
            index: 3,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Audio stream index 3 out of range (must be < 2)"
        );
    }
}
