//! Shared data models for the silence splitter.
//!
//! This crate provides Serde-serializable types for:
//! - Silence intervals and the detected silence set
//! - Non-silent segment spans derived from consecutive silences
//! - Worker task assignments and extraction results
//! - Audio stream metadata and output suffix selection
//! - Pipeline run identity and state

pub mod assignment;
pub mod extraction;
pub mod run;
pub mod silence;
pub mod stream;
pub mod timestamp;

// Re-export common types
pub use assignment::TaskAssignment;
pub use extraction::ExtractionResult;
pub use run::{PipelineState, RunId};
pub use silence::{SegmentSpan, SilenceInterval, SilenceSet};
pub use stream::{suffix_for_codec, AudioStream, OutputSuffix};
pub use timestamp::{format_seconds, parse_seconds, TimestampError};

pub use rust_decimal::Decimal;
