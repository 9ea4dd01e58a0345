//! Silence split pipeline.
//!
//! This crate provides:
//! - Cost-balanced allocation of silence intervals to workers
//! - Concurrent segment extraction with per-worker ordering
//! - Manifest writing and concat-based merging with cleanup
//! - Run configuration, structured logging and metrics

pub mod allocator;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod selector;

pub use allocator::{allocate, AllocationError};
pub use config::{CostModel, PipelineConfig};
pub use error::{WorkerError, WorkerResult};
pub use logging::RunLogger;
pub use pipeline::{Pipeline, PipelineOutcome, PipelineReport, RunFailure, WorkLayout};
pub use selector::{FixedStream, SingleStreamOnly, StreamSelector};
