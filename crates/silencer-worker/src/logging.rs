//! Structured run logging.
//!
//! Every event carries the run id and the pipeline stage so interleaved
//! output from concurrent extraction workers stays attributable.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn, Span};

use silencer_models::{PipelineState, RunId};

/// Logger bound to one pipeline run.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    input: PathBuf,
}

impl RunLogger {
    pub fn new(run_id: &RunId, input: &Path) -> Self {
        Self {
            run_id: run_id.to_string(),
            input: input.to_path_buf(),
        }
    }

    /// Log entry into a pipeline state.
    pub fn log_state(&self, state: PipelineState) {
        info!(
            run_id = %self.run_id,
            stage = %state,
            "Pipeline state: {}", state
        );
    }

    pub fn log_warning(&self, stage: PipelineState, message: &str) {
        warn!(
            run_id = %self.run_id,
            stage = %stage,
            "{}", message
        );
    }

    pub fn log_error(&self, stage: PipelineState, message: &str) {
        error!(
            run_id = %self.run_id,
            stage = %stage,
            "Pipeline failed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Span wrapping the whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "pipeline",
            run_id = %self.run_id,
            input = %self.input.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_logger_creation() {
        let run_id = RunId::from_string("run-42");
        let logger = RunLogger::new(&run_id, Path::new("/media/talk.m4a"));

        assert_eq!(logger.run_id(), "run-42");
        assert_eq!(logger.input(), Path::new("/media/talk.m4a"));
    }
}
