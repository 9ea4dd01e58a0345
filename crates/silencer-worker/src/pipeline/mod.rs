//! Silence split pipeline.
//!
//! `Probing → Detecting → Allocating → Extracting → Aggregating → (Merging) → Done | Failed`
//!
//! Fatal conditions surface as [`WorkerError`]; failed segments and a
//! failed merge are recorded on the [`PipelineReport`] and the run still
//! ends in `Done`.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn, Instrument};

use silencer_media::{MediaEngine, SilenceDetectRequest};
use silencer_models::{AudioStream, PipelineState, RunId};

use crate::allocator::allocate;
use crate::config::PipelineConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::RunLogger;
use crate::metrics;
use crate::selector::{check_ordinal, SingleStreamOnly, StreamSelector};

pub mod extract;
pub mod layout;
pub mod manifest;
pub mod merge;

pub use extract::{fan_out, run_worker, Aggregation};
pub use layout::{WorkLayout, MANIFEST_NAME, PARTS_DIR};
pub use manifest::{manifest_contents, write_manifest};
pub use merge::{merge_segments, remove_work_dir, MergeStatus};

/// How a completed run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// Fewer than two silences; nothing was extracted
    NoSilence,
    /// Segments written to the output directory
    Split,
    /// Segments concatenated into the output file
    Merged,
    /// Merge requested but no segment survived extraction
    NothingToMerge,
    /// The concat step failed; intermediates were kept
    MergeFailed { exit_code: Option<i32> },
    /// A fatal error stopped the run after it started
    Failed,
}

impl PipelineOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineOutcome::MergeFailed {
                exit_code: Some(code),
            } if *code != 0 => *code,
            PipelineOutcome::MergeFailed { .. } | PipelineOutcome::Failed => 1,
            _ => 0,
        }
    }
}

/// Summary of one run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: RunId,
    pub state: PipelineState,
    /// Every state entered, in order
    pub states: Vec<PipelineState>,
    pub audio_index: Option<usize>,
    pub interval_count: usize,
    pub total_silence: Decimal,
    /// Task count per worker slot
    pub worker_tasks: Vec<usize>,
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
    pub merged_output: Option<PathBuf>,
    pub outcome: PipelineOutcome,
    /// Fatal error message when the run failed
    pub error: Option<String>,
}

impl PipelineReport {
    fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            state: PipelineState::Probing,
            states: Vec::new(),
            audio_index: None,
            interval_count: 0,
            total_silence: Decimal::ZERO,
            worker_tasks: Vec::new(),
            succeeded: Vec::new(),
            failed: Vec::new(),
            merged_output: None,
            outcome: PipelineOutcome::Failed,
            error: None,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }
}

/// A fatal run error, with the report when the run had started.
#[derive(Debug, thiserror::Error)]
#[error("Pipeline run failed: {error}")]
pub struct RunFailure {
    pub error: WorkerError,
    /// `None` when the run was rejected before probing
    pub report: Option<PipelineReport>,
}

impl RunFailure {
    fn rejected(error: WorkerError) -> Self {
        Self {
            error,
            report: None,
        }
    }
}

/// Records the state trail and logs each transition.
struct StateTracker {
    logger: RunLogger,
    current: PipelineState,
    trail: Vec<PipelineState>,
}

impl StateTracker {
    fn new(logger: RunLogger) -> Self {
        logger.log_state(PipelineState::Probing);
        Self {
            logger,
            current: PipelineState::Probing,
            trail: vec![PipelineState::Probing],
        }
    }

    fn current(&self) -> PipelineState {
        self.current
    }

    fn advance(&mut self, next: PipelineState) {
        if !self.current.can_transition_to(next) {
            warn!(from = %self.current, to = %next, "Unexpected pipeline transition");
        }
        self.current = next;
        self.trail.push(next);
        self.logger.log_state(next);
    }

    fn fail(&mut self, err: &WorkerError) {
        if self.current.is_terminal() {
            return;
        }
        self.logger.log_error(self.current, &err.to_string());
        self.advance(PipelineState::Failed);
    }
}

/// Silence split pipeline over a [`MediaEngine`].
pub struct Pipeline<E: MediaEngine> {
    engine: E,
    config: PipelineConfig,
    selector: Box<dyn StreamSelector>,
}

impl<E: MediaEngine> Pipeline<E> {
    /// Ambiguous stream choices are refused until a selector is set.
    pub fn new(engine: E, config: PipelineConfig) -> Self {
        Self {
            engine,
            config,
            selector: Box::new(SingleStreamOnly),
        }
    }

    pub fn with_selector(mut self, selector: impl StreamSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline to completion.
    pub async fn run(&self) -> WorkerResult<PipelineReport> {
        self.run_with_report().await.map_err(|failure| failure.error)
    }

    /// Like [`run`](Self::run), but a run that fails after starting still
    /// hands back its report, ending in `Failed` with the state trail.
    pub async fn run_with_report(&self) -> Result<PipelineReport, RunFailure> {
        self.config.validate().map_err(RunFailure::rejected)?;
        let input = self
            .check_preconditions()
            .await
            .map_err(RunFailure::rejected)?;

        let run_id = RunId::new();
        let logger = RunLogger::new(&run_id, &input);
        let span = logger.create_span();

        async move {
            let mut tracker = StateTracker::new(logger);
            let mut report = PipelineReport::new(run_id);

            let result = self.execute(&input, &mut tracker, &mut report).await;
            if let Err(e) = &result {
                tracker.fail(e);
            }
            report.state = tracker.current();
            report.states = tracker.trail;

            match result {
                Ok(outcome) => {
                    report.outcome = outcome;
                    Ok(report)
                }
                Err(error) => {
                    report.error = Some(error.to_string());
                    Err(RunFailure {
                        error,
                        report: Some(report),
                    })
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Input file, output location and tool-independent checks.
    async fn check_preconditions(&self) -> WorkerResult<PathBuf> {
        let config = &self.config;

        let input = match tokio::fs::canonicalize(&config.input).await {
            Ok(path) => path,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(WorkerError::InputNotFound(config.input.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        if !tokio::fs::metadata(&input).await?.is_file() {
            return Err(WorkerError::precondition(format!(
                "{} is not a file",
                input.display()
            )));
        }

        if config.merge {
            if config.output.is_dir() {
                return Err(WorkerError::precondition(
                    "output cannot be a directory when merging",
                ));
            }
            let parent = output_parent(&config.output);
            if !parent.is_dir() {
                return Err(WorkerError::precondition(format!(
                    "output directory {} does not exist",
                    parent.display()
                )));
            }
        } else if config.output.exists() && !config.output.is_dir() {
            return Err(WorkerError::precondition(format!(
                "output {} exists and is not a directory",
                config.output.display()
            )));
        }

        Ok(input)
    }

    async fn execute(
        &self,
        input: &Path,
        tracker: &mut StateTracker,
        report: &mut PipelineReport,
    ) -> WorkerResult<PipelineOutcome> {
        let config = &self.config;

        // Probing
        let info = self.engine.probe(input).await?;
        let streams = info.audio_streams();
        let audio_index = self.choose_stream(input, &streams).await?;
        let stream = &streams[audio_index];
        let suffix = config.suffix.resolve(stream);
        report.audio_index = Some(audio_index);
        info!(
            audio_index,
            stream = %stream,
            suffix = %suffix,
            "Selected audio stream"
        );

        // Detecting
        tracker.advance(PipelineState::Detecting);
        let request = SilenceDetectRequest {
            input: input.to_path_buf(),
            audio_index,
            threshold_db: config.threshold_db,
            min_duration_secs: config.min_silence_secs,
            suffix: suffix.clone(),
        };
        let set = self.engine.detect_silence(&request).await?;
        report.interval_count = set.len();
        report.total_silence = set.total_silence();
        metrics::record_silence(report.total_silence);
        info!(
            intervals = set.len(),
            total_silence = %report.total_silence,
            "Silence detection complete"
        );

        if !set.is_splittable() {
            info!(intervals = set.len(), "Not enough silence to split");
            tracker.advance(PipelineState::Done);
            return Ok(PipelineOutcome::NoSilence);
        }

        // Allocating
        tracker.advance(PipelineState::Allocating);
        let assignment = allocate(&set, config.workers, &config.cost)?;
        report.worker_tasks = assignment.counts();
        info!(
            workers = assignment.worker_slots(),
            active = assignment.active_count(),
            tasks = ?report.worker_tasks,
            "Tasks assigned"
        );

        // Extracting
        tracker.advance(PipelineState::Extracting);
        let layout = if config.merge {
            let auto = config.suffix.is_auto().then_some(suffix.as_str());
            WorkLayout::merge(input, &config.output, auto)
        } else {
            WorkLayout::split(input, &config.output)
        };
        tokio::fs::create_dir_all(&layout.dir).await?;
        let results = fan_out(&self.engine, &set, &assignment, &layout).await;

        // Aggregating
        tracker.advance(PipelineState::Aggregating);
        let aggregation = Aggregation::from_results(results);
        for result in &aggregation.succeeded {
            metrics::record_segment(true);
            report.succeeded.push(result.path.clone());
        }
        for result in &aggregation.failed {
            metrics::record_segment(false);
            let file = result
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            tracker.logger.log_warning(
                PipelineState::Aggregating,
                &format!(
                    "FFmpeg exited with status {} while processing {}",
                    result.status_label(),
                    file
                ),
            );
            report.failed.push(result.path.clone());
        }
        info!(
            succeeded = aggregation.succeeded.len(),
            failed = aggregation.failed.len(),
            "Extraction complete"
        );

        if !layout.is_merge() {
            tracker.advance(PipelineState::Done);
            return Ok(PipelineOutcome::Split);
        }

        if aggregation.succeeded.is_empty() {
            tracker.logger.log_warning(
                PipelineState::Aggregating,
                "No segment was extracted successfully, skipping merge",
            );
            tracker.advance(PipelineState::Done);
            return Ok(PipelineOutcome::NothingToMerge);
        }

        // Merging
        tracker.advance(PipelineState::Merging);
        let status = merge_segments(&self.engine, &layout, &aggregation.succeeded).await?;
        let outcome = match status {
            MergeStatus::Merged => {
                metrics::record_merge(true);
                report.merged_output = layout.merged_output.clone();
                PipelineOutcome::Merged
            }
            MergeStatus::Failed { exit_code } => {
                metrics::record_merge(false);
                tracker.logger.log_warning(
                    PipelineState::Merging,
                    &format!(
                        "Merge exited with status {}, intermediates kept in {}",
                        exit_code
                            .map(|c| c.to_string())
                            .unwrap_or_else(|| "terminated".to_string()),
                        layout.dir.display()
                    ),
                );
                PipelineOutcome::MergeFailed { exit_code }
            }
        };

        tracker.advance(PipelineState::Done);
        Ok(outcome)
    }

    async fn choose_stream(&self, input: &Path, streams: &[AudioStream]) -> WorkerResult<usize> {
        if streams.is_empty() {
            return Err(WorkerError::NoAudioStream(input.to_path_buf()));
        }
        if let Some(index) = self.config.audio_index {
            return check_ordinal(index, streams);
        }
        if streams.len() == 1 {
            return Ok(0);
        }

        info!(count = streams.len(), "Multiple audio streams found");
        let index = self.selector.select(streams).await?;
        check_ordinal(index, streams)
    }
}

fn output_parent(output: &Path) -> &Path {
    output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_exit_codes() {
        assert_eq!(PipelineOutcome::NoSilence.exit_code(), 0);
        assert_eq!(PipelineOutcome::Split.exit_code(), 0);
        assert_eq!(PipelineOutcome::Merged.exit_code(), 0);
        assert_eq!(PipelineOutcome::NothingToMerge.exit_code(), 0);
        assert_eq!(
            PipelineOutcome::MergeFailed { exit_code: Some(69) }.exit_code(),
            69
        );
        assert_eq!(PipelineOutcome::MergeFailed { exit_code: None }.exit_code(), 1);
        assert_eq!(PipelineOutcome::Failed.exit_code(), 1);
    }

    #[test]
    fn test_state_tracker_trail() {
        let logger = RunLogger::new(&RunId::from_string("t"), Path::new("in.m4a"));
        let mut tracker = StateTracker::new(logger);
        tracker.advance(PipelineState::Detecting);
        tracker.fail(&WorkerError::precondition("boom"));
        tracker.fail(&WorkerError::precondition("again"));

        assert_eq!(tracker.current(), PipelineState::Failed);
        assert_eq!(
            tracker.trail,
            vec![
                PipelineState::Probing,
                PipelineState::Detecting,
                PipelineState::Failed
            ]
        );
    }

    #[test]
    fn test_report_serializes() {
        let mut report = PipelineReport::new(RunId::from_string("run-1"));
        report.outcome = PipelineOutcome::MergeFailed { exit_code: Some(1) };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["run_id"], "run-1");
        assert_eq!(json["state"], "probing");
        assert_eq!(json["outcome"]["kind"], "merge_failed");
        assert_eq!(json["outcome"]["exit_code"], 1);
    }

    #[test]
    fn test_output_parent() {
        assert_eq!(output_parent(Path::new("out.aac")), Path::new("."));
        assert_eq!(output_parent(Path::new("/a/b.aac")), Path::new("/a"));
    }
}
