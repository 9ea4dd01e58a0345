//! Pipeline configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;

use silencer_models::OutputSuffix;

use crate::error::{WorkerError, WorkerResult};

/// Cost estimate used to balance intervals across workers.
///
/// Each extraction costs `duration * duration_weight + invocation_cost`.
/// The per-worker target adds `redundancy_slack` extra invocations so the
/// last worker is not systematically starved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostModel {
    /// Fixed cost of starting one FFmpeg process
    pub invocation_cost: Decimal,
    /// Cost per second of extracted audio
    pub duration_weight: Decimal,
    /// Extra invocations budgeted into the per-worker target
    pub redundancy_slack: Decimal,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            invocation_cost: Decimal::from(3),
            duration_weight: Decimal::ONE,
            redundancy_slack: Decimal::from(2),
        }
    }
}

impl CostModel {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            invocation_cost: env_parse("SILENCER_INVOCATION_COST")
                .unwrap_or(defaults.invocation_cost),
            duration_weight: env_parse("SILENCER_DURATION_WEIGHT")
                .unwrap_or(defaults.duration_weight),
            redundancy_slack: env_parse("SILENCER_REDUNDANCY_SLACK")
                .unwrap_or(defaults.redundancy_slack),
        }
    }

    /// Estimated cost of extracting one interval's span.
    pub fn step_cost(&self, duration: Decimal) -> Decimal {
        duration * self.duration_weight + self.invocation_cost
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    /// Source media file
    pub input: PathBuf,
    /// Output directory, or output file when merging
    pub output: PathBuf,
    /// Segment/merged file suffix
    pub suffix: OutputSuffix,
    /// Silence noise floor in dB
    pub threshold_db: f64,
    /// Minimum silence length in seconds
    pub min_silence_secs: f64,
    /// Audio stream ordinal; `None` asks the stream selector when ambiguous
    pub audio_index: Option<usize>,
    /// Maximum concurrent FFmpeg extraction processes
    pub workers: usize,
    /// Concatenate segments into one file afterwards
    pub merge: bool,
    /// Log FFmpeg progress records
    pub show_progress: bool,
    /// Per-invocation timeout
    pub timeout: Option<Duration>,
    pub cost: CostModel,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::new(),
            suffix: OutputSuffix::Auto,
            threshold_db: -40.0,
            min_silence_secs: 0.5,
            audio_index: None,
            workers: default_workers(),
            merge: false,
            show_progress: true,
            timeout: None,
            cost: CostModel::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            ..Default::default()
        }
    }

    /// Create config from environment variables.
    pub fn from_env(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        let defaults = Self::default();
        Self {
            input: input.into(),
            output: output.into(),
            suffix: env_parse("SILENCER_OUTPUT_SUFFIX").unwrap_or(defaults.suffix),
            threshold_db: env_parse("SILENCER_SILENCE_DB").unwrap_or(defaults.threshold_db),
            min_silence_secs: env_parse("SILENCER_SILENCE_DURATION")
                .unwrap_or(defaults.min_silence_secs),
            audio_index: env_parse("SILENCER_AUDIO_INDEX"),
            workers: env_parse("SILENCER_WORKERS").unwrap_or(defaults.workers),
            merge: env_parse("SILENCER_MERGE").unwrap_or(defaults.merge),
            show_progress: env_parse("SILENCER_PROGRESS").unwrap_or(defaults.show_progress),
            timeout: env_parse::<u64>("SILENCER_TIMEOUT_SECS").map(Duration::from_secs),
            cost: CostModel::from_env(),
        }
    }

    pub fn with_suffix(mut self, suffix: OutputSuffix) -> Self {
        self.suffix = suffix;
        self
    }

    pub fn with_threshold_db(mut self, db: f64) -> Self {
        self.threshold_db = db;
        self
    }

    pub fn with_min_silence_secs(mut self, secs: f64) -> Self {
        self.min_silence_secs = secs;
        self
    }

    pub fn with_audio_index(mut self, index: Option<usize>) -> Self {
        self.audio_index = index;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cost(mut self, cost: CostModel) -> Self {
        self.cost = cost;
        self
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> WorkerResult<()> {
        if self.input.as_os_str().is_empty() {
            return Err(WorkerError::config_error("input path is empty"));
        }
        if self.output.as_os_str().is_empty() {
            return Err(WorkerError::config_error("output path is empty"));
        }
        if self.workers == 0 {
            return Err(WorkerError::config_error("worker count must be at least 1"));
        }
        if !self.threshold_db.is_finite() {
            return Err(WorkerError::config_error("silence threshold must be finite"));
        }
        if !self.min_silence_secs.is_finite() || self.min_silence_secs <= 0.0 {
            return Err(WorkerError::config_error(
                "minimum silence duration must be positive",
            ));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(WorkerError::config_error("timeout must be positive"));
        }
        let cost = &self.cost;
        if cost.invocation_cost.is_sign_negative()
            || cost.duration_weight.is_sign_negative()
            || cost.redundancy_slack.is_sign_negative()
        {
            return Err(WorkerError::config_error("cost model values must be non-negative"));
        }
        Ok(())
    }
}

/// Half of the available cores, at least one.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() / 2)
        .unwrap_or(4)
        .max(1)
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::new("in.m4a", "out");
        assert!(config.workers >= 1);
        assert!(config.show_progress);
        assert!(!config.merge);
        assert!(config.timeout.is_none());
        assert_eq!(config.cost, CostModel::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = PipelineConfig::new("in.m4a", "out").with_workers(0);
        assert!(matches!(config.validate(), Err(WorkerError::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_bad_durations() {
        let config = PipelineConfig::new("in.m4a", "out").with_min_silence_secs(0.0);
        assert!(config.validate().is_err());

        let config =
            PipelineConfig::new("in.m4a", "out").with_timeout(Some(Duration::ZERO));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_cost() {
        let cost = CostModel {
            invocation_cost: Decimal::from(-1),
            ..Default::default()
        };
        let config = PipelineConfig::new("in.m4a", "out").with_cost(cost);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_step_cost() {
        let cost = CostModel::default();
        assert_eq!(cost.step_cost(Decimal::from(5)), Decimal::from(8));
    }

    #[test]
    fn test_default_workers_at_least_one() {
        assert!(default_workers() >= 1);
    }
}
