//! Parallel segment extraction.

use futures::future::join_all;
use tracing::{debug, warn};

use silencer_media::{ExtractRequest, MediaEngine};
use silencer_models::{ExtractionResult, SilenceSet, TaskAssignment};

use super::layout::WorkLayout;

/// Extract one worker's intervals, in order.
///
/// An engine error is recorded as a result without exit status so the
/// remaining intervals of this worker still run.
pub async fn run_worker<E: MediaEngine + ?Sized>(
    engine: &E,
    set: &SilenceSet,
    layout: &WorkLayout,
    worker: usize,
    tasks: &[usize],
) -> Vec<ExtractionResult> {
    let mut results = Vec::with_capacity(tasks.len());

    for &task_index in tasks {
        let Some(span) = set.segment_span(task_index) else {
            warn!(worker, task_index, "Task index outside silence set, skipping");
            continue;
        };

        let output = layout.segment_path(&span, set.audio_index, &set.suffix);
        let request = ExtractRequest {
            source: set.source.clone(),
            audio_index: set.audio_index,
            span,
            output: output.clone(),
        };

        let result = match engine.extract(&request).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    worker,
                    task_index,
                    file = %output.display(),
                    error = %e,
                    "Segment extraction could not run"
                );
                ExtractionResult::new(task_index, None, output)
            }
        };
        results.push(result);
    }

    debug!(worker, count = results.len(), "Worker finished");
    results
}

/// Run every non-empty worker list concurrently and wait for all of them.
///
/// Results come back sorted by interval index, not completion order.
pub async fn fan_out<E: MediaEngine + ?Sized>(
    engine: &E,
    set: &SilenceSet,
    assignment: &TaskAssignment,
    layout: &WorkLayout,
) -> Vec<ExtractionResult> {
    let futures: Vec<_> = assignment
        .active_workers()
        .map(|(worker, tasks)| run_worker(engine, set, layout, worker, tasks))
        .collect();

    let mut results: Vec<ExtractionResult> =
        join_all(futures).await.into_iter().flatten().collect();
    results.sort_by_key(|r| r.task_index);
    results
}

/// Extraction results split by status, each in chronological order.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub succeeded: Vec<ExtractionResult>,
    pub failed: Vec<ExtractionResult>,
}

impl Aggregation {
    pub fn from_results(results: Vec<ExtractionResult>) -> Self {
        let (succeeded, failed): (Vec<_>, Vec<_>) =
            results.into_iter().partition(ExtractionResult::succeeded);
        Self { succeeded, failed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_aggregation_partitions_by_exit_status() {
        let results = vec![
            ExtractionResult::new(0, Some(0), "/out/a_0.aac"),
            ExtractionResult::new(1, Some(1), "/out/a_1.aac"),
            ExtractionResult::new(2, None, "/out/a_2.aac"),
            ExtractionResult::new(3, Some(0), "/out/a_3.aac"),
        ];
        let agg = Aggregation::from_results(results);

        let ok: Vec<usize> = agg.succeeded.iter().map(|r| r.task_index).collect();
        let failed: Vec<usize> = agg.failed.iter().map(|r| r.task_index).collect();
        assert_eq!(ok, vec![0, 3]);
        assert_eq!(failed, vec![1, 2]);
        assert_eq!(agg.failed[1].path, PathBuf::from("/out/a_2.aac"));
    }
}
