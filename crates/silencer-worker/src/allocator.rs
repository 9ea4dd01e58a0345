//! Cost-balanced distribution of silence intervals over workers.
//!
//! Every FFmpeg invocation pays a fixed start-up cost on top of work that
//! scales with clip length, so each worker's load is estimated as
//! `sum(duration * duration_weight + invocation_cost)` over its intervals.
//! Intervals are walked in chronological order and greedily placed on the
//! cheapest worker unless that would push it past the per-worker target.

use rust_decimal::Decimal;
use thiserror::Error;

use silencer_models::{SilenceSet, TaskAssignment};

use crate::config::CostModel;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("at least 2 silence intervals are required, got {0}")]
    TooFewIntervals(usize),

    #[error("worker count must be at least 1")]
    NoWorkers,
}

/// Split the intervals of `set` into `workers` ordered task lists.
///
/// The result always has exactly `workers` slots; idle slots are empty.
/// Indices inside each list are ascending.
pub fn allocate(
    set: &SilenceSet,
    workers: usize,
    cost: &CostModel,
) -> Result<TaskAssignment, AllocationError> {
    let n = set.len();
    if n < 2 {
        return Err(AllocationError::TooFewIntervals(n));
    }
    if workers == 0 {
        return Err(AllocationError::NoWorkers);
    }

    let mut tasks: Vec<Vec<usize>> = vec![Vec::new(); workers];

    if n < workers {
        for (index, slot) in tasks.iter_mut().take(n).enumerate() {
            slot.push(index);
        }
        return Ok(TaskAssignment::new(tasks));
    }

    let target = target_cost(set, workers, cost);
    let mut loads = vec![Decimal::ZERO; workers];

    for (index, interval) in set.intervals.iter().enumerate() {
        let step = cost.step_cost(interval.duration);
        let cheapest = cheapest_worker(&loads);

        let chosen = if loads[cheapest] + step <= target {
            cheapest
        } else {
            (0..workers)
                .filter(|&w| w != cheapest)
                .find(|&w| loads[w] + step <= target)
                .unwrap_or(cheapest)
        };

        loads[chosen] += step;
        tasks[chosen].push(index);
    }

    Ok(TaskAssignment::new(tasks))
}

/// `(sum of weighted durations + invocation_cost * (N + slack)) / workers`
pub fn target_cost(set: &SilenceSet, workers: usize, cost: &CostModel) -> Decimal {
    let weighted: Decimal = set
        .intervals
        .iter()
        .map(|i| i.duration * cost.duration_weight)
        .sum();
    let invocations = Decimal::from(set.len()) + cost.redundancy_slack;
    (weighted + cost.invocation_cost * invocations) / Decimal::from(workers)
}

// First index wins ties.
fn cheapest_worker(loads: &[Decimal]) -> usize {
    let mut best = 0;
    for (w, load) in loads.iter().enumerate().skip(1) {
        if *load < loads[best] {
            best = w;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use silencer_models::SilenceInterval;
    use std::str::FromStr;

    fn set_with_durations(durations: &[&str]) -> SilenceSet {
        let mut cursor = Decimal::ZERO;
        let intervals = durations
            .iter()
            .map(|d| {
                let duration = Decimal::from_str(d).unwrap();
                cursor += Decimal::from(10);
                let end = cursor + duration;
                cursor = end;
                SilenceInterval::from_end(end, duration).unwrap()
            })
            .collect();
        SilenceSet::new("talk.m4a", 0, "aac", intervals)
    }

    #[test]
    fn test_balances_equal_intervals() {
        let set = set_with_durations(&["1", "1", "1", "1", "1"]);
        let assignment = allocate(&set, 2, &CostModel::default()).unwrap();

        assert_eq!(assignment.tasks_for(0), &[0, 2, 4]);
        assert_eq!(assignment.tasks_for(1), &[1, 3]);
        assert!(assignment.is_partition_of(5));
    }

    #[test]
    fn test_fewer_intervals_than_workers() {
        let set = set_with_durations(&["1", "2", "3"]);
        let assignment = allocate(&set, 5, &CostModel::default()).unwrap();

        assert_eq!(assignment.worker_slots(), 5);
        assert_eq!(assignment.counts(), vec![1, 1, 1, 0, 0]);
        assert_eq!(assignment.active_count(), 3);
        assert!(assignment.is_partition_of(3));
    }

    #[test]
    fn test_long_interval_spills_to_next_worker() {
        // target = (30 + 1 + 1 + 3 * 5) / 2 = 23.5
        let set = set_with_durations(&["30", "1", "1"]);
        let assignment = allocate(&set, 2, &CostModel::default()).unwrap();

        assert_eq!(assignment.tasks_for(0), &[0]);
        assert_eq!(assignment.tasks_for(1), &[1, 2]);
    }

    #[test]
    fn test_never_rejects_over_target() {
        let cost = CostModel {
            redundancy_slack: Decimal::ZERO,
            ..Default::default()
        };
        let set = set_with_durations(&["5", "5", "5", "20"]);
        let assignment = allocate(&set, 2, &cost).unwrap();
        assert!(assignment.is_partition_of(4));
    }

    #[test]
    fn test_lists_are_chronological() {
        let set = set_with_durations(&["0.5", "7.25", "2", "0.75", "3", "12", "1", "1.5"]);
        let assignment = allocate(&set, 3, &CostModel::default()).unwrap();

        assert!(assignment.is_partition_of(8));
        for (_, list) in assignment.active_workers() {
            assert!(list.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_deterministic() {
        let set = set_with_durations(&["0.5", "7.25", "2", "0.75", "3", "12"]);
        let a = allocate(&set, 4, &CostModel::default()).unwrap();
        let b = allocate(&set, 4, &CostModel::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_degenerate_input() {
        let set = set_with_durations(&["1"]);
        assert_eq!(
            allocate(&set, 2, &CostModel::default()),
            Err(AllocationError::TooFewIntervals(1))
        );

        let set = set_with_durations(&["1", "1"]);
        assert_eq!(
            allocate(&set, 0, &CostModel::default()),
            Err(AllocationError::NoWorkers)
        );
    }

    #[test]
    fn test_target_cost() {
        let set = set_with_durations(&["1", "1", "1", "1", "1"]);
        assert_eq!(target_cost(&set, 2, &CostModel::default()), Decimal::from(13));
    }
}
