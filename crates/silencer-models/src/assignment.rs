//! Worker task assignment.

use serde::{Deserialize, Serialize};

/// A partition of interval indices `0..N` across worker slots.
///
/// Slot lists keep chronological order; empty slots are skipped at
/// extraction time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskAssignment {
    tasks: Vec<Vec<usize>>,
}

impl TaskAssignment {
    pub fn new(tasks: Vec<Vec<usize>>) -> Self {
        Self { tasks }
    }

    /// Number of worker slots, including idle ones.
    pub fn worker_slots(&self) -> usize {
        self.tasks.len()
    }

    /// Task list for one slot.
    pub fn tasks_for(&self, worker: usize) -> &[usize] {
        self.tasks.get(worker).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Slots that actually have work, with their slot id.
    pub fn active_workers(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, tasks)| !tasks.is_empty())
            .map(|(worker, tasks)| (worker, tasks.as_slice()))
    }

    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_empty()).count()
    }

    pub fn total_assigned(&self) -> usize {
        self.tasks.iter().map(Vec::len).sum()
    }

    /// Per-slot task counts, in slot order.
    pub fn counts(&self) -> Vec<usize> {
        self.tasks.iter().map(Vec::len).collect()
    }

    /// Every index in `0..n` appears exactly once and nothing else does.
    pub fn is_partition_of(&self, n: usize) -> bool {
        let mut seen = vec![false; n];
        for &index in self.tasks.iter().flatten() {
            match seen.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        seen.into_iter().all(|s| s)
    }

    pub fn into_inner(self) -> Vec<Vec<usize>> {
        self.tasks
    }
}
