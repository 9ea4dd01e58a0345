//! Per-segment extraction outcome.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Exit status and produced path of one extraction invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Index of the silence interval this segment follows
    pub task_index: usize,
    /// Process exit code; `None` when killed by a signal or timed out
    pub exit_code: Option<i32>,
    /// Absolute path of the segment file
    pub path: PathBuf,
}

impl ExtractionResult {
    pub fn new(task_index: usize, exit_code: Option<i32>, path: impl Into<PathBuf>) -> Self {
        Self {
            task_index,
            exit_code,
            path: path.into(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Exit status rendered for operator messages.
    pub fn status_label(&self) -> String {
        match self.exit_code {
            Some(code) => code.to_string(),
            None => "terminated".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_succeeded() {
        assert!(ExtractionResult::new(0, Some(0), "/tmp/a.aac").succeeded());
        assert!(!ExtractionResult::new(0, Some(1), "/tmp/a.aac").succeeded());
        assert!(!ExtractionResult::new(0, None, "/tmp/a.aac").succeeded());
    }

    #[test]
    fn test_status_label() {
        assert_eq!(ExtractionResult::new(0, Some(183), "/tmp/a").status_label(), "183");
        assert_eq!(ExtractionResult::new(0, None, "/tmp/a").status_label(), "terminated");
    }
}
