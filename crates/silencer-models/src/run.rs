//! Pipeline run identity and state.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stage of the split pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Reading stream metadata
    #[default]
    Probing,
    /// Running silence detection
    Detecting,
    /// Distributing intervals across workers
    Allocating,
    /// Worker jobs extracting segments
    Extracting,
    /// Collecting extraction results
    Aggregating,
    /// Concatenating surviving segments
    Merging,
    /// Finished, possibly with warnings
    Done,
    /// A precondition or required stage failed
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Probing => "probing",
            PipelineState::Detecting => "detecting",
            PipelineState::Allocating => "allocating",
            PipelineState::Extracting => "extracting",
            PipelineState::Aggregating => "aggregating",
            PipelineState::Merging => "merging",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;

        if next == Failed {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Probing, Detecting)
                | (Detecting, Allocating)
                | (Detecting, Done)
                | (Allocating, Extracting)
                | (Extracting, Aggregating)
                | (Aggregating, Merging)
                | (Aggregating, Done)
                | (Merging, Done)
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_unique() {
        assert_ne!(RunId::new(), RunId::new());
        assert_eq!(RunId::from_string("abc").as_str(), "abc");
    }

    #[test]
    fn test_transitions() {
        use PipelineState::*;

        assert!(Probing.can_transition_to(Detecting));
        assert!(Detecting.can_transition_to(Done));
        assert!(Aggregating.can_transition_to(Done));
        assert!(Merging.can_transition_to(Failed));
        assert!(!Probing.can_transition_to(Extracting));
        assert!(!Done.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Probing));
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&PipelineState::Aggregating).unwrap();
        assert_eq!(json, "\"aggregating\"");
        assert!(PipelineState::Done.is_terminal());
        assert!(!PipelineState::Merging.is_terminal());
    }
}
