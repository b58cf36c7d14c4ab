use serde::{Deserialize, Serialize};

/// Lifecycle state of a single file moving through the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    Queued,
    Validating,
    Transforming,
    Uploading,
    Persisting,
    Indexing,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Legal edges of the state machine. Terminal states have none.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Queued, Validating)
                | (Validating, Transforming)
                | (Validating, Failed)
                | (Transforming, Uploading)
                | (Transforming, Failed)
                | (Uploading, Persisting)
                | (Uploading, Failed)
                | (Persisting, Indexing)
                | (Persisting, Failed)
                | (Indexing, Completed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "Queued",
            JobState::Validating => "Validating",
            JobState::Transforming => "Transforming",
            JobState::Uploading => "Uploading",
            JobState::Persisting => "Persisting",
            JobState::Indexing => "Indexing",
            JobState::Completed => "Completed",
            JobState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_is_legal() {
        let path = [
            JobState::Queued,
            JobState::Validating,
            JobState::Transforming,
            JobState::Uploading,
            JobState::Persisting,
            JobState::Indexing,
            JobState::Completed,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_terminal_states_are_never_left() {
        for next in [JobState::Queued, JobState::Validating, JobState::Failed] {
            assert!(!JobState::Completed.can_transition_to(next));
            assert!(!JobState::Failed.can_transition_to(next));
        }
    }

    #[test]
    fn test_indexing_cannot_fail() {
        assert!(!JobState::Indexing.can_transition_to(JobState::Failed));
        assert!(!JobState::Queued.can_transition_to(JobState::Failed));
    }
}
