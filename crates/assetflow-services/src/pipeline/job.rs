use assetflow_core::{AssetKind, JobReport, JobState, StorageLocation, TransformStrategy};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::IngestError;

/// Objects already in storage; a persist retry commits against these
/// instead of uploading again.
#[derive(Debug, Clone)]
pub struct ResumeLocation {
    pub primary: StorageLocation,
    pub thumbnail: Option<StorageLocation>,
}

/// One file moving through the state machine.
#[derive(Debug)]
pub struct UploadJob {
    pub file_name: String,
    pub asset_id: Uuid,
    pub uploaded_at: DateTime<Utc>,
    pub kind: Option<AssetKind>,
    pub strategy: Option<TransformStrategy>,
    /// Put calls made for the primary object
    pub attempt: u32,
    pub persist_attempts: u32,
    pub resume_location: Option<ResumeLocation>,
    pub index_pending: bool,
    pub last_error: Option<String>,
    state: JobState,
    history: Vec<JobState>,
}

impl UploadJob {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            asset_id: Uuid::new_v4(),
            uploaded_at: Utc::now(),
            kind: None,
            strategy: None,
            attempt: 0,
            persist_attempts: 0,
            resume_location: None,
            index_pending: false,
            last_error: None,
            state: JobState::Queued,
            history: vec![JobState::Queued],
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn history(&self) -> &[JobState] {
        &self.history
    }

    /// Move to `next`, rejecting edges the state machine does not have.
    pub fn transition(&mut self, next: JobState) -> Result<(), IngestError> {
        if !self.state.can_transition_to(next) {
            return Err(IngestError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(file = %self.file_name, from = %self.state, to = %next, "Job transition");
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// Record `error` and move to `Failed`. Returns the stage the job failed in.
    pub fn fail(&mut self, error: &IngestError) -> JobState {
        let stage = self.state;
        self.last_error = Some(error.to_string());
        if self.state.can_transition_to(JobState::Failed) {
            self.state = JobState::Failed;
            self.history.push(JobState::Failed);
        }
        stage
    }

    pub fn report(&self) -> JobReport {
        JobReport {
            file_name: self.file_name.clone(),
            asset_id: (self.state == JobState::Completed).then_some(self.asset_id),
            final_state: self.state,
            upload_attempts: self.attempt,
            persist_attempts: self.persist_attempts,
            history: self.history.clone(),
            index_pending: self.index_pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illegal_transition_is_rejected() {
        let mut job = UploadJob::new("a.jpg");
        let err = job.transition(JobState::Uploading).unwrap_err();
        assert!(matches!(
            err,
            IngestError::InvalidTransition {
                from: JobState::Queued,
                to: JobState::Uploading
            }
        ));
        assert_eq!(job.state(), JobState::Queued);
    }

    #[test]
    fn test_terminal_state_is_never_left() {
        let mut job = UploadJob::new("a.jpg");
        job.transition(JobState::Validating).unwrap();
        let stage = job.fail(&IngestError::Cancelled);
        assert_eq!(stage, JobState::Validating);
        assert_eq!(job.state(), JobState::Failed);

        assert!(job.transition(JobState::Transforming).is_err());
        job.fail(&IngestError::Cancelled);
        assert_eq!(
            job.history(),
            &[JobState::Queued, JobState::Validating, JobState::Failed]
        );
        assert_eq!(job.report().asset_id, None);
    }
}
