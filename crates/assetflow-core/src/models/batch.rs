use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::asset::AssetRecord;
use super::job::JobState;

/// A file that did not make it to `Completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedItem {
    pub file_name: String,
    /// State the job was in when it failed
    pub stage: JobState,
    /// Error variant name (`FileTooLarge`)
    pub error: String,
    /// Stable wire code (`FILE_TOO_LARGE`)
    pub code: String,
    pub message: String,
}

/// Per-job trace, reported for every job that left `Queued`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub file_name: String,
    pub asset_id: Option<Uuid>,
    pub final_state: JobState,
    pub upload_attempts: u32,
    pub persist_attempts: u32,
    pub history: Vec<JobState>,
    /// Indexing failed and the id waits in the reconcile queue
    pub index_pending: bool,
}

/// Outcome of one `ingest` call; one entry per submitted file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    pub succeeded: Vec<AssetRecord>,
    pub failed: Vec<FailedItem>,
    /// Files never started because the batch was cancelled
    pub skipped: Vec<String>,
    pub jobs: Vec<JobReport>,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.skipped.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    pub fn job(&self, file_name: &str) -> Option<&JobReport> {
        self.jobs.iter().find(|j| j.file_name == file_name)
    }
}
