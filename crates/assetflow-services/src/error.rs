//! Service-level error types
//!
//! Every error carries [`ErrorMetadata`] so the pipeline can report a stable
//! code per failed file and log at the right level.

use assetflow_core::{ErrorMetadata, JobState, LogLevel};
use assetflow_db::StoreError;
use assetflow_processing::{TransformError, ValidationError};
use assetflow_storage::StorageError;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Upload failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: StorageError,
    },

    #[error("Upload rejected: {source}")]
    Rejected {
        attempts: u32,
        #[source]
        source: StorageError,
    },

    #[error("Storage key still taken after regenerating its suffix: {key}")]
    KeyCollision { key: String, attempts: u32 },

    #[error("Upload coordinator is shut down")]
    Closed,
}

impl UploadError {
    pub fn attempts(&self) -> u32 {
        match self {
            UploadError::Exhausted { attempts, .. }
            | UploadError::Rejected { attempts, .. }
            | UploadError::KeyCollision { attempts, .. } => *attempts,
            UploadError::Closed => 0,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::Exhausted { .. } => "Exhausted",
            UploadError::Rejected { .. } => "Rejected",
            UploadError::KeyCollision { .. } => "KeyCollision",
            UploadError::Closed => "Closed",
        }
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            UploadError::Exhausted { .. } => "UPLOAD_RETRIES_EXHAUSTED",
            UploadError::Rejected { .. } => "UPLOAD_REJECTED",
            UploadError::KeyCollision { .. } => "UPLOAD_KEY_COLLISION",
            UploadError::Closed => "UPLOAD_CLOSED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Error
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Metadata store call timed out after {0} ms")]
    Timeout(u64),

    #[error("Asset not found: {0}")]
    NotFound(Uuid),

    #[error("Field {0} cannot be changed after creation")]
    ImmutableField(&'static str),
}

impl PersistError {
    pub fn is_transient(&self) -> bool {
        match self {
            PersistError::Store(e) => e.is_transient(),
            PersistError::Timeout(_) => true,
            PersistError::NotFound(_) | PersistError::ImmutableField(_) => false,
        }
    }
}

impl ErrorMetadata for PersistError {
    fn error_code(&self) -> &'static str {
        match self {
            PersistError::Store(e) => e.error_code(),
            PersistError::Timeout(_) => "STORE_TIMEOUT",
            PersistError::NotFound(_) => "NOT_FOUND",
            PersistError::ImmutableField(_) => "IMMUTABLE_FIELD",
        }
    }

    fn is_recoverable(&self) -> bool {
        self.is_transient()
    }

    fn log_level(&self) -> LogLevel {
        match self {
            PersistError::NotFound(_) | PersistError::ImmutableField(_) => LogLevel::Debug,
            PersistError::Timeout(_) => LogLevel::Warn,
            PersistError::Store(e) => e.log_level(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Search index unavailable: {0}")]
    Unavailable(String),
}

impl ErrorMetadata for IndexError {
    fn error_code(&self) -> &'static str {
        "INDEX_UNAVAILABLE"
    }

    fn is_recoverable(&self) -> bool {
        true
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Warn
    }
}

/// Why one file did not reach `Completed`.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Persisting failed after {attempts} attempts: {source}")]
    Persist {
        attempts: u32,
        #[source]
        source: PersistError,
    },

    #[error("Could not read file contents: {0}")]
    Source(#[from] std::io::Error),

    #[error("Illegal job transition {from} -> {to}")]
    InvalidTransition { from: JobState, to: JobState },

    #[error("Batch cancelled before the job started")]
    Cancelled,

    #[error("Job task aborted: {0}")]
    Aborted(String),
}

impl IngestError {
    /// Name of the innermost error variant (`FileTooLarge`, `Corrupt`, ...).
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Validation(e) => e.kind(),
            IngestError::Transform(e) => e.kind(),
            IngestError::Upload(e) => e.kind(),
            IngestError::Persist { .. } => "PersistFailed",
            IngestError::Source(_) => "SourceRead",
            IngestError::InvalidTransition { .. } => "InvalidTransition",
            IngestError::Cancelled => "Cancelled",
            IngestError::Aborted(_) => "Aborted",
        }
    }
}

impl ErrorMetadata for IngestError {
    fn error_code(&self) -> &'static str {
        match self {
            IngestError::Validation(e) => e.error_code(),
            IngestError::Transform(e) => e.error_code(),
            IngestError::Upload(e) => e.error_code(),
            IngestError::Persist { .. } => "PERSIST_FAILED",
            IngestError::Source(_) => "SOURCE_READ_ERROR",
            IngestError::InvalidTransition { .. } => "INVALID_TRANSITION",
            IngestError::Cancelled => "CANCELLED",
            IngestError::Aborted(_) => "JOB_ABORTED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn log_level(&self) -> LogLevel {
        match self {
            IngestError::Validation(e) => e.log_level(),
            IngestError::Transform(e) => e.log_level(),
            IngestError::Cancelled => LogLevel::Debug,
            _ => LogLevel::Error,
        }
    }
}

/// Errors from maintenance operations on the context (rebuild, reconcile, mutations).
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

impl ErrorMetadata for ContextError {
    fn error_code(&self) -> &'static str {
        match self {
            ContextError::Persist(e) => e.error_code(),
            ContextError::Index(e) => e.error_code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            ContextError::Persist(e) => e.is_recoverable(),
            ContextError::Index(e) => e.is_recoverable(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            ContextError::Persist(e) => e.log_level(),
            ContextError::Index(e) => e.log_level(),
        }
    }
}
