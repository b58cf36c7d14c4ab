use assetflow_core::{AssetRecord, ErrorMetadata, LogLevel, StoreBackend};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or the call was interrupted
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store call timed out after {0} ms")]
    Timeout(u64),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Unavailable(_) | StoreError::Timeout(_) | StoreError::Io(_) => true,
            StoreError::Database(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
            ),
            StoreError::Serialization(_) | StoreError::ConfigError(_) => false,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err)
    }
}

impl ErrorMetadata for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "STORE_UNAVAILABLE",
            StoreError::Timeout(_) => "STORE_TIMEOUT",
            StoreError::Database(_) => "DATABASE_ERROR",
            StoreError::Io(_) => "STORE_IO_ERROR",
            StoreError::Serialization(_) => "STORE_SERIALIZATION_ERROR",
            StoreError::ConfigError(_) => "STORE_CONFIG_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        self.is_transient()
    }

    fn log_level(&self) -> LogLevel {
        if self.is_transient() {
            LogLevel::Warn
        } else {
            LogLevel::Error
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable key-value store for asset metadata, keyed by asset id.
#[async_trait]
pub trait PersistentStore: Send + Sync {
    /// Insert or replace the record stored under `record.id`.
    async fn put(&self, record: &AssetRecord) -> StoreResult<()>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<AssetRecord>>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Every stored record, in no particular order.
    async fn scan_all(&self) -> StoreResult<Vec<AssetRecord>>;

    fn backend_type(&self) -> StoreBackend;
}
