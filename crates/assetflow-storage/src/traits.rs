//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use assetflow_core::{ErrorMetadata, LogLevel, StorageLocation};
use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use thiserror::Error;

use crate::StorageBackend;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Interrupted I/O or a 5xx-like backend failure; worth retrying
    #[error("Transient storage error: {0}")]
    Transient(String),

    /// Quota, permissions or a 4xx-like rejection; retrying will not help
    #[error("Permanent storage error: {0}")]
    Permanent(String),

    #[error("Storage call timed out after {0} ms")]
    Timeout(u64),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Transient(_) | StorageError::Timeout(_))
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            ErrorKind::AlreadyExists => StorageError::AlreadyExists(err.to_string()),
            ErrorKind::NotFound => StorageError::NotFound(err.to_string()),
            ErrorKind::PermissionDenied | ErrorKind::InvalidInput | ErrorKind::Unsupported => {
                StorageError::Permanent(err.to_string())
            }
            ErrorKind::TimedOut => StorageError::Timeout(0),
            _ => StorageError::Transient(err.to_string()),
        }
    }
}

impl ErrorMetadata for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            StorageError::Transient(_) => "STORAGE_TRANSIENT",
            StorageError::Permanent(_) => "STORAGE_PERMANENT",
            StorageError::Timeout(_) => "STORAGE_TIMEOUT",
            StorageError::AlreadyExists(_) => "STORAGE_KEY_EXISTS",
            StorageError::NotFound(_) => "STORAGE_NOT_FOUND",
            StorageError::InvalidKey(_) => "STORAGE_INVALID_KEY",
            StorageError::ConfigError(_) => "STORAGE_CONFIG_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        self.is_transient()
    }

    fn log_level(&self) -> LogLevel {
        match self {
            StorageError::Transient(_) | StorageError::Timeout(_) => LogLevel::Warn,
            StorageError::NotFound(_) | StorageError::AlreadyExists(_) => LogLevel::Debug,
            _ => LogLevel::Error,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Content-addressed etag: hex SHA-256 of the stored bytes.
pub fn compute_etag(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Storage abstraction trait
///
/// All storage backends must implement this trait so the upload coordinator
/// works with any backend without coupling to implementation details.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `key` if nothing is stored there yet.
    ///
    /// Returns `StorageError::AlreadyExists` when the key is taken.
    async fn put(&self, key: &str, data: Bytes, content_type: &str)
        -> StorageResult<StorageLocation>;

    /// Read an object by its storage key
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Delete an object. Missing objects yield `StorageError::NotFound`.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
