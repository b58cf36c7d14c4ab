//! Assetflow Core Library
//!
//! Domain models, configuration and error metadata shared by every assetflow
//! crate. Nothing in here performs I/O.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{ConfigError, PipelineConfig, StorageSettings, StoreSettings};
pub use error::{ErrorMetadata, LogLevel};
pub use models::{
    major_type, normalize_mime, AggregateKey, AggregateRow, AnalyticsSummary, AssetKind,
    AssetRecord, BatchResult, CategoryStats, DayStats, FailedItem, JobReport, JobState, ListQuery,
    SearchFilters, SortBy, StorageLocation, StorageUsage, TransformStrategy,
};
pub use storage_types::{StorageBackend, StoreBackend};
