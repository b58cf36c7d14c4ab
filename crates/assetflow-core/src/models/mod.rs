pub mod analytics;
pub mod asset;
pub mod batch;
pub mod job;
pub mod query;

pub use analytics::{
    AggregateKey, AggregateRow, AnalyticsSummary, CategoryStats, DayStats, StorageUsage,
};
pub use asset::{
    major_type, normalize_mime, AssetKind, AssetRecord, StorageLocation, TransformStrategy,
    RASTER_MIME_TYPES,
};
pub use batch::{BatchResult, FailedItem, JobReport};
pub use job::JobState;
pub use query::{deduplicate, ListQuery, SearchFilters, SortBy};
