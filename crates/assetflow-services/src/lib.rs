//! Asset ingestion services
//!
//! Upload coordination, metadata persistence, search, analytics, bulk
//! operations and the ingestion pipeline, all wired through an explicit
//! [`PipelineContext`].

pub mod analytics;
pub mod bulk;
pub mod context;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod reconcile;
pub mod search;
pub mod upload;

pub use analytics::AnalyticsCollector;
pub use bulk::{
    BulkItemResult, BulkOperationCoordinator, BulkReport, BulkSelection, BulkStatus, BulkStep,
    DownloadLink,
};
pub use context::{PipelineContext, ReconcileReport};
pub use error::{ContextError, IndexError, IngestError, PersistError, UploadError};
pub use metadata::{MetadataStore, MetadataWriter};
pub use pipeline::{guess_mime_type, FileSource, IngestItem, IngestionPipeline, UploadJob};
pub use reconcile::ReconcileQueue;
pub use search::{tokenize, AssetIndex, SearchIndexer};
pub use upload::{UploadCoordinator, UploadOutcome, UploadRequest};
