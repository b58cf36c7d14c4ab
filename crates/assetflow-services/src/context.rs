//! Pipeline context
//!
//! Owns every component of the ingestion system and is passed explicitly to
//! the pipeline, the bulk coordinator and maintenance operations.

use std::sync::Arc;

use assetflow_core::{
    AnalyticsSummary, AssetRecord, ConfigError, ListQuery, PipelineConfig, SearchFilters,
};
use assetflow_db::PersistentStore;
use assetflow_infra::RetryPolicy;
use assetflow_processing::{MediaValidator, TransformSettings, ValidationPolicy};
use assetflow_storage::Storage;
use serde::Serialize;
use uuid::Uuid;

use crate::analytics::AnalyticsCollector;
use crate::bulk::{BulkOperationCoordinator, BulkSelection};
use crate::error::{ContextError, PersistError};
use crate::metadata::MetadataStore;
use crate::pipeline::IngestionPipeline;
use crate::reconcile::ReconcileQueue;
use crate::search::{AssetIndex, SearchIndexer};
use crate::upload::UploadCoordinator;

/// Outcome of draining the reconcile queue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub reindexed: usize,
    /// Ids whose record no longer exists
    pub removed: usize,
    /// Ids that failed again and were queued back
    pub pending: usize,
}

pub struct PipelineContext {
    pub(crate) config: PipelineConfig,
    pub(crate) validator: MediaValidator,
    pub(crate) transform_settings: TransformSettings,
    pub(crate) policy: RetryPolicy,
    pub(crate) uploader: UploadCoordinator,
    pub(crate) metadata: Arc<MetadataStore>,
    pub(crate) index: Arc<dyn AssetIndex>,
    pub(crate) analytics: AnalyticsCollector,
    pub(crate) reconcile: Arc<ReconcileQueue>,
    bulk: Arc<BulkOperationCoordinator>,
}

impl PipelineContext {
    /// Build a context with the in-memory [`SearchIndexer`].
    pub fn new(
        config: PipelineConfig,
        storage: Arc<dyn Storage>,
        store: Arc<dyn PersistentStore>,
    ) -> Result<Arc<Self>, ConfigError> {
        Self::with_index(config, storage, store, Arc::new(SearchIndexer::new()))
    }

    pub fn with_index(
        config: PipelineConfig,
        storage: Arc<dyn Storage>,
        store: Arc<dyn PersistentStore>,
        index: Arc<dyn AssetIndex>,
    ) -> Result<Arc<Self>, ConfigError> {
        config.validate()?;

        let policy = RetryPolicy::from_config(&config);
        let metadata = Arc::new(MetadataStore::new(store, config.call_timeout()));
        let reconcile = Arc::new(ReconcileQueue::new());
        let bulk = Arc::new(BulkOperationCoordinator::new(
            Arc::clone(&storage),
            Arc::clone(&metadata),
            Arc::clone(&index),
            Arc::clone(&reconcile),
            config.concurrency_limit,
            config.call_timeout(),
        ));

        tracing::info!(
            storage = %storage.backend_type(),
            concurrency_limit = config.concurrency_limit,
            max_retries = config.max_retries,
            "Pipeline context ready"
        );

        Ok(Arc::new(Self {
            validator: MediaValidator::new(ValidationPolicy::from_config(&config)),
            transform_settings: TransformSettings::from_config(&config),
            uploader: UploadCoordinator::new(storage, policy, config.concurrency_limit),
            policy,
            metadata,
            index,
            analytics: AnalyticsCollector::with_storage_quota(config.storage_quota_bytes),
            reconcile,
            bulk,
            config,
        }))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        self.uploader.storage()
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn index(&self) -> &Arc<dyn AssetIndex> {
        &self.index
    }

    pub fn analytics(&self) -> &AnalyticsCollector {
        &self.analytics
    }

    pub fn reconcile_queue(&self) -> &ReconcileQueue {
        &self.reconcile
    }

    pub fn pipeline(self: &Arc<Self>) -> IngestionPipeline {
        IngestionPipeline::new(Arc::clone(self))
    }

    /// Empty selection bound to this context's stores.
    pub fn selection(&self) -> BulkSelection {
        BulkSelection::new(Arc::clone(&self.bulk))
    }

    /// Index every stored record and seed analytics. Call once at startup.
    pub async fn warm_up(&self) -> Result<usize, ContextError> {
        let records = self.rebuild_index().await?;
        self.analytics.seed(&records).await;
        Ok(records.len())
    }

    /// Replace the whole index with the store's contents. Clears the reconcile queue.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_index(&self) -> Result<Vec<AssetRecord>, ContextError> {
        let _writer = self.metadata.writer().await;
        let records = self.metadata.list(&ListQuery::default()).await?;
        self.index.rebuild(&records).await?;
        self.reconcile.clear();
        Ok(records)
    }

    /// Re-index queued ids against the committed record, or drop them from
    /// the index when the record is gone.
    #[tracing::instrument(skip(self), fields(queued = self.reconcile.len()))]
    pub async fn reconcile_index(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let _writer = self.metadata.writer().await;
        for id in self.reconcile.drain() {
            let outcome = match self.metadata.get(id).await {
                Ok(Some(record)) => self.index.index(&record).await.map(|_| true),
                Ok(None) => self.index.remove(id).await.map(|_| false),
                Err(e) => {
                    tracing::warn!(asset_id = %id, error = %e, "Reconcile lookup failed");
                    self.reconcile.push(id);
                    report.pending += 1;
                    continue;
                }
            };
            match outcome {
                Ok(true) => report.reindexed += 1,
                Ok(false) => report.removed += 1,
                Err(e) => {
                    tracing::warn!(asset_id = %id, error = %e, "Reconcile index update failed");
                    self.reconcile.push(id);
                    report.pending += 1;
                }
            }
        }

        tracing::info!(
            reindexed = report.reindexed,
            removed = report.removed,
            pending = report.pending,
            "Index reconciliation finished"
        );
        report
    }

    /// Ranked matches. Ids the index knows but the store no longer has are skipped.
    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<AssetRecord>, ContextError> {
        let ids = self.index.search(query, filters).await?;
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.metadata.get(id).await? {
                Some(record) => records.push(record),
                None => self.reconcile.push(id),
            }
        }
        Ok(records)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<AssetRecord>, PersistError> {
        self.metadata.get(id).await
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<AssetRecord>, PersistError> {
        self.metadata.list(query).await
    }

    pub async fn set_featured(&self, id: Uuid, featured: bool) -> Result<AssetRecord, PersistError> {
        let (record, _) = self
            .metadata
            .update(id, |r| r.is_featured = featured)
            .await?;
        Ok(record)
    }

    pub async fn set_sort_order(&self, id: Uuid, sort_order: i32) -> Result<AssetRecord, PersistError> {
        let (record, _) = self
            .metadata
            .update(id, |r| r.sort_order = sort_order)
            .await?;
        Ok(record)
    }

    /// Assign `sort_order` 0..n following `ids`. Returns how many records changed.
    pub async fn reorder(&self, ids: &[Uuid]) -> Result<usize, PersistError> {
        let mut changed = 0;
        for (position, id) in ids.iter().enumerate() {
            let position = i32::try_from(position).unwrap_or(i32::MAX);
            let (_, did_change) = self
                .metadata
                .update(*id, |r| r.sort_order = position)
                .await?;
            if did_change {
                changed += 1;
            }
        }
        Ok(changed)
    }

    pub async fn stats(&self) -> AnalyticsSummary {
        self.analytics.summary().await
    }
}
