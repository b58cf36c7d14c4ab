//! Bulk operations over an explicit selection of asset ids
//!
//! Every operation reports one result per selected id; a failure on one id
//! never aborts the others.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use assetflow_core::{AssetRecord, ListQuery};
use assetflow_infra::call_with_timeout;
use assetflow_storage::{Storage, StorageError};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use uuid::Uuid;

use crate::error::PersistError;
use crate::metadata::MetadataStore;
use crate::reconcile::ReconcileQueue;
use crate::search::AssetIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkStatus {
    Done,
    /// Nothing to change (tags already present)
    Unchanged,
    /// No record with this id
    Missing,
    Failed,
}

/// Step at which a per-id operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkStep {
    Lookup,
    Storage,
    Metadata,
    Index,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkItemResult {
    pub id: Uuid,
    pub status: BulkStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<BulkStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BulkItemResult {
    fn ok(id: Uuid, status: BulkStatus) -> Self {
        Self {
            id,
            status,
            step: None,
            error: None,
        }
    }

    fn failed(id: Uuid, step: BulkStep, error: impl ToString) -> Self {
        Self {
            id,
            status: BulkStatus::Failed,
            step: Some(step),
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkReport {
    pub items: Vec<BulkItemResult>,
}

impl BulkReport {
    pub fn count(&self, status: BulkStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &BulkItemResult> {
        self.items.iter().filter(|i| i.status == BulkStatus::Failed)
    }

    pub fn get(&self, id: Uuid) -> Option<&BulkItemResult> {
        self.items.iter().find(|i| i.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadLink {
    pub id: Uuid,
    pub storage_url: String,
    pub original_name: String,
}

pub struct BulkOperationCoordinator {
    storage: Arc<dyn Storage>,
    metadata: Arc<MetadataStore>,
    index: Arc<dyn AssetIndex>,
    reconcile: Arc<ReconcileQueue>,
    concurrency: usize,
    call_timeout: Duration,
}

impl BulkOperationCoordinator {
    pub fn new(
        storage: Arc<dyn Storage>,
        metadata: Arc<MetadataStore>,
        index: Arc<dyn AssetIndex>,
        reconcile: Arc<ReconcileQueue>,
        concurrency: usize,
        call_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            metadata,
            index,
            reconcile,
            concurrency: concurrency.max(1),
            call_timeout,
        }
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        match call_with_timeout(self.call_timeout, self.storage.delete(key), StorageError::Timeout)
            .await
        {
            Ok(()) | Err(StorageError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn delete_one(&self, id: Uuid) -> BulkItemResult {
        let record = match self.metadata.get(id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                // Drop any stale index entry for an id that is already gone.
                let _writer = self.metadata.writer().await;
                if let Err(e) = self.index.remove(id).await {
                    self.reconcile.push(id);
                    return BulkItemResult::failed(id, BulkStep::Index, e);
                }
                return BulkItemResult::ok(id, BulkStatus::Missing);
            }
            Err(e) => return BulkItemResult::failed(id, BulkStep::Lookup, e),
        };

        if let Err(e) = self.delete_object(&record.storage_key).await {
            tracing::warn!(asset_id = %id, key = %record.storage_key, error = %e, "Bulk delete: storage step failed");
            return BulkItemResult::failed(id, BulkStep::Storage, e);
        }
        if let Some(thumb) = &record.thumbnail {
            if let Err(e) = self.delete_object(&thumb.key).await {
                tracing::warn!(asset_id = %id, key = %thumb.key, error = %e, "Failed to delete thumbnail");
            }
        }

        let writer = self.metadata.writer().await;
        if let Err(e) = writer.delete(id).await {
            tracing::warn!(asset_id = %id, error = %e, "Bulk delete: metadata step failed");
            return BulkItemResult::failed(id, BulkStep::Metadata, e);
        }

        if let Err(e) = self.index.remove(id).await {
            self.reconcile.push(id);
            return BulkItemResult::failed(id, BulkStep::Index, e);
        }

        tracing::info!(asset_id = %id, key = %record.storage_key, "Asset deleted");
        BulkItemResult::ok(id, BulkStatus::Done)
    }

    async fn tag_one(&self, id: Uuid, tags: &BTreeSet<String>) -> BulkItemResult {
        let writer = self.metadata.writer().await;
        let outcome = writer
            .update(id, |record| record.tags.extend(tags.iter().cloned()))
            .await;

        match outcome {
            Ok((_, false)) => BulkItemResult::ok(id, BulkStatus::Unchanged),
            Ok((updated, true)) => match self.index.index(&updated).await {
                Ok(()) => BulkItemResult::ok(id, BulkStatus::Done),
                Err(e) => {
                    self.reconcile.push(id);
                    BulkItemResult::failed(id, BulkStep::Index, e)
                }
            },
            Err(PersistError::NotFound(_)) => BulkItemResult::ok(id, BulkStatus::Missing),
            Err(e) => BulkItemResult::failed(id, BulkStep::Metadata, e),
        }
    }
}

/// Caller-owned set of selected ids bound to a coordinator
pub struct BulkSelection {
    coordinator: Arc<BulkOperationCoordinator>,
    ids: BTreeSet<Uuid>,
}

impl BulkSelection {
    pub fn new(coordinator: Arc<BulkOperationCoordinator>) -> Self {
        Self {
            coordinator,
            ids: BTreeSet::new(),
        }
    }

    /// Returns false if the id was already selected.
    pub fn select(&mut self, id: Uuid) -> bool {
        self.ids.insert(id)
    }

    pub fn deselect(&mut self, id: Uuid) -> bool {
        self.ids.remove(&id)
    }

    /// Returns whether the id is selected afterwards.
    pub fn toggle(&mut self, id: Uuid) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn select_all(&mut self, ids: impl IntoIterator<Item = Uuid>) {
        self.ids.extend(ids);
    }

    /// Select every record the query lists.
    pub async fn select_all_matching(&mut self, query: &ListQuery) -> Result<usize, PersistError> {
        let records = self.coordinator.metadata.list(query).await?;
        let before = self.ids.len();
        self.ids.extend(records.iter().map(|r| r.id));
        Ok(self.ids.len() - before)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.ids.iter().copied()
    }

    /// Delete storage objects, metadata and index entries of every selected id.
    ///
    /// Ids whose three steps all succeed (or whose record was already gone)
    /// leave the selection; failed ids stay selected for another attempt.
    #[tracing::instrument(skip(self), fields(selected = self.ids.len()))]
    pub async fn delete_selected(&mut self) -> BulkReport {
        let coordinator = Arc::clone(&self.coordinator);
        let ids: Vec<Uuid> = self.ids.iter().copied().collect();

        let items: Vec<BulkItemResult> = stream::iter(ids)
            .map(|id| {
                let coordinator = &coordinator;
                async move { coordinator.delete_one(id).await }
            })
            .buffered(coordinator.concurrency)
            .collect()
            .await;

        for item in &items {
            if item.status != BulkStatus::Failed {
                self.ids.remove(&item.id);
            }
        }

        let report = BulkReport { items };
        tracing::info!(
            deleted = report.count(BulkStatus::Done),
            missing = report.count(BulkStatus::Missing),
            failed = report.count(BulkStatus::Failed),
            "Bulk delete finished"
        );
        report
    }

    /// Union `tags` into every selected record. Tags are trimmed; empty ones are dropped.
    #[tracing::instrument(skip(self, tags), fields(selected = self.ids.len()))]
    pub async fn tag_selected<S: AsRef<str>>(&self, tags: &[S]) -> BulkReport {
        let tags: BTreeSet<String> = tags
            .iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let coordinator = &self.coordinator;
        let tags = &tags;
        let items: Vec<BulkItemResult> = stream::iter(self.ids.iter().copied())
            .map(|id| async move { coordinator.tag_one(id, tags).await })
            .buffered(coordinator.concurrency)
            .collect()
            .await;

        BulkReport { items }
    }

    /// Links for every selected id that still has a record.
    pub async fn download_selected(&self) -> Result<Vec<DownloadLink>, PersistError> {
        let mut links = Vec::with_capacity(self.ids.len());
        for id in &self.ids {
            if let Some(record) = self.coordinator.metadata.get(*id).await? {
                links.push(download_link(&record));
            }
        }
        Ok(links)
    }
}

fn download_link(record: &AssetRecord) -> DownloadLink {
    DownloadLink {
        id: record.id,
        storage_url: record.storage_url.clone(),
        original_name: record.original_name.clone(),
    }
}
