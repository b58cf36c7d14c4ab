//! Metadata store
//!
//! Single-writer facade over a [`PersistentStore`]. Writes are serialized by
//! an async mutex; readers go straight to the backend, which always holds a
//! complete record (the previous or the new one).
//!
//! Callers that must keep the search index in step with the store take a
//! [`MetadataWriter`] and apply the index mutation before dropping it.

use std::sync::Arc;
use std::time::Duration;

use assetflow_core::{AssetRecord, ListQuery};
use assetflow_db::{PersistentStore, StoreError};
use assetflow_infra::call_with_timeout;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::PersistError;

pub struct MetadataStore {
    store: Arc<dyn PersistentStore>,
    write_lock: Mutex<()>,
    call_timeout: Duration,
}

impl MetadataStore {
    pub fn new(store: Arc<dyn PersistentStore>, call_timeout: Duration) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
            call_timeout,
        }
    }

    async fn timed<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, StoreError>>,
    ) -> Result<T, PersistError> {
        call_with_timeout(
            self.call_timeout,
            async { fut.await.map_err(PersistError::from) },
            PersistError::Timeout,
        )
        .await
    }

    /// Exclusive write access, held until the returned writer is dropped.
    pub async fn writer(&self) -> MetadataWriter<'_> {
        MetadataWriter {
            _guard: self.write_lock.lock().await,
            metadata: self,
        }
    }

    pub async fn put(&self, record: &AssetRecord) -> Result<(), PersistError> {
        self.writer().await.put(record).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<AssetRecord>, PersistError> {
        self.timed(self.store.get(id)).await
    }

    /// Returns whether a record was removed.
    pub async fn delete(&self, id: Uuid) -> Result<bool, PersistError> {
        self.writer().await.delete(id).await
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<AssetRecord>, PersistError> {
        let mut records = self.timed(self.store.scan_all()).await?;
        query.apply(&mut records);
        Ok(records)
    }

    pub async fn count(&self) -> Result<usize, PersistError> {
        Ok(self.timed(self.store.scan_all()).await?.len())
    }

    /// See [`MetadataWriter::update`].
    pub async fn update<F>(&self, id: Uuid, f: F) -> Result<(AssetRecord, bool), PersistError>
    where
        F: FnOnce(&mut AssetRecord),
    {
        self.writer().await.update(id, f).await
    }
}

/// Holder of the metadata write lock
pub struct MetadataWriter<'a> {
    _guard: MutexGuard<'a, ()>,
    metadata: &'a MetadataStore,
}

impl MetadataWriter<'_> {
    #[tracing::instrument(skip(self, record), fields(asset_id = %record.id))]
    pub async fn put(&self, record: &AssetRecord) -> Result<(), PersistError> {
        let m = self.metadata;
        m.timed(m.store.put(record)).await
    }

    /// Returns whether a record was removed.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, PersistError> {
        let m = self.metadata;
        m.timed(m.store.delete(id)).await
    }

    /// Read-modify-write.
    ///
    /// Returns the resulting record and whether anything changed; unchanged
    /// records are not rewritten. Changing `id`, `category`, `uploaded_at` or
    /// `storage_key` is rejected.
    #[tracing::instrument(skip(self, f))]
    pub async fn update<F>(&self, id: Uuid, f: F) -> Result<(AssetRecord, bool), PersistError>
    where
        F: FnOnce(&mut AssetRecord),
    {
        let m = self.metadata;
        let current = m
            .timed(m.store.get(id))
            .await?
            .ok_or(PersistError::NotFound(id))?;

        let mut updated = current.clone();
        f(&mut updated);

        if let Some(field) = immutable_violation(&current, &updated) {
            return Err(PersistError::ImmutableField(field));
        }
        if updated == current {
            return Ok((current, false));
        }

        m.timed(m.store.put(&updated)).await?;
        Ok((updated, true))
    }
}

fn immutable_violation(before: &AssetRecord, after: &AssetRecord) -> Option<&'static str> {
    if !before.immutable_fields_differ(after) {
        return None;
    }
    if before.id != after.id {
        Some("id")
    } else if before.category != after.category {
        Some("category")
    } else if before.uploaded_at != after.uploaded_at {
        Some("uploaded_at")
    } else {
        Some("storage_key")
    }
}
