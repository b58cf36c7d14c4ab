use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use assetflow_core::{AssetRecord, SearchFilters};
use assetflow_services::{AssetIndex, IndexError, SearchIndexer};
use async_trait::async_trait;
use tokio::sync::Notify;
use uuid::Uuid;

/// Real indexer behind switches that make writes fail.
#[derive(Default)]
pub struct FailingIndex {
    pub inner: SearchIndexer,
    pub fail_index: AtomicBool,
    pub fail_remove: AtomicBool,
}

impl FailingIndex {
    pub fn failing_writes() -> Self {
        let index = Self::default();
        index.fail_index.store(true, Ordering::SeqCst);
        index.fail_remove.store(true, Ordering::SeqCst);
        index
    }

    pub fn heal(&self) {
        self.fail_index.store(false, Ordering::SeqCst);
        self.fail_remove.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl AssetIndex for FailingIndex {
    async fn index(&self, record: &AssetRecord) -> Result<(), IndexError> {
        if self.fail_index.load(Ordering::SeqCst) {
            return Err(IndexError::Unavailable("index offline".to_string()));
        }
        self.inner.index(record).await
    }

    async fn remove(&self, id: Uuid) -> Result<(), IndexError> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(IndexError::Unavailable("index offline".to_string()));
        }
        self.inner.remove(id).await
    }

    async fn search(&self, query: &str, filters: &SearchFilters) -> Result<Vec<Uuid>, IndexError> {
        self.inner.search(query, filters).await
    }

    async fn rebuild(&self, records: &[AssetRecord]) -> Result<(), IndexError> {
        self.inner.rebuild(records).await
    }

    async fn len(&self) -> usize {
        self.inner.len().await
    }

    async fn contains(&self, id: Uuid) -> bool {
        self.inner.contains(id).await
    }
}

/// Real indexer whose next `index` call stalls once armed.
pub struct SlowIndex {
    pub inner: SearchIndexer,
    armed: AtomicBool,
    delay: Duration,
    /// Signalled when the stalled call starts waiting
    pub stalled: Notify,
}

impl SlowIndex {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: SearchIndexer::new(),
            armed: AtomicBool::new(false),
            delay,
            stalled: Notify::new(),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AssetIndex for SlowIndex {
    async fn index(&self, record: &AssetRecord) -> Result<(), IndexError> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.stalled.notify_one();
            tokio::time::sleep(self.delay).await;
        }
        self.inner.index(record).await
    }

    async fn remove(&self, id: Uuid) -> Result<(), IndexError> {
        self.inner.remove(id).await
    }

    async fn search(&self, query: &str, filters: &SearchFilters) -> Result<Vec<Uuid>, IndexError> {
        self.inner.search(query, filters).await
    }

    async fn rebuild(&self, records: &[AssetRecord]) -> Result<(), IndexError> {
        self.inner.rebuild(records).await
    }

    async fn len(&self) -> usize {
        self.inner.len().await
    }

    async fn contains(&self, id: Uuid) -> bool {
        self.inner.contains(id).await
    }
}
