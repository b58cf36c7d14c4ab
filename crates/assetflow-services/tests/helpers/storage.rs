use std::sync::atomic::{AtomicU32, Ordering};

use assetflow_core::{StorageBackend, StorageLocation};
use assetflow_storage::{MemoryStorage, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Notify;

/// Memory storage whose first `n` puts fail with a transient error.
#[derive(Default)]
pub struct FlakyStorage {
    pub inner: MemoryStorage,
    failures_left: AtomicU32,
    puts: AtomicU32,
    deletes: AtomicU32,
}

impl FlakyStorage {
    pub fn failing(n: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(n),
            ..Default::default()
        }
    }

    pub fn put_calls(&self) -> u32 {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> u32 {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<StorageLocation> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let left = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if left.is_ok() {
            return Err(StorageError::Transient("503 Slow Down".to_string()));
        }
        self.inner.put(key, data, content_type).await
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

/// Memory storage whose puts wait until the test releases them.
#[derive(Default)]
pub struct GatedStorage {
    pub inner: MemoryStorage,
    /// Signalled when a put starts waiting
    pub started: Notify,
    release: Notify,
}

impl GatedStorage {
    /// Let one waiting (or the next) put through.
    pub fn release_one(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl Storage for GatedStorage {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<StorageLocation> {
        self.started.notify_one();
        self.release.notified().await;
        self.inner.put(key, data, content_type).await
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
