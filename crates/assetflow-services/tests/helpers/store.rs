use std::sync::atomic::{AtomicU32, Ordering};

use assetflow_core::{AssetRecord, StoreBackend};
use assetflow_db::{MemoryStore, PersistentStore, StoreError, StoreResult};
use async_trait::async_trait;
use uuid::Uuid;

/// Memory store whose first `n` puts fail with `Unavailable`.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failures_left: AtomicU32,
    puts: AtomicU32,
}

impl FlakyStore {
    pub fn failing(n: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(n),
            ..Default::default()
        }
    }

    pub fn put_calls(&self) -> u32 {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersistentStore for FlakyStore {
    async fn put(&self, record: &AssetRecord) -> StoreResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let left = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if left.is_ok() {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.put(record).await
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<AssetRecord>> {
        self.inner.get(id).await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete(id).await
    }

    async fn scan_all(&self) -> StoreResult<Vec<AssetRecord>> {
        self.inner.scan_all().await
    }

    fn backend_type(&self) -> StoreBackend {
        StoreBackend::Memory
    }
}
