use crate::traits::{PersistentStore, StoreResult};
use assetflow_core::{AssetRecord, StoreBackend};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Non-durable store backed by a map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<Uuid, AssetRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn put(&self, record: &AssetRecord) -> StoreResult<()> {
        self.records.write().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<AssetRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.records.write().await.remove(&id).is_some())
    }

    async fn scan_all(&self) -> StoreResult<Vec<AssetRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    fn backend_type(&self) -> StoreBackend {
        StoreBackend::Memory
    }
}
