use crate::{LocalStorage, MemoryStorage, Storage, StorageBackend, StorageError, StorageResult};
use assetflow_core::StorageSettings;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(settings: &StorageSettings) -> StorageResult<Arc<dyn Storage>> {
    match settings.backend {
        StorageBackend::Local => {
            let base_path = settings.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("ASSETFLOW_LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = settings.public_base_url.clone().ok_or_else(|| {
                StorageError::ConfigError("ASSETFLOW_PUBLIC_BASE_URL not configured".to_string())
            })?;

            let storage = LocalStorage::new(base_path, base_url).await?;
            tracing::info!(backend = %settings.backend, "Storage backend ready");
            Ok(Arc::new(storage))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; objects are lost on exit");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}
