use crate::{JsonFileStore, MemoryStore, PersistentStore, PgAssetStore, StoreBackend, StoreError, StoreResult};
use assetflow_core::StoreSettings;
use std::sync::Arc;

/// Create a metadata store based on configuration
pub async fn create_store(settings: &StoreSettings) -> StoreResult<Arc<dyn PersistentStore>> {
    match settings.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory metadata store; records are lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Json => {
            let path = settings.metadata_path.clone().ok_or_else(|| {
                StoreError::ConfigError("ASSETFLOW_METADATA_PATH not configured".to_string())
            })?;
            Ok(Arc::new(JsonFileStore::open(path).await?))
        }
        StoreBackend::Postgres => {
            let url = settings.database_url.as_deref().ok_or_else(|| {
                StoreError::ConfigError("ASSETFLOW_DATABASE_URL not configured".to_string())
            })?;
            Ok(Arc::new(
                PgAssetStore::connect(url, settings.db_max_connections).await?,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_postgres_requires_url() {
        let settings = StoreSettings {
            backend: StoreBackend::Postgres,
            database_url: None,
            ..Default::default()
        };
        assert!(matches!(
            create_store(&settings).await,
            Err(StoreError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_json_backend_opens_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = StoreSettings {
            backend: StoreBackend::Json,
            metadata_path: Some(dir.path().join("m.json").display().to_string()),
            ..Default::default()
        };
        let store = create_store(&settings).await.unwrap();
        assert_eq!(store.backend_type(), StoreBackend::Json);
    }
}
