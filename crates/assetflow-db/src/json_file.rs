use crate::traits::{PersistentStore, StoreError, StoreResult};
use assetflow_core::{AssetRecord, StoreBackend};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Single JSON document on disk holding every record.
///
/// The whole map is rewritten on each mutation through a temp file and a
/// rename, so a crash leaves either the old or the new document. The
/// in-memory map only changes after the rename succeeded.
#[derive(Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Arc<Mutex<BTreeMap<Uuid, AssetRecord>>>,
}

impl JsonFileStore {
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let records = if fs::try_exists(&path).await.unwrap_or(false) {
            let raw = fs::read(&path).await?;
            if raw.is_empty() {
                BTreeMap::new()
            } else {
                let list: Vec<AssetRecord> = serde_json::from_slice(&raw)?;
                list.into_iter().map(|r| (r.id, r)).collect()
            }
        } else {
            BTreeMap::new()
        };

        tracing::info!(
            path = %path.display(),
            records = records.len(),
            "JSON metadata store opened"
        );

        Ok(Self {
            path,
            records: Arc::new(Mutex::new(records)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, records: &BTreeMap<Uuid, AssetRecord>) -> StoreResult<()> {
        let list: Vec<&AssetRecord> = records.values().collect();
        let encoded = serde_json::to_vec_pretty(&list)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &encoded).await?;
        fs::rename(&tmp, &self.path).await.map_err(StoreError::from)
    }
}

#[async_trait]
impl PersistentStore for JsonFileStore {
    async fn put(&self, record: &AssetRecord) -> StoreResult<()> {
        let mut records = self.records.lock().await;
        let mut next = records.clone();
        next.insert(record.id, record.clone());
        // Swap only once the document is on disk; a cancelled flush leaves memory untouched.
        self.flush(&next).await?;
        *records = next;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<AssetRecord>> {
        Ok(self.records.lock().await.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut records = self.records.lock().await;
        if !records.contains_key(&id) {
            return Ok(false);
        }
        let mut next = records.clone();
        next.remove(&id);
        self.flush(&next).await?;
        *records = next;
        Ok(true)
    }

    async fn scan_all(&self) -> StoreResult<Vec<AssetRecord>> {
        Ok(self.records.lock().await.values().cloned().collect())
    }

    fn backend_type(&self) -> StoreBackend {
        StoreBackend::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetflow_core::AssetKind;
    use chrono::Utc;
    use std::collections::BTreeSet;
    use tempfile::tempdir;

    fn record(name: &str) -> AssetRecord {
        AssetRecord {
            id: Uuid::new_v4(),
            category: "sup".to_string(),
            original_name: name.to_string(),
            size_bytes: 42,
            mime_type: "application/pdf".to_string(),
            kind: AssetKind::Document,
            storage_key: format!("services/sup/{}", name),
            storage_url: format!("memory://services/sup/{}", name),
            etag: "e".to_string(),
            stored_content_type: "application/pdf".to_string(),
            stored_size_bytes: 42,
            width: None,
            height: None,
            thumbnail: None,
            uploaded_at: Utc::now(),
            is_featured: false,
            sort_order: 0,
            tags: BTreeSet::new(),
        }
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("meta/assets.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        let a = record("a.pdf");
        let b = record("b.pdf");
        store.put(&a).await.unwrap();
        store.put(&b).await.unwrap();
        assert!(store.delete(b.id).await.unwrap());
        assert!(!store.delete(b.id).await.unwrap());

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(reopened.get(a.id).await.unwrap(), Some(a));
        assert_eq!(reopened.get(b.id).await.unwrap(), None);
        assert_eq!(reopened.scan_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_put_replaces_existing_record() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("assets.json")).await.unwrap();

        let mut a = record("a.pdf");
        store.put(&a).await.unwrap();
        a.is_featured = true;
        store.put(&a).await.unwrap();

        let all = store.scan_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_featured);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("assets.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let result = JsonFileStore::open(&path).await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_failed_flush_leaves_memory_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("assets.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        let kept = record("kept.pdf");
        store.put(&kept).await.unwrap();

        // A directory where the temp file should go makes every write fail.
        tokio::fs::create_dir(path.with_extension("json.tmp")).await.unwrap();

        let lost = record("lost.pdf");
        assert!(store.put(&lost).await.is_err());
        assert_eq!(store.get(lost.id).await.unwrap(), None);
        assert!(store.delete(kept.id).await.is_err());
        assert_eq!(store.get(kept.id).await.unwrap(), Some(kept));
    }

    #[tokio::test]
    async fn test_cancelled_put_matches_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("assets.json");
        let store = JsonFileStore::open(&path).await.unwrap();

        let r = record("a.pdf");
        let outcome = tokio::time::timeout(std::time::Duration::ZERO, store.put(&r)).await;
        // Let any detached blocking write finish before reading the file back.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let in_memory = store.get(r.id).await.unwrap();
        let on_disk = JsonFileStore::open(&path).await.unwrap().get(r.id).await.unwrap();
        assert_eq!(in_memory, on_disk);
        if outcome.is_err() {
            assert_eq!(in_memory, None);
        }
    }
}
