//! Upload coordinator
//!
//! Puts prepared bytes into object storage with per-call timeouts, bounded
//! in-flight puts, exponential backoff on transient failures and a single
//! suffix regeneration when a key is already taken.
//!
//! A put that timed out may still have landed. When its retry then finds the
//! key taken by identical bytes, that object is replaced in place instead of
//! being left behind under a fresh suffix.

use std::sync::Arc;

use assetflow_core::StorageLocation;
use assetflow_infra::{call_with_timeout, RetryPolicy};
use assetflow_storage::keys::KeyParts;
use assetflow_storage::{compute_etag, Storage, StorageError};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;

use crate::error::UploadError;

/// One object (plus optional thumbnail) to upload
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub category: String,
    pub original_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub data: Bytes,
    pub content_type: String,
    /// Replaces the original extension in the key (`jpg` for re-encoded rasters)
    pub stored_extension: Option<&'static str>,
    pub thumbnail: Option<Bytes>,
}

#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub location: StorageLocation,
    /// Put calls made for the primary object
    pub attempts: u32,
    pub thumbnail: Option<StorageLocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectRole {
    Primary,
    Thumbnail,
}

pub struct UploadCoordinator {
    storage: Arc<dyn Storage>,
    policy: RetryPolicy,
    permits: Arc<Semaphore>,
}

impl UploadCoordinator {
    pub fn new(storage: Arc<dyn Storage>, policy: RetryPolicy, max_in_flight: usize) -> Self {
        Self {
            storage,
            policy,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Upload the primary object, then its thumbnail.
    ///
    /// A failed thumbnail is logged and leaves `thumbnail` empty.
    #[tracing::instrument(skip(self, request), fields(file = %request.original_name, category = %request.category))]
    pub async fn upload(&self, request: &UploadRequest) -> Result<UploadOutcome, UploadError> {
        let mut parts = KeyParts::new(
            &request.category,
            request.uploaded_at,
            &request.original_name,
            request.stored_extension,
        );

        let (location, attempts) = self
            .put_with_retry(&mut parts, ObjectRole::Primary, &request.data, &request.content_type)
            .await?;

        let thumbnail = match &request.thumbnail {
            Some(data) => {
                let mut thumb_parts = parts.clone();
                match self
                    .put_with_retry(&mut thumb_parts, ObjectRole::Thumbnail, data, "image/jpeg")
                    .await
                {
                    Ok((loc, _)) => Some(loc),
                    Err(e) => {
                        tracing::warn!(
                            key = %location.key,
                            error = %e,
                            "Thumbnail upload failed; continuing without thumbnail"
                        );
                        None
                    }
                }
            }
            None => None,
        };

        Ok(UploadOutcome {
            location,
            attempts,
            thumbnail,
        })
    }

    /// Upload N requests under the in-flight cap; one result per request, in order.
    pub async fn upload_batch(
        &self,
        requests: &[UploadRequest],
    ) -> Vec<Result<UploadOutcome, UploadError>> {
        futures::future::join_all(requests.iter().map(|r| self.upload(r))).await
    }

    /// Remove an object, ignoring failures. Used to roll back orphaned uploads.
    pub async fn delete_best_effort(&self, key: &str) {
        let result = call_with_timeout(
            self.policy.call_timeout,
            self.storage.delete(key),
            StorageError::Timeout,
        )
        .await;
        match result {
            Ok(()) | Err(StorageError::NotFound(_)) => {
                tracing::debug!(key = %key, "Removed orphaned object");
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to remove orphaned object");
            }
        }
    }

    async fn holds_bytes(&self, key: &str, data: &Bytes) -> bool {
        let stored = call_with_timeout(
            self.policy.call_timeout,
            self.storage.get(key),
            StorageError::Timeout,
        )
        .await;
        match stored {
            Ok(stored) => compute_etag(&stored) == compute_etag(data),
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Could not read back existing object");
                false
            }
        }
    }

    async fn put_with_retry(
        &self,
        parts: &mut KeyParts,
        role: ObjectRole,
        data: &Bytes,
        content_type: &str,
    ) -> Result<(StorageLocation, u32), UploadError> {
        let mut attempts = 0;
        let mut retries = 0;
        let mut regenerated = false;
        let mut timed_out_key: Option<String> = None;

        loop {
            attempts += 1;
            let key = match role {
                ObjectRole::Primary => parts.asset_key(),
                ObjectRole::Thumbnail => parts.thumbnail_key(),
            };

            let permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| UploadError::Closed)?;
            let result = call_with_timeout(
                self.policy.call_timeout,
                self.storage.put(&key, data.clone(), content_type),
                StorageError::Timeout,
            )
            .await;
            drop(permit);

            match result {
                Ok(location) => {
                    tracing::debug!(key = %location.key, attempts, "Object stored");
                    return Ok((location, attempts));
                }
                Err(StorageError::AlreadyExists(_)) => {
                    let ours = timed_out_key.take().as_deref() == Some(key.as_str());
                    if ours && self.holds_bytes(&key, data).await {
                        tracing::warn!(key = %key, "Timed-out put had landed, replacing it");
                        self.delete_best_effort(&key).await;
                        continue;
                    }
                    if regenerated {
                        return Err(UploadError::KeyCollision { key, attempts });
                    }
                    tracing::warn!(key = %key, "Storage key collision, regenerating suffix");
                    regenerated = true;
                    parts.regenerate_suffix();
                }
                Err(e) if e.is_transient() && retries < self.policy.max_retries => {
                    if matches!(e, StorageError::Timeout(_)) {
                        timed_out_key = Some(key.clone());
                    }
                    let delay = self.policy.delay_for(retries);
                    retries += 1;
                    tracing::warn!(
                        key = %key,
                        attempt = attempts,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Upload failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_transient() => {
                    tracing::error!(key = %key, attempts, error = %e, "Upload retries exhausted");
                    return Err(UploadError::Exhausted {
                        attempts,
                        source: e,
                    });
                }
                Err(e) => {
                    tracing::error!(key = %key, attempts, error = %e, "Upload rejected");
                    return Err(UploadError::Rejected {
                        attempts,
                        source: e,
                    });
                }
            }
        }
    }
}
