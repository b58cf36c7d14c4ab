//! Configuration module
//!
//! Pipeline, storage and store settings. Every value has an explicit default
//! and can be overridden through `ASSETFLOW_*` environment variables. There is
//! no global configuration object: callers build a value and pass it in.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use crate::models::AssetKind;
use crate::storage_types::{StorageBackend, StoreBackend};

const MAX_WIDTH: u32 = 1200;
const MAX_HEIGHT: u32 = 1200;
const JPEG_QUALITY: f32 = 0.85;
const THUMBNAIL_SIZE: u32 = 200;
const MAX_IMAGE_SIZE_MB: u64 = 10;
const MAX_VIDEO_SIZE_MB: u64 = 100;
const MAX_DOCUMENT_SIZE_MB: u64 = 25;
const MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 1000;
const CONCURRENCY_LIMIT: usize = 4;
const CALL_TIMEOUT_MS: u64 = 30_000;
const STORAGE_QUOTA_GB: u64 = 10;
const DEFAULT_ALLOWED_MIME_TYPES: &str = "image/jpeg,image/png,image/webp,video/mp4,video/webm,\
application/pdf,text/plain,application/msword,\
application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const MB: u64 = 1024 * 1024;
const GB: u64 = 1024 * MB;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Missing setting: {0}")]
    Missing(&'static str),
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T
where
    T: ToString,
{
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .unwrap_or(default)
}

fn env_list(name: &str, default: &str) -> Vec<String> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Ingestion pipeline configuration
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality in `(0.0, 1.0]`
    pub jpeg_quality: f32,
    pub thumbnail_size: u32,
    pub max_file_size_bytes_by_class: HashMap<AssetKind, u64>,
    pub allowed_mime_types: Vec<String>,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub concurrency_limit: usize,
    pub call_timeout_ms: u64,
    /// Denominator of the storage usage figure in `stats`
    pub storage_quota_bytes: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_width: MAX_WIDTH,
            max_height: MAX_HEIGHT,
            jpeg_quality: JPEG_QUALITY,
            thumbnail_size: THUMBNAIL_SIZE,
            max_file_size_bytes_by_class: default_size_limits(
                MAX_IMAGE_SIZE_MB,
                MAX_VIDEO_SIZE_MB,
                MAX_DOCUMENT_SIZE_MB,
            ),
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .split(',')
                .map(|s| s.to_string())
                .collect(),
            max_retries: MAX_RETRIES,
            retry_base_delay_ms: RETRY_BASE_DELAY_MS,
            concurrency_limit: CONCURRENCY_LIMIT,
            call_timeout_ms: CALL_TIMEOUT_MS,
            storage_quota_bytes: STORAGE_QUOTA_GB * GB,
        }
    }
}

fn default_size_limits(image_mb: u64, video_mb: u64, document_mb: u64) -> HashMap<AssetKind, u64> {
    HashMap::from([
        (AssetKind::Image, image_mb * MB),
        (AssetKind::Video, video_mb * MB),
        (AssetKind::Document, document_mb * MB),
    ])
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let max_image_size_mb = env_or("ASSETFLOW_MAX_IMAGE_SIZE_MB", MAX_IMAGE_SIZE_MB);
        let max_video_size_mb = env_or("ASSETFLOW_MAX_VIDEO_SIZE_MB", MAX_VIDEO_SIZE_MB);
        let max_document_size_mb = env_or("ASSETFLOW_MAX_DOCUMENT_SIZE_MB", MAX_DOCUMENT_SIZE_MB);

        let config = Self {
            max_width: env_or("ASSETFLOW_MAX_WIDTH", MAX_WIDTH),
            max_height: env_or("ASSETFLOW_MAX_HEIGHT", MAX_HEIGHT),
            jpeg_quality: env_or("ASSETFLOW_JPEG_QUALITY", JPEG_QUALITY),
            thumbnail_size: env_or("ASSETFLOW_THUMBNAIL_SIZE", THUMBNAIL_SIZE),
            max_file_size_bytes_by_class: default_size_limits(
                max_image_size_mb,
                max_video_size_mb,
                max_document_size_mb,
            ),
            allowed_mime_types: env_list("ASSETFLOW_ALLOWED_MIME_TYPES", DEFAULT_ALLOWED_MIME_TYPES),
            max_retries: env_or("ASSETFLOW_MAX_RETRIES", MAX_RETRIES),
            retry_base_delay_ms: env_or("ASSETFLOW_RETRY_BASE_DELAY_MS", RETRY_BASE_DELAY_MS),
            concurrency_limit: env_or("ASSETFLOW_CONCURRENCY_LIMIT", CONCURRENCY_LIMIT),
            call_timeout_ms: env_or("ASSETFLOW_CALL_TIMEOUT_MS", CALL_TIMEOUT_MS),
            storage_quota_bytes: env_or("ASSETFLOW_STORAGE_QUOTA_GB", STORAGE_QUOTA_GB)
                .saturating_mul(GB),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(ConfigError::Invalid {
                field: "max_width/max_height",
                reason: "dimensions must be positive".to_string(),
            });
        }
        if !(self.jpeg_quality > 0.0 && self.jpeg_quality <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "jpeg_quality",
                reason: format!("{} is outside (0, 1]", self.jpeg_quality),
            });
        }
        if self.thumbnail_size == 0 {
            return Err(ConfigError::Invalid {
                field: "thumbnail_size",
                reason: "must be positive".to_string(),
            });
        }
        if self.concurrency_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "concurrency_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.call_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "call_timeout_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.storage_quota_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "storage_quota_bytes",
                reason: "must be positive".to_string(),
            });
        }
        if self.allowed_mime_types.is_empty() {
            return Err(ConfigError::Invalid {
                field: "allowed_mime_types",
                reason: "allow-list is empty".to_string(),
            });
        }
        Ok(())
    }

    /// Size cap for a class; an unconfigured class falls back to the image cap.
    pub fn max_file_size_for(&self, kind: AssetKind) -> u64 {
        self.max_file_size_bytes_by_class
            .get(&kind)
            .copied()
            .unwrap_or(MAX_IMAGE_SIZE_MB * MB)
    }

    /// Quality on the 1..=100 scale the JPEG encoder expects.
    pub fn jpeg_quality_percent(&self) -> u8 {
        (self.jpeg_quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// Object storage settings
#[derive(Clone, Debug)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub local_storage_path: Option<String>,
    pub public_base_url: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            local_storage_path: Some("./data/objects".to_string()),
            public_base_url: Some("http://localhost:8080/media".to_string()),
        }
    }
}

impl StorageSettings {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let defaults = Self::default();
        let backend = match env::var("ASSETFLOW_STORAGE_BACKEND") {
            Ok(value) => value.parse::<StorageBackend>()?,
            Err(_) => defaults.backend,
        };
        Ok(Self {
            backend,
            local_storage_path: env::var("ASSETFLOW_LOCAL_STORAGE_PATH")
                .ok()
                .or(defaults.local_storage_path),
            public_base_url: env::var("ASSETFLOW_PUBLIC_BASE_URL")
                .ok()
                .or(defaults.public_base_url),
        })
    }
}

/// Metadata store settings
#[derive(Clone, Debug)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub metadata_path: Option<String>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Json,
            database_url: None,
            db_max_connections: 5,
            metadata_path: Some("./data/metadata.json".to_string()),
        }
    }
}

impl StoreSettings {
    /// `ASSETFLOW_STORE_BACKEND` wins; otherwise a database url selects
    /// Postgres and the JSON file store is the fallback.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let defaults = Self::default();
        let database_url = env::var("ASSETFLOW_DATABASE_URL").ok();
        let backend = match env::var("ASSETFLOW_STORE_BACKEND") {
            Ok(value) => value.parse::<StoreBackend>()?,
            Err(_) if database_url.is_some() => StoreBackend::Postgres,
            Err(_) => defaults.backend,
        };

        let settings = Self {
            backend,
            database_url,
            db_max_connections: env_or("ASSETFLOW_DB_MAX_CONNECTIONS", defaults.db_max_connections),
            metadata_path: env::var("ASSETFLOW_METADATA_PATH")
                .ok()
                .or(defaults.metadata_path),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == StoreBackend::Postgres {
            match &self.database_url {
                None => return Err(ConfigError::Missing("ASSETFLOW_DATABASE_URL")),
                Some(url) if !url.starts_with("postgres://") && !url.starts_with("postgresql://") => {
                    return Err(ConfigError::Invalid {
                        field: "ASSETFLOW_DATABASE_URL",
                        reason: "must be a PostgreSQL connection string".to_string(),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_width, 1200);
        assert_eq!(config.thumbnail_size, 200);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.concurrency_limit, 4);
        assert_eq!(config.call_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_file_size_for(AssetKind::Image), 10 * MB);
        assert!(config.allowed_mime_types.contains(&"image/jpeg".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_jpeg_quality_percent() {
        let mut config = PipelineConfig::default();
        assert_eq!(config.jpeg_quality_percent(), 85);
        config.jpeg_quality = 0.001;
        assert_eq!(config.jpeg_quality_percent(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PipelineConfig::default();
        config.jpeg_quality = 1.5;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.concurrency_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_postgres_store_requires_url() {
        let settings = StoreSettings {
            backend: StoreBackend::Postgres,
            database_url: None,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Missing("ASSETFLOW_DATABASE_URL"))
        ));
    }
}
