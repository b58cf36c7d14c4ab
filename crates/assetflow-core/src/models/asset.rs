use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raster formats that are decoded, resized and re-encoded as JPEG.
pub const RASTER_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/bmp",
];

/// Lower-cases a mime type and strips any parameters (`; charset=...`).
pub fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Major type of a mime string (`image` for `image/png`).
pub fn major_type(mime: &str) -> String {
    let normalized = normalize_mime(mime);
    match normalized.split_once('/') {
        Some((major, _)) => major.to_string(),
        None => normalized,
    }
}

/// Asset kind, derived once from the mime type when a file enters the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Video,
    Document,
}

impl AssetKind {
    /// Vector images are treated as documents: they are never rasterized.
    pub fn from_mime(mime: &str) -> Self {
        let normalized = normalize_mime(mime);
        if normalized == "image/svg+xml" {
            return AssetKind::Document;
        }
        match normalized.split('/').next() {
            Some("image") => AssetKind::Image,
            Some("video") => AssetKind::Video,
            _ => AssetKind::Document,
        }
    }

    pub fn all() -> [AssetKind; 3] {
        [AssetKind::Image, AssetKind::Video, AssetKind::Document]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Video => "video",
            AssetKind::Document => "document",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssetKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(AssetKind::Image),
            "video" => Ok(AssetKind::Video),
            "document" => Ok(AssetKind::Document),
            _ => Err(anyhow::anyhow!("Invalid asset kind: {}", s)),
        }
    }
}

/// How the bytes of an asset are prepared before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformStrategy {
    /// Decode, resize, re-encode as JPEG and thumbnail
    Raster,
    /// Upload the submitted bytes untouched
    PassThrough,
}

impl TransformStrategy {
    pub fn for_mime(mime: &str) -> Self {
        let normalized = normalize_mime(mime);
        if RASTER_MIME_TYPES.contains(&normalized.as_str()) {
            TransformStrategy::Raster
        } else {
            TransformStrategy::PassThrough
        }
    }
}

/// Where an object landed in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLocation {
    pub key: String,
    pub url: String,
    pub etag: String,
}

/// Committed metadata for one ingested asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: Uuid,
    pub category: String,
    pub original_name: String,
    /// Declared size of the submitted file
    pub size_bytes: u64,
    pub mime_type: String,
    pub kind: AssetKind,
    pub storage_key: String,
    pub storage_url: String,
    pub etag: String,
    pub stored_content_type: String,
    pub stored_size_bytes: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub thumbnail: Option<StorageLocation>,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl AssetRecord {
    pub fn major_type(&self) -> String {
        major_type(&self.mime_type)
    }

    pub fn upload_day(&self) -> NaiveDate {
        self.uploaded_at.date_naive()
    }

    pub fn location(&self) -> StorageLocation {
        StorageLocation {
            key: self.storage_key.clone(),
            url: self.storage_url.clone(),
            etag: self.etag.clone(),
        }
    }

    /// True when `other` differs from `self` in a field that may never change
    /// after creation.
    pub fn immutable_fields_differ(&self, other: &AssetRecord) -> bool {
        self.id != other.id
            || self.category != other.category
            || self.uploaded_at != other.uploaded_at
            || self.storage_key != other.storage_key
    }
}
