//! Shared key generation for storage backends.
//!
//! Key format: `services/{category}/{millis}-{suffix}-{filename}` for assets,
//! `thumbnails/{category}/{millis}-{suffix}-{filename}` for thumbnails.

use chrono::{DateTime, Utc};
use rand::Rng;

const MAX_FILENAME_LENGTH: usize = 255;
pub const ASSET_PREFIX: &str = "services";
pub const THUMBNAIL_PREFIX: &str = "thumbnails";

/// Reduce a user-supplied filename to a safe single path segment.
pub fn sanitize_filename(filename: &str) -> String {
    let path = std::path::Path::new(filename);
    let base = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if base.contains("..") {
        return "invalid_filename".to_string();
    }
    let s: String = base
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim().is_empty() || s.len() < 3 {
        "file".to_string()
    } else {
        s
    }
}

/// Category folder name: lower-case ASCII, everything else replaced by `_`.
pub fn sanitize_category(category: &str) -> String {
    let s: String = category
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if s.is_empty() {
        "uncategorized".to_string()
    } else {
        s
    }
}

/// Swap (or add) the extension of a filename.
pub fn with_extension(filename: &str, extension: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{}.{}", stem, extension),
        _ => format!("{}.{}", filename, extension),
    }
}

/// Eight hex characters, regenerated on key collision.
pub fn random_suffix() -> String {
    format!("{:08x}", rand::rng().random::<u32>())
}

/// Naming input shared by an asset and its thumbnail.
#[derive(Debug, Clone)]
pub struct KeyParts {
    pub category: String,
    pub uploaded_at: DateTime<Utc>,
    pub suffix: String,
    pub filename: String,
}

impl KeyParts {
    /// `stored_extension` replaces the original extension (`jpg` for re-encoded rasters).
    pub fn new(
        category: &str,
        uploaded_at: DateTime<Utc>,
        original_name: &str,
        stored_extension: Option<&str>,
    ) -> Self {
        let sanitized = sanitize_filename(original_name);
        let filename = match stored_extension {
            Some(ext) => with_extension(&sanitized, ext),
            None => sanitized,
        };
        Self {
            category: sanitize_category(category),
            uploaded_at,
            suffix: random_suffix(),
            filename,
        }
    }

    pub fn regenerate_suffix(&mut self) {
        self.suffix = random_suffix();
    }

    fn leaf(&self) -> String {
        format!(
            "{}-{}-{}",
            self.uploaded_at.timestamp_millis(),
            self.suffix,
            self.filename
        )
    }

    pub fn asset_key(&self) -> String {
        format!("{}/{}/{}", ASSET_PREFIX, self.category, self.leaf())
    }

    /// Thumbnails are always JPEG.
    pub fn thumbnail_key(&self) -> String {
        format!(
            "{}/{}/{}",
            THUMBNAIL_PREFIX,
            self.category,
            with_extension(&self.leaf(), "jpg")
        )
    }
}
