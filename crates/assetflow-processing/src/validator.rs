use assetflow_core::{normalize_mime, AssetKind, ErrorMetadata, LogLevel, PipelineConfig};
use std::collections::HashMap;

/// Validation errors for submitted files
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid mime type: {mime_type} (allowed: {allowed:?})")]
    InvalidMimeType {
        mime_type: String,
        allowed: Vec<String>,
    },

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Empty file")]
    EmptyFile,

    #[error("Category must not be empty")]
    EmptyCategory,
}

impl ValidationError {
    /// Variant name, as reported per failed file.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::InvalidMimeType { .. } => "InvalidMimeType",
            ValidationError::FileTooLarge { .. } => "FileTooLarge",
            ValidationError::EmptyFile => "EmptyFile",
            ValidationError::EmptyCategory => "EmptyCategory",
        }
    }
}

impl ErrorMetadata for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            ValidationError::InvalidMimeType { .. } => "INVALID_MIME_TYPE",
            ValidationError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            ValidationError::EmptyFile => "EMPTY_FILE",
            ValidationError::EmptyCategory => "EMPTY_CATEGORY",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

/// Allow-list and per-class size caps
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    pub allowed_mime_types: Vec<String>,
    pub max_file_size_bytes_by_class: HashMap<AssetKind, u64>,
}

impl ValidationPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            allowed_mime_types: config
                .allowed_mime_types
                .iter()
                .map(|m| normalize_mime(m))
                .collect(),
            max_file_size_bytes_by_class: AssetKind::all()
                .into_iter()
                .map(|kind| (kind, config.max_file_size_for(kind)))
                .collect(),
        }
    }
}

/// Media file validator
///
/// Pure checks on the file descriptor; no bytes are read.
#[derive(Debug, Clone)]
pub struct MediaValidator {
    policy: ValidationPolicy,
}

impl MediaValidator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn validate_category(&self, category: &str) -> Result<(), ValidationError> {
        if category.trim().is_empty() {
            return Err(ValidationError::EmptyCategory);
        }
        Ok(())
    }

    /// Validate content type; comparison ignores case and parameters
    pub fn validate_content_type(&self, content_type: &str) -> Result<AssetKind, ValidationError> {
        let normalized = normalize_mime(content_type);

        if !self.policy.allowed_mime_types.iter().any(|ct| ct == &normalized) {
            return Err(ValidationError::InvalidMimeType {
                mime_type: content_type.to_string(),
                allowed: self.policy.allowed_mime_types.clone(),
            });
        }

        Ok(AssetKind::from_mime(&normalized))
    }

    /// Validate file size against the cap of its class
    pub fn validate_file_size(&self, size: u64, kind: AssetKind) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        let max = self
            .policy
            .max_file_size_bytes_by_class
            .get(&kind)
            .copied()
            .unwrap_or(u64::MAX);
        if size > max {
            return Err(ValidationError::FileTooLarge { size, max });
        }

        Ok(())
    }

    /// Run every check and return the asset kind on success
    pub fn validate_all(
        &self,
        category: &str,
        size: u64,
        content_type: &str,
    ) -> Result<AssetKind, ValidationError> {
        self.validate_category(category)?;
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }
        let kind = self.validate_content_type(content_type)?;
        self.validate_file_size(size, kind)?;
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> MediaValidator {
        MediaValidator::new(ValidationPolicy::from_config(&PipelineConfig::default()))
    }

    #[test]
    fn test_validate_all_accepts_allowed_file() {
        let kind = validator().validate_all("wohnmobil", 1024, "image/jpeg").unwrap();
        assert_eq!(kind, AssetKind::Image);
    }

    #[test]
    fn test_mime_comparison_ignores_case_and_parameters() {
        let kind = validator()
            .validate_all("sup", 10, "IMAGE/PNG; charset=binary")
            .unwrap();
        assert_eq!(kind, AssetKind::Image);
    }

    #[test]
    fn test_rejects_unlisted_mime() {
        let err = validator()
            .validate_all("sup", 10, "application/x-msdownload")
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidMimeType { .. }));
        assert_eq!(err.error_code(), "INVALID_MIME_TYPE");
    }

    #[test]
    fn test_size_class_follows_kind() {
        let v = validator();
        // 50 MiB is too large for an image but fine for a video.
        let size = 50 * 1024 * 1024;
        assert!(matches!(
            v.validate_all("sup", size, "image/jpeg"),
            Err(ValidationError::FileTooLarge { .. })
        ));
        assert_eq!(v.validate_all("sup", size, "video/mp4").unwrap(), AssetKind::Video);
    }

    #[test]
    fn test_empty_inputs() {
        let v = validator();
        assert_eq!(
            v.validate_all("sup", 0, "image/jpeg"),
            Err(ValidationError::EmptyFile)
        );
        assert_eq!(
            v.validate_all("  ", 10, "image/jpeg"),
            Err(ValidationError::EmptyCategory)
        );
    }

    #[test]
    fn test_size_at_limit_is_accepted() {
        let v = validator();
        assert!(v
            .validate_all("sup", 10 * 1024 * 1024, "image/webp")
            .is_ok());
    }
}
