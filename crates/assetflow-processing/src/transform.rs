use assetflow_core::{normalize_mime, ErrorMetadata, LogLevel, PipelineConfig, TransformStrategy};
use bytes::Bytes;

use crate::image::ImageTransformer;

const THUMBNAIL_QUALITY: u8 = 80;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Image could not be decoded: {0}")]
    Corrupt(String),

    #[error("Image could not be encoded: {0}")]
    Encode(String),

    #[error("Image worker failed: {0}")]
    Worker(String),
}

impl TransformError {
    pub fn kind(&self) -> &'static str {
        match self {
            TransformError::Corrupt(_) => "Corrupt",
            TransformError::Encode(_) => "Encode",
            TransformError::Worker(_) => "Worker",
        }
    }
}

impl ErrorMetadata for TransformError {
    fn error_code(&self) -> &'static str {
        match self {
            TransformError::Corrupt(_) => "CORRUPT_IMAGE",
            TransformError::Encode(_) => "IMAGE_ENCODE_ERROR",
            TransformError::Worker(_) => "IMAGE_WORKER_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn log_level(&self) -> LogLevel {
        match self {
            TransformError::Corrupt(_) => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

/// Raster settings, on the integer scales the codecs use
#[derive(Debug, Clone, Copy)]
pub struct TransformSettings {
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
    pub thumbnail_quality: u8,
    pub thumbnail_size: u32,
}

impl TransformSettings {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_width: config.max_width,
            max_height: config.max_height,
            jpeg_quality: config.jpeg_quality_percent(),
            thumbnail_quality: THUMBNAIL_QUALITY,
            thumbnail_size: config.thumbnail_size,
        }
    }
}

/// Bytes ready for upload
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub data: Bytes,
    pub content_type: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub thumbnail: Option<Bytes>,
    /// Raster input was re-encoded as JPEG
    pub reencoded: bool,
}

/// Prepare `data` according to `strategy`.
///
/// Raster work runs on the blocking pool; pass-through returns the input as is.
pub async fn transform(
    strategy: TransformStrategy,
    data: Bytes,
    mime_type: &str,
    settings: &TransformSettings,
) -> Result<TransformOutput, TransformError> {
    match strategy {
        TransformStrategy::PassThrough => Ok(TransformOutput {
            data,
            content_type: normalize_mime(mime_type),
            width: None,
            height: None,
            thumbnail: None,
            reencoded: false,
        }),
        TransformStrategy::Raster => {
            let transformer = ImageTransformer::new(*settings);
            let image = tokio::task::spawn_blocking(move || transformer.process(&data))
                .await
                .map_err(|e| TransformError::Worker(e.to_string()))??;

            Ok(TransformOutput {
                data: Bytes::from(image.data),
                content_type: "image/jpeg".to_string(),
                width: Some(image.width),
                height: Some(image.height),
                thumbnail: Some(Bytes::from(image.thumbnail)),
                reencoded: true,
            })
        }
    }
}
