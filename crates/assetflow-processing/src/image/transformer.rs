use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageReader};
use std::io::Cursor;

use super::resize::ImageResize;
use crate::transform::{TransformError, TransformSettings};

/// Result of processing one raster image
#[derive(Debug, Clone)]
pub struct TransformedImage {
    /// JPEG bytes of the resized image
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// JPEG bytes of the square thumbnail
    pub thumbnail: Vec<u8>,
}

/// Synchronous raster pipeline. Call it from `spawn_blocking`.
pub struct ImageTransformer {
    settings: TransformSettings,
}

impl ImageTransformer {
    pub fn new(settings: TransformSettings) -> Self {
        Self { settings }
    }

    pub fn decode(data: &[u8]) -> Result<DynamicImage, TransformError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| TransformError::Corrupt(e.to_string()))?;
        reader
            .decode()
            .map_err(|e| TransformError::Corrupt(e.to_string()))
    }

    /// JPEG has no alpha channel, so the image is flattened to RGB first.
    pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, TransformError> {
        let rgb = img.to_rgb8();
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality)
            .encode_image(&rgb)
            .map_err(|e| TransformError::Encode(e.to_string()))?;
        Ok(buf)
    }

    pub fn process(&self, data: &[u8]) -> Result<TransformedImage, TransformError> {
        let img = Self::decode(data)?;
        let (orig_width, orig_height) = img.dimensions();
        let (width, height) = ImageResize::fit_within(
            orig_width,
            orig_height,
            self.settings.max_width,
            self.settings.max_height,
        );

        let resized = ImageResize::resize_image(&img, width, height);
        let encoded = Self::encode_jpeg(&resized, self.settings.jpeg_quality)?;

        let thumb = ImageResize::center_square(&img, self.settings.thumbnail_size);
        let thumbnail = Self::encode_jpeg(&thumb, self.settings.thumbnail_quality)?;

        tracing::debug!(
            orig_width,
            orig_height,
            width,
            height,
            size_bytes = encoded.len(),
            thumbnail_bytes = thumbnail.len(),
            "Image transformed"
        );

        Ok(TransformedImage {
            data: encoded,
            width,
            height,
            thumbnail,
        })
    }
}
