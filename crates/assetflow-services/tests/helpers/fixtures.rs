use std::io::Cursor;

use assetflow_core::PipelineConfig;
use assetflow_services::IngestItem;
use image::{ImageFormat, Rgb, RgbImage};

/// Defaults with millisecond backoff so retry tests stay fast.
pub fn fast_config() -> PipelineConfig {
    PipelineConfig {
        retry_base_delay_ms: 1,
        call_timeout_ms: 2_000,
        ..PipelineConfig::default()
    }
}

/// Encoded PNG with a horizontal gradient.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, _| Rgb([(x % 256) as u8, 64, 128]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("Failed to encode test PNG");
    out.into_inner()
}

pub fn png_item(name: &str, category: &str, width: u32, height: u32) -> IngestItem {
    IngestItem::from_bytes(name, "image/png", category, create_test_png(width, height))
}

pub fn text_item(name: &str, category: &str, size: usize) -> IngestItem {
    IngestItem::from_bytes(name, "text/plain", category, vec![b'a'; size])
}
