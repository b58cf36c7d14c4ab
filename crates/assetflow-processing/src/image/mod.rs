//! Raster image handling: fit-within resize, JPEG re-encode and square thumbnails.

mod resize;
mod transformer;

pub use resize::ImageResize;
pub use transformer::{ImageTransformer, TransformedImage};
