//! Assetflow Media Processing Library
//!
//! Validation and byte preparation for ingested files: the pure validator,
//! raster resize/re-encode/thumbnail, and the async dispatch that runs the
//! CPU-bound image work off the runtime threads.

pub mod image;
pub mod transform;
pub mod validator;

// Re-export commonly used types
pub use self::image::{ImageResize, ImageTransformer, TransformedImage};
pub use transform::{transform, TransformError, TransformOutput, TransformSettings};
pub use validator::{MediaValidator, ValidationError, ValidationPolicy};
