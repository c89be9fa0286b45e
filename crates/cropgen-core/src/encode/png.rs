//! PNG encoding for export.
//!
//! Uses the `image` crate's PNG encoder. PNG is lossless and keeps the
//! alpha channel, so pixels outside a rotated source stay transparent in
//! the submitted artifact.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::render::Surface;

/// MIME type of the encoded output.
pub const PNG_MIME_TYPE: &str = "image/png";

/// Errors from PNG encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The buffer is not exactly `width * height` RGBA pixels.
    #[error("RGBA buffer holds {actual} bytes, a {expected}-byte buffer is required")]
    InvalidPixelData { expected: usize, actual: usize },

    #[error("Cannot encode a {width}x{height} image")]
    InvalidDimensions { width: u32, height: u32 },

    /// The encoder itself failed.
    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Encode a row-major RGBA8 buffer of `width` x `height` pixels as PNG.
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(pixels, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(png)
}

/// Encode the current contents of a surface to PNG bytes.
pub fn encode_surface(surface: &Surface) -> Result<Vec<u8>, EncodeError> {
    let bitmap = surface.bitmap();
    encode_png(bitmap.as_raw(), bitmap.width(), bitmap.height())
}
