//! Core types for image decoding.

use image::{DynamicImage, RgbaImage};
use thiserror::Error;

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file is not an image, or its format is not supported.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// The image decoded to zero pixels.
    #[error("Image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// The EXIF orientation tag, named after the correction that makes the
/// stored pixels display upright.
///
/// Tag values 1 through 8 map to the variants in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Upright,
    FlipH,
    Rotate180,
    FlipV,
    Rotate90FlipH,
    Rotate90,
    Rotate270FlipH,
    Rotate270,
}

impl Orientation {
    const BY_TAG: [Orientation; 8] = [
        Orientation::Upright,
        Orientation::FlipH,
        Orientation::Rotate180,
        Orientation::FlipV,
        Orientation::Rotate90FlipH,
        Orientation::Rotate90,
        Orientation::Rotate270FlipH,
        Orientation::Rotate270,
    ];

    /// Look up an EXIF orientation tag value. Out-of-range values are `None`.
    pub fn from_exif(tag: u32) -> Option<Self> {
        let index = usize::try_from(tag.checked_sub(1)?).ok()?;
        Self::BY_TAG.get(index).copied()
    }

    /// Whether the upright image has width and height exchanged.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Rotate90
                | Orientation::Rotate270
                | Orientation::Rotate90FlipH
                | Orientation::Rotate270FlipH
        )
    }

    /// Turn stored pixels upright.
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Upright => img,
            Orientation::FlipH => img.fliph(),
            Orientation::Rotate180 => img.rotate180(),
            Orientation::FlipV => img.flipv(),
            Orientation::Rotate90FlipH => img.rotate90().fliph(),
            Orientation::Rotate90 => img.rotate90(),
            Orientation::Rotate270FlipH => img.rotate270().fliph(),
            Orientation::Rotate270 => img.rotate270(),
        }
    }
}

/// A decoded source image, immutable once loaded.
///
/// Width and height are the natural dimensions after orientation
/// correction; every crop region is expressed relative to them.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    /// Wrap an RGBA raster. Fails if it has no pixels.
    pub fn new(pixels: RgbaImage) -> Result<Self, DecodeError> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::Empty { width, height });
        }
        Ok(Self { pixels })
    }

    /// Decode an encoded image file (PNG or JPEG).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        super::decode_image(bytes)
    }

    /// Natural width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Natural height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}
