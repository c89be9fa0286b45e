//! Drawing surfaces and their target sizes.

use image::RgbaImage;

use super::RenderError;
use crate::geometry::CompletedCrop;

/// Pixel size and device pixel ratio of a render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTarget {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub device_pixel_ratio: f64,
}

impl RenderTarget {
    /// Target for an on-screen preview of `crop`.
    ///
    /// The logical size equals the crop's pixel size; the bitmap is that
    /// size multiplied by `device_pixel_ratio`, rounded down.
    pub fn preview(crop: &CompletedCrop, device_pixel_ratio: f64) -> Result<Self, RenderError> {
        if !device_pixel_ratio.is_finite() || device_pixel_ratio <= 0.0 {
            return Err(RenderError::Unavailable("device pixel ratio must be positive"));
        }
        let pixel_width = (crop.width() * device_pixel_ratio).floor() as u32;
        let pixel_height = (crop.height() * device_pixel_ratio).floor() as u32;
        if pixel_width == 0 || pixel_height == 0 {
            return Err(RenderError::Unavailable("preview target has no pixels"));
        }
        Ok(Self {
            pixel_width,
            pixel_height,
            device_pixel_ratio,
        })
    }

    /// Target with an exact pixel size, independent of the crop.
    pub fn fixed(pixel_width: u32, pixel_height: u32) -> Self {
        Self {
            pixel_width,
            pixel_height,
            device_pixel_ratio: 1.0,
        }
    }

    /// Size in logical (CSS-like) units.
    pub fn logical_size(&self) -> (f64, f64) {
        (
            self.pixel_width as f64 / self.device_pixel_ratio,
            self.pixel_height as f64 / self.device_pixel_ratio,
        )
    }
}

/// An RGBA bitmap that renders are drawn into.
///
/// Resizing clears the bitmap, like assigning a canvas's width/height.
#[derive(Debug, Clone)]
pub struct Surface {
    bitmap: RgbaImage,
    device_pixel_ratio: f64,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    /// An empty 0x0 surface.
    pub fn new() -> Self {
        Self {
            bitmap: RgbaImage::new(0, 0),
            device_pixel_ratio: 1.0,
        }
    }

    /// Resize to `width` x `height` and clear to transparent.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.bitmap = RgbaImage::new(width, height);
    }

    pub(crate) fn prepare(&mut self, target: &RenderTarget) {
        self.resize(target.pixel_width, target.pixel_height);
        self.device_pixel_ratio = target.device_pixel_ratio;
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    /// Check if nothing can be drawn on this surface
    pub fn is_empty(&self) -> bool {
        self.bitmap.width() == 0 || self.bitmap.height() == 0
    }

    pub fn bitmap(&self) -> &RgbaImage {
        &self.bitmap
    }

    pub(crate) fn bitmap_mut(&mut self) -> &mut RgbaImage {
        &mut self.bitmap
    }
}
