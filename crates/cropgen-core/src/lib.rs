//! Cropgen Core - crop geometry, rendering and export
//!
//! This crate holds the synchronous half of cropgen: decoding the selected
//! file, computing and validating crop rectangles, drawing a cropped,
//! scaled and rotated region onto a surface, and producing the fixed
//! 1024x1024 PNG that is submitted for generation.

pub mod decode;
pub mod encode;
pub mod export;
pub mod geometry;
pub mod render;

pub use decode::{DecodeError, SourceImage};
pub use export::{ExportError, ExportPipeline, ExportPrecondition, ExportRequest, ExportedArtifact};
pub use geometry::{
    compute_initial_crop, constrain_crop, to_percent_units, to_pixel_units, AspectRatio,
    CompletedCrop, CropConstraints, CropRegion, CropUnit, GeometryError,
};
pub use render::{render_crop, InterpolationFilter, RenderError, RenderTarget, Surface};

/// Scale and rotation applied around the source image center.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform {
    /// Uniform scale factor (must be positive)
    pub scale: f64,
    /// Rotation in degrees, positive = clockwise on screen
    pub rotate_degrees: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotate_degrees: 0.0,
        }
    }
}

impl Transform {
    /// Create a transform, rejecting scales that are not positive and finite.
    pub fn new(scale: f64, rotate_degrees: f64) -> Result<Self, GeometryError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(GeometryError::InvalidScale(scale));
        }
        if !rotate_degrees.is_finite() {
            return Err(GeometryError::InvalidRotation(rotate_degrees));
        }
        Ok(Self {
            scale,
            rotate_degrees,
        })
    }

    /// Check if this is the identity transform
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
