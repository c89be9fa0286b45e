//! Core types for crop geometry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for crop geometry operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// The source image has a zero dimension.
    #[error("Invalid source dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// The crop would cover zero pixels in at least one direction.
    #[error("Invalid geometry: crop of {width}x{height} pixels is degenerate")]
    Degenerate { width: f64, height: f64 },

    /// The crop extends past the source image.
    #[error(
        "Invalid geometry: crop ({x}, {y}, {width}x{height}) exceeds source bounds {bounds_width}x{bounds_height}"
    )]
    OutOfBounds {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        bounds_width: u32,
        bounds_height: u32,
    },

    /// A coordinate is NaN or infinite.
    #[error("Invalid geometry: non-finite coordinate")]
    NonFinite,

    /// The aspect ratio is zero or could not be parsed.
    #[error("Invalid aspect ratio: {0}")]
    InvalidAspectRatio(String),

    /// Scale must be positive and finite.
    #[error("Invalid scale {0}: must be positive and finite")]
    InvalidScale(f64),

    /// Rotation must be finite.
    #[error("Invalid rotation {0}")]
    InvalidRotation(f64),
}

/// Unit in which a [`CropRegion`] is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropUnit {
    /// Percentage of the natural width/height (0 to 100).
    #[default]
    Percent,
    /// Pixels of the natural image.
    Pixel,
}

/// A rectangle over the source image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub unit: CropUnit,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRegion {
    /// Create a region in percentage units.
    pub fn percent(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            unit: CropUnit::Percent,
            x,
            y,
            width,
            height,
        }
    }

    /// Create a region in pixel units.
    pub fn pixel(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            unit: CropUnit::Pixel,
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (x + width), in the region's own unit.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (y + height), in the region's own unit.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Optional size limits for an interactively adjusted crop, in source pixels.
///
/// Bounds and aspect ratio win over the minimums: a crop is never pushed
/// outside the image to satisfy `min_width`/`min_height`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CropConstraints {
    pub min_width: Option<f64>,
    pub min_height: Option<f64>,
    pub max_width: Option<f64>,
    pub max_height: Option<f64>,
}

impl CropConstraints {
    /// Check if no limit is set
    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_edges() {
        let r = CropRegion::pixel(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.right(), 40.0);
        assert_eq!(r.bottom(), 60.0);
        assert_eq!(r.unit, CropUnit::Pixel);
    }

    #[test]
    fn test_constraints_default_unconstrained() {
        assert!(CropConstraints::default().is_unconstrained());
        let c = CropConstraints {
            min_height: Some(200.0),
            ..Default::default()
        };
        assert!(!c.is_unconstrained());
    }

    #[test]
    fn test_geometry_error_display() {
        let err = GeometryError::Degenerate {
            width: 0.0,
            height: 10.0,
        };
        assert_eq!(
            err.to_string(),
            "Invalid geometry: crop of 0x10 pixels is degenerate"
        );
    }
}
