//! Crop geometry: rectangles, aspect ratios and unit conversion.
//!
//! Crop rectangles are always expressed relative to the natural (decoded)
//! dimensions of the source image. The interactive layer works in
//! percentage units so a crop survives display resizing; rendering and
//! export work in pixel units.
//!
//! # Coordinate System
//!
//! - (0, 0) = top-left corner of the source image
//! - Percentage units: 0.0 to 100.0 of the natural width/height
//! - Pixel units: 0.0 to natural width/height, fractional values allowed
//!
//! # Invariants
//!
//! Any region that reaches the renderer has passed through
//! [`CompletedCrop::new`], which guarantees it lies within the source
//! bounds and has a non-zero pixel size.

mod aspect;
mod crop;
mod types;

pub use aspect::AspectRatio;
pub use crop::{
    compute_initial_crop, constrain_crop, to_percent_units, to_pixel_units, CompletedCrop,
    INITIAL_CROP_PERCENT,
};
pub use types::{CropConstraints, CropRegion, CropUnit, GeometryError};
