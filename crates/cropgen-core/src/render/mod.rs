//! Canvas-style rendering of a cropped, scaled and rotated source image.
//!
//! The renderer mirrors how a 2D canvas draws an image through its current
//! transform, but computes the transform fresh on every call so repeated
//! renders never accumulate state.
//!
//! # Transform Order
//!
//! Reading from the source outwards, a source point is:
//! 1. Moved so the image center is at the origin
//! 2. Scaled uniformly by `Transform::scale`
//! 3. Rotated by `Transform::rotate_degrees`
//! 4. Moved back so the image center is where it started
//! 5. Shifted by `-crop.x, -crop.y` so the crop origin lands on the target origin
//! 6. Stretched so the crop fills the target's pixel size
//!
//! # Algorithm
//!
//! Rendering uses inverse mapping: for each target pixel center the
//! inverse transform gives the source position, which is sampled with the
//! chosen [`InterpolationFilter`]. Positions outside the source are
//! transparent.

mod affine;
mod canvas;
mod sample;
mod surface;

pub use affine::Affine;
pub use canvas::{crop_transform, render_crop, RenderError};
pub use sample::InterpolationFilter;
pub use surface::{RenderTarget, Surface};
