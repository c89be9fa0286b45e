//! Drawing a completed crop onto a surface.

use thiserror::Error;

use super::sample::sample;
use super::{Affine, InterpolationFilter, RenderTarget, Surface};
use crate::decode::SourceImage;
use crate::geometry::CompletedCrop;
use crate::Transform;

/// Errors that can occur while rendering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// A precondition for drawing is not met; never retried.
    #[error("Render unavailable: {0}")]
    Unavailable(&'static str),

    /// The crop was validated against an image of a different size.
    #[error("Crop was made for a {crop_width}x{crop_height} image, source is {source_width}x{source_height}")]
    SourceMismatch {
        crop_width: u32,
        crop_height: u32,
        source_width: u32,
        source_height: u32,
    },
}

/// Build the transform that maps source pixels onto `target`.
///
/// Scale and rotation pivot on the center of the natural image; the crop
/// origin then moves to the target origin and the crop is stretched to the
/// target's pixel size.
pub fn crop_transform(crop: &CompletedCrop, transform: &Transform, target: &RenderTarget) -> Affine {
    let (natural_w, natural_h) = crop.natural_size();
    let center_x = natural_w as f64 / 2.0;
    let center_y = natural_h as f64 / 2.0;
    let stretch_x = target.pixel_width as f64 / crop.width();
    let stretch_y = target.pixel_height as f64 / crop.height();

    Affine::IDENTITY
        .scale(stretch_x, stretch_y)
        .translate(-crop.x(), -crop.y())
        .translate(center_x, center_y)
        .rotate(transform.rotate_degrees.to_radians())
        .scale(transform.scale, transform.scale)
        .translate(-center_x, -center_y)
}

/// Render `crop` of `source` onto `surface` at the size given by `target`.
///
/// The surface is resized (and therefore cleared) first, and the draw
/// transform is built from scratch, so calling this repeatedly with the
/// same inputs always produces the same pixels.
///
/// # Errors
///
/// - `RenderError::Unavailable` if the target has no pixels or the
///   transform cannot be inverted
/// - `RenderError::SourceMismatch` if `crop` belongs to another image
pub fn render_crop(
    source: &SourceImage,
    crop: &CompletedCrop,
    transform: &Transform,
    target: &RenderTarget,
    surface: &mut Surface,
    filter: InterpolationFilter,
) -> Result<(), RenderError> {
    if target.pixel_width == 0 || target.pixel_height == 0 {
        return Err(RenderError::Unavailable("target surface has no pixels"));
    }

    let (crop_width, crop_height) = crop.natural_size();
    let (source_width, source_height) = source.dimensions();
    if (crop_width, crop_height) != (source_width, source_height) {
        return Err(RenderError::SourceMismatch {
            crop_width,
            crop_height,
            source_width,
            source_height,
        });
    }

    let inverse = crop_transform(crop, transform, target)
        .invert()
        .ok_or(RenderError::Unavailable("draw transform is not invertible"))?;

    surface.prepare(target);
    let pixels = source.pixels();
    for (x, y, out) in surface.bitmap_mut().enumerate_pixels_mut() {
        // Target pixel center back into source space, then to pixel-index space
        let (sx, sy) = inverse.apply(x as f64 + 0.5, y as f64 + 0.5);
        out.0 = sample(pixels, sx - 0.5, sy - 0.5, filter);
    }

    log::debug!(
        "rendered crop {:.1}x{:.1}+{:.1}+{:.1} to {}x{} (scale {}, rotate {}deg, {:?})",
        crop.width(),
        crop.height(),
        crop.x(),
        crop.y(),
        target.pixel_width,
        target.pixel_height,
        transform.scale,
        transform.rotate_degrees,
        filter
    );

    Ok(())
}
