//! Crop rectangle computation, conversion and validation.
//!
//! # Example
//!
//! ```ignore
//! use cropgen_core::geometry::{compute_initial_crop, AspectRatio, CompletedCrop};
//!
//! // Centered square covering 90% of the shorter side
//! let crop = compute_initial_crop(2000, 1000, Some(AspectRatio::SQUARE))?;
//! let completed = CompletedCrop::new(&crop, 2000, 1000)?;
//! assert_eq!(completed.width().round(), 900.0);
//! ```

use super::{AspectRatio, CropConstraints, CropRegion, CropUnit, GeometryError};

/// Share of the limiting dimension covered by a freshly computed crop.
pub const INITIAL_CROP_PERCENT: f64 = 90.0;

/// Slack allowed when checking a region against the source bounds.
///
/// Percentage to pixel conversion is not exact in floating point, so a
/// region that touches the right/bottom edge can overshoot by a few ulps.
const BOUNDS_EPSILON: f64 = 1e-6;

/// Smallest pixel extent a crop may have on either axis.
const MIN_CROP_PIXELS: f64 = 1.0;

fn natural_size(natural_width: u32, natural_height: u32) -> Result<(f64, f64), GeometryError> {
    if natural_width == 0 || natural_height == 0 {
        return Err(GeometryError::InvalidDimensions {
            width: natural_width,
            height: natural_height,
        });
    }
    Ok((natural_width as f64, natural_height as f64))
}

/// Convert any region to pixels without checking degeneracy.
fn raw_pixels(region: &CropRegion, w: f64, h: f64) -> CropRegion {
    match region.unit {
        CropUnit::Pixel => *region,
        CropUnit::Percent => CropRegion::pixel(
            region.x * w / 100.0,
            region.y * h / 100.0,
            region.width * w / 100.0,
            region.height * h / 100.0,
        ),
    }
}

fn with_unit(pixels: CropRegion, unit: CropUnit, w: f64, h: f64) -> CropRegion {
    match unit {
        CropUnit::Pixel => pixels,
        CropUnit::Percent => CropRegion::percent(
            pixels.x / w * 100.0,
            pixels.y / h * 100.0,
            pixels.width / w * 100.0,
            pixels.height / h * 100.0,
        ),
    }
}

/// Compute the starting crop for a freshly loaded image.
///
/// The region is centered, covers [`INITIAL_CROP_PERCENT`] of the limiting
/// dimension and honors `aspect` when one is given. With no aspect ratio
/// both sides cover 90% of their own dimension. The result is returned in
/// percentage units.
///
/// # Errors
///
/// Returns `GeometryError::InvalidDimensions` if either natural dimension
/// is zero.
pub fn compute_initial_crop(
    natural_width: u32,
    natural_height: u32,
    aspect: Option<AspectRatio>,
) -> Result<CropRegion, GeometryError> {
    let (w, h) = natural_size(natural_width, natural_height)?;

    // Largest rectangle of the requested shape that fits the image
    let (fit_w, fit_h) = match aspect {
        Some(ratio) => {
            let r = ratio.value();
            if w / h > r {
                (h * r, h)
            } else {
                (w, w / r)
            }
        }
        None => (w, h),
    };

    let crop_w = fit_w * INITIAL_CROP_PERCENT / 100.0;
    let crop_h = fit_h * INITIAL_CROP_PERCENT / 100.0;
    let pixels = CropRegion::pixel((w - crop_w) / 2.0, (h - crop_h) / 2.0, crop_w, crop_h);

    log::debug!(
        "initial crop for {}x{} (aspect {:?}): {:.2}x{:.2} at ({:.2}, {:.2})",
        natural_width,
        natural_height,
        aspect.map(|a| a.to_string()),
        crop_w,
        crop_h,
        pixels.x,
        pixels.y
    );

    Ok(with_unit(pixels, CropUnit::Percent, w, h))
}

/// Convert a region to pixel units of the natural image.
///
/// Pixel regions are returned unchanged. Fractional pixel values are kept
/// so the conversion can be inverted by [`to_percent_units`].
///
/// # Errors
///
/// - `InvalidDimensions` if the image has a zero dimension
/// - `NonFinite` if any coordinate is NaN or infinite
/// - `Degenerate` if the region would cover less than one pixel on an axis
pub fn to_pixel_units(
    region: &CropRegion,
    natural_width: u32,
    natural_height: u32,
) -> Result<CropRegion, GeometryError> {
    let (w, h) = natural_size(natural_width, natural_height)?;
    if !region.is_finite() {
        return Err(GeometryError::NonFinite);
    }

    let pixels = raw_pixels(region, w, h);
    if pixels.width < MIN_CROP_PIXELS || pixels.height < MIN_CROP_PIXELS {
        return Err(GeometryError::Degenerate {
            width: pixels.width,
            height: pixels.height,
        });
    }
    Ok(pixels)
}

/// Convert a region to percentage units of the natural image.
pub fn to_percent_units(
    region: &CropRegion,
    natural_width: u32,
    natural_height: u32,
) -> Result<CropRegion, GeometryError> {
    let (w, h) = natural_size(natural_width, natural_height)?;
    if !region.is_finite() {
        return Err(GeometryError::NonFinite);
    }
    match region.unit {
        CropUnit::Percent => Ok(*region),
        CropUnit::Pixel => Ok(with_unit(*region, CropUnit::Percent, w, h)),
    }
}

/// Normalize a region produced by an interactive drag.
///
/// The result keeps the unit of `region`, lies inside the image, has the
/// requested aspect ratio (when one is set) and respects `constraints` as
/// far as the bounds allow. The position is only shifted as much as needed
/// to bring the rectangle back inside the image.
pub fn constrain_crop(
    region: &CropRegion,
    natural_width: u32,
    natural_height: u32,
    aspect: Option<AspectRatio>,
    constraints: &CropConstraints,
) -> Result<CropRegion, GeometryError> {
    let (w, h) = natural_size(natural_width, natural_height)?;
    if !region.is_finite() {
        return Err(GeometryError::NonFinite);
    }

    let px = raw_pixels(region, w, h);
    let max_w = constraints.max_width.map_or(w, |m| m.min(w));
    let max_h = constraints.max_height.map_or(h, |m| m.min(h));

    let min_w = constraints.min_width.unwrap_or(0.0);
    let min_h = constraints.min_height.unwrap_or(0.0);

    let (cw, ch) = match aspect {
        Some(ratio) => {
            let r = ratio.value();
            // Width leads, so the height minimum is carried over as a width minimum
            let cw = px.width.max(min_w).max(min_h * r).min(max_w);
            let ch = cw / r;
            if ch > max_h {
                (max_h * r, max_h)
            } else {
                (cw, ch)
            }
        }
        None => (
            px.width.max(min_w).min(max_w),
            px.height.max(min_h).min(max_h),
        ),
    };

    if cw < MIN_CROP_PIXELS || ch < MIN_CROP_PIXELS {
        return Err(GeometryError::Degenerate {
            width: cw,
            height: ch,
        });
    }

    let x = px.x.clamp(0.0, w - cw);
    let y = px.y.clamp(0.0, h - ch);

    Ok(with_unit(CropRegion::pixel(x, y, cw, ch), region.unit, w, h))
}

/// A crop confirmed at the end of a gesture, in pixel units.
///
/// Construction validates the region once; everything downstream of the
/// interaction layer (preview rendering, export) takes a `CompletedCrop`
/// and can rely on it being inside the source and non-degenerate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletedCrop {
    region: CropRegion,
    natural_width: u32,
    natural_height: u32,
}

impl CompletedCrop {
    /// Validate `region` against the natural image size.
    ///
    /// # Errors
    ///
    /// Any error from [`to_pixel_units`], or `OutOfBounds` if the region
    /// extends past the image.
    pub fn new(
        region: &CropRegion,
        natural_width: u32,
        natural_height: u32,
    ) -> Result<Self, GeometryError> {
        let px = to_pixel_units(region, natural_width, natural_height)?;
        let (w, h) = (natural_width as f64, natural_height as f64);
        let slack_w = BOUNDS_EPSILON * w.max(1.0);
        let slack_h = BOUNDS_EPSILON * h.max(1.0);

        if px.x < -slack_w || px.y < -slack_h || px.right() > w + slack_w || px.bottom() > h + slack_h
        {
            return Err(GeometryError::OutOfBounds {
                x: px.x,
                y: px.y,
                width: px.width,
                height: px.height,
                bounds_width: natural_width,
                bounds_height: natural_height,
            });
        }

        // Snap away float noise at the edges
        let x = px.x.max(0.0);
        let y = px.y.max(0.0);
        let region = CropRegion::pixel(x, y, px.width.min(w - x), px.height.min(h - y));

        Ok(Self {
            region,
            natural_width,
            natural_height,
        })
    }

    pub fn x(&self) -> f64 {
        self.region.x
    }

    pub fn y(&self) -> f64 {
        self.region.y
    }

    pub fn width(&self) -> f64 {
        self.region.width
    }

    pub fn height(&self) -> f64 {
        self.region.height
    }

    /// The validated region in pixel units.
    pub fn region(&self) -> CropRegion {
        self.region
    }

    /// Natural size of the image this crop was validated against.
    pub fn natural_size(&self) -> (u32, u32) {
        (self.natural_width, self.natural_height)
    }

    /// The same region in percentage units.
    pub fn to_percent(&self) -> CropRegion {
        with_unit(
            self.region,
            CropUnit::Percent,
            self.natural_width as f64,
            self.natural_height as f64,
        )
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
