//! Pixel sampling with bilinear and Lanczos3 interpolation.
//!
//! Previews sample bilinearly from the 2x2 neighborhood; exports use a
//! 6x6 Lanczos3 window.
//!
//! Coordinates are in pixel-index space: `(0.0, 0.0)` is the center of the
//! top-left pixel. Edges are clamped, and anything more than half a pixel
//! outside the image is transparent.

use image::RgbaImage;

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// How source pixels are reconstructed between pixel centers.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationFilter {
    #[default]
    Bilinear,
    Lanczos3,
}

/// Sample `image` at a fractional position.
pub(crate) fn sample(image: &RgbaImage, x: f64, y: f64, filter: InterpolationFilter) -> [u8; 4] {
    let (w, h) = (image.width() as f64, image.height() as f64);
    if !(x >= -0.5 && y >= -0.5 && x <= w - 0.5 && y <= h - 0.5) {
        return TRANSPARENT;
    }

    match filter {
        InterpolationFilter::Bilinear => sample_bilinear(image, x, y),
        InterpolationFilter::Lanczos3 => sample_lanczos3(image, x, y),
    }
}

/// Get a pixel as [f64; 4], clamping coordinates to the image edge.
#[inline]
fn get_pixel_f64(image: &RgbaImage, px: i64, py: i64) -> [f64; 4] {
    let x = px.clamp(0, image.width() as i64 - 1) as u32;
    let y = py.clamp(0, image.height() as i64 - 1) as u32;
    let p = image.get_pixel(x, y).0;
    [p[0] as f64, p[1] as f64, p[2] as f64, p[3] as f64]
}

#[inline]
fn to_rgba(values: [f64; 4]) -> [u8; 4] {
    values.map(|v| v.clamp(0.0, 255.0).round() as u8)
}

#[inline]
fn lerp(a: [f64; 4], b: [f64; 4], t: f64) -> [f64; 4] {
    std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t)
}

/// Bilinear interpolation over the 4 nearest pixels.
fn sample_bilinear(image: &RgbaImage, x: f64, y: f64) -> [u8; 4] {
    let (left, top) = (x.floor(), y.floor());
    let (tx, ty) = (x - left, y - top);
    let (col, row) = (left as i64, top as i64);

    let upper = lerp(
        get_pixel_f64(image, col, row),
        get_pixel_f64(image, col + 1, row),
        tx,
    );
    let lower = lerp(
        get_pixel_f64(image, col, row + 1),
        get_pixel_f64(image, col + 1, row + 1),
        tx,
    );
    to_rgba(lerp(upper, lower, ty))
}

/// Lanczos3 interpolation over a 6x6 neighborhood.
///
/// The kernel is separable, so the six horizontal and six vertical weights
/// are computed once per sample.
fn sample_lanczos3(image: &RgbaImage, x: f64, y: f64) -> [u8; 4] {
    let (x0, y0) = (x.floor() as i64, y.floor() as i64);

    let mut wx = [0.0f64; 6];
    let mut wy = [0.0f64; 6];
    for k in 0..6 {
        let offset = k as i64 - 2;
        wx[k] = lanczos_weight(x - (x0 + offset) as f64, 3.0);
        wy[k] = lanczos_weight(y - (y0 + offset) as f64, 3.0);
    }

    let mut sum = [0.0f64; 4];
    let mut weight_sum = 0.0;
    for (ky, wy) in wy.iter().enumerate() {
        for (kx, wx) in wx.iter().enumerate() {
            let weight = wx * wy;
            if weight == 0.0 {
                continue;
            }
            let pixel = get_pixel_f64(image, x0 + kx as i64 - 2, y0 + ky as i64 - 2);
            for i in 0..4 {
                sum[i] += pixel[i] * weight;
            }
            weight_sum += weight;
        }
    }

    if weight_sum.abs() < f64::EPSILON {
        return sample_bilinear(image, x, y);
    }
    to_rgba(sum.map(|v| v / weight_sum))
}

/// Normalized sinc, `sin(pi x) / (pi x)`.
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        return 1.0;
    }
    let t = std::f64::consts::PI * x;
    t.sin() / t
}

/// Windowed sinc with support `[-a, a]`.
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() >= a {
        0.0
    } else {
        sinc(x) * sinc(x / a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([(x * 10) as u8, (y * 10) as u8, 50, 255]))
    }

    #[test]
    fn test_exact_pixel_centers() {
        let img = gradient(8, 8);
        for filter in [InterpolationFilter::Bilinear, InterpolationFilter::Lanczos3] {
            assert_eq!(sample(&img, 3.0, 5.0, filter), [30, 50, 50, 255]);
            assert_eq!(sample(&img, 7.0, 7.0, filter), [70, 70, 50, 255]);
        }
    }

    #[test]
    fn test_bilinear_midpoint() {
        let img = gradient(4, 4);
        assert_eq!(sample(&img, 1.5, 0.0, InterpolationFilter::Bilinear), [15, 0, 50, 255]);
    }

    #[test]
    fn test_outside_is_transparent() {
        let img = gradient(4, 4);
        assert_eq!(sample(&img, -0.6, 1.0, InterpolationFilter::Bilinear), TRANSPARENT);
        assert_eq!(sample(&img, 1.0, 3.6, InterpolationFilter::Lanczos3), TRANSPARENT);
        assert_eq!(sample(&img, f64::NAN, 1.0, InterpolationFilter::Bilinear), TRANSPARENT);
    }

    #[test]
    fn test_edges_are_clamped() {
        let img = gradient(4, 4);
        // Half a pixel past the last column still reads the last column
        assert_eq!(sample(&img, 3.5, 0.0, InterpolationFilter::Bilinear), [30, 0, 50, 255]);
    }

    #[test]
    fn test_lanczos_weight() {
        assert!((lanczos_weight(0.0, 3.0) - 1.0).abs() < 1e-10);
        assert_eq!(lanczos_weight(3.0, 3.0), 0.0);
        assert!(lanczos_weight(1.0, 3.0).abs() < 1e-10);
        assert!(lanczos_weight(0.5, 3.0) > 0.5);
    }
}
