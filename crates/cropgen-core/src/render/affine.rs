//! 2D affine transforms with canvas semantics.
//!
//! The matrix layout matches `CanvasRenderingContext2D.setTransform(a, b, c, d, e, f)`:
//!
//! ```text
//! | a c e |
//! | b d f |
//! | 0 0 1 |
//! ```
//!
//! `translate`, `rotate` and `scale` post-multiply, so calls read in the
//! same order as canvas calls: the last call is applied to points first.

/// A 2D affine transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// `self × other`
    pub fn multiply(&self, other: &Affine) -> Affine {
        Affine {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn translate(&self, tx: f64, ty: f64) -> Affine {
        self.multiply(&Affine {
            e: tx,
            f: ty,
            ..Affine::IDENTITY
        })
    }

    pub fn scale(&self, sx: f64, sy: f64) -> Affine {
        self.multiply(&Affine {
            a: sx,
            d: sy,
            ..Affine::IDENTITY
        })
    }

    /// Rotate by `radians`; positive is clockwise in a y-down space.
    pub fn rotate(&self, radians: f64) -> Affine {
        let (sin, cos) = radians.sin_cos();
        self.multiply(&Affine {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        })
    }

    /// Map a point through the transform.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// The inverse transform, or `None` if the matrix is singular.
    pub fn invert(&self) -> Option<Affine> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < f64::EPSILON {
            return None;
        }
        Some(Affine {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn test_translate_then_scale_order() {
        // Canvas order: scale is applied to the point first, then translate
        let m = Affine::IDENTITY.translate(10.0, 5.0).scale(2.0, 3.0);
        assert!(close(m.apply(1.0, 1.0), (12.0, 8.0)));
    }

    #[test]
    fn test_rotate_quarter_turn_is_clockwise() {
        let m = Affine::IDENTITY.rotate(std::f64::consts::FRAC_PI_2);
        // +x axis maps onto +y (down) in screen space
        assert!(close(m.apply(1.0, 0.0), (0.0, 1.0)));
    }

    #[test]
    fn test_rotate_about_point() {
        let m = Affine::IDENTITY
            .translate(5.0, 5.0)
            .rotate(std::f64::consts::PI)
            .translate(-5.0, -5.0);
        assert!(close(m.apply(0.0, 0.0), (10.0, 10.0)));
        assert!(close(m.apply(5.0, 5.0), (5.0, 5.0)));
    }

    #[test]
    fn test_invert_round_trip() {
        let m = Affine::IDENTITY
            .scale(2.0, 0.5)
            .translate(-30.0, 12.0)
            .rotate(0.7)
            .scale(1.3, 1.3);
        let inv = m.invert().unwrap();
        let p = (17.0, -4.0);
        let (x, y) = m.apply(p.0, p.1);
        assert!(close(inv.apply(x, y), p));
    }

    #[test]
    fn test_singular_has_no_inverse() {
        let m = Affine::IDENTITY.scale(0.0, 1.0);
        assert!(m.invert().is_none());
    }
}
