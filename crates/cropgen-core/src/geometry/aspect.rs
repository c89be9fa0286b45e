//! Aspect ratio as a positive rational.

use std::fmt;
use std::str::FromStr;

use super::GeometryError;

/// A fixed width:height ratio for crop selection.
///
/// `None` in an `Option<AspectRatio>` means free-form cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    width: u32,
    height: u32,
}

impl AspectRatio {
    /// 1:1, the default for new sessions.
    pub const SQUARE: AspectRatio = AspectRatio {
        width: 1,
        height: 1,
    };

    /// Create a ratio from its two terms. Both must be non-zero.
    pub fn new(width: u32, height: u32) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::InvalidAspectRatio(format!("{width}:{height}")));
        }
        Ok(Self { width, height })
    }

    pub fn width(self) -> u32 {
        self.width
    }

    pub fn height(self) -> u32 {
        self.height
    }

    /// The ratio as width / height.
    #[inline]
    pub fn value(self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = GeometryError;

    /// Parse `"W:H"` or `"W/H"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GeometryError::InvalidAspectRatio(s.to_string());
        let (w, h) = s
            .trim()
            .split_once([':', '/'])
            .ok_or_else(invalid)?;
        let w = w.trim().parse::<u32>().map_err(|_| invalid())?;
        let h = h.trim().parse::<u32>().map_err(|_| invalid())?;
        Self::new(w, h).map_err(|_| invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_value() {
        assert_eq!(AspectRatio::SQUARE.value(), 1.0);
    }

    #[test]
    fn test_parse_colon_and_slash() {
        assert_eq!("16:9".parse::<AspectRatio>().unwrap(), AspectRatio::new(16, 9).unwrap());
        assert_eq!(" 4 / 3 ".parse::<AspectRatio>().unwrap(), AspectRatio::new(4, 3).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("16x9".parse::<AspectRatio>().is_err());
        assert!("0:1".parse::<AspectRatio>().is_err());
        assert!("a:b".parse::<AspectRatio>().is_err());
        assert!("".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        let r = AspectRatio::new(3, 2).unwrap();
        assert_eq!(r.to_string(), "3:2");
        assert_eq!(r.to_string().parse::<AspectRatio>().unwrap(), r);
    }
}
