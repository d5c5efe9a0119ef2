//! Strongly-typed primitives shared by the resolver and the scene graph.
//!
//! Positions and offsets are plain `glam::DVec2` in canvas pixels; what lives
//! here are the values that need validation or a unit attached to them.

use glam::DVec2;
use std::fmt;

/// Error type for invalid numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
    /// Value is zero when non-zero required
    Zero,
    /// Value is negative when positive required
    Negative,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
            NumericError::Zero => write!(f, "value is zero"),
            NumericError::Negative => write!(f, "value is negative"),
        }
    }
}

impl std::error::Error for NumericError {}

/// Reject NaN and infinities.
#[inline]
pub fn finite(val: f64) -> Result<f64, NumericError> {
    if val.is_nan() {
        Err(NumericError::NaN)
    } else if val.is_infinite() {
        Err(NumericError::Infinite)
    } else {
        Ok(val)
    }
}

/// Reject anything that is not a finite, strictly positive number.
#[inline]
pub fn positive(val: f64) -> Result<f64, NumericError> {
    let val = finite(val)?;
    if val == 0.0 {
        Err(NumericError::Zero)
    } else if val < 0.0 {
        Err(NumericError::Negative)
    } else {
        Ok(val)
    }
}

/// Angle in degrees
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
pub struct Angle(pub f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub fn from_radians(rad: f64) -> Self {
        Angle(rad.to_degrees())
    }

    #[inline]
    pub fn radians(self) -> f64 {
        self.0.to_radians()
    }

    /// Heading of the segment `from -> to`, measured like `atan2(dy, dx)`.
    pub fn of_segment(from: DVec2, to: DVec2) -> Self {
        let d = to - from;
        Angle::from_radians(d.y.atan2(d.x))
    }
}

impl std::ops::Add for Angle {
    type Output = Angle;
    fn add(self, rhs: Angle) -> Angle {
        Angle(self.0 + rhs.0)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 8-bit RGBA colour as handed to renderers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }

    /// Split a packed `0xRRGGBBAA` value into its four bytes.
    pub const fn from_packed(v: u32) -> Self {
        Rgba {
            r: (v >> 24) as u8,
            g: (v >> 16) as u8,
            b: (v >> 8) as u8,
            a: v as u8,
        }
    }

    pub const fn packed(self) -> u32 {
        (self.r as u32) << 24 | (self.g as u32) << 16 | (self.b as u32) << 8 | self.a as u32
    }

    /// Build a colour from components that are either ratios (`<= 1`) or
    /// 8-bit levels. Out-of-range values saturate.
    pub fn from_components(r: f64, g: f64, b: f64, a: f64) -> Self {
        Rgba {
            r: component(r),
            g: component(g),
            b: component(b),
            a: component(a),
        }
    }
}

fn component(v: f64) -> u8 {
    let v = if v <= 1.0 { v * 255.0 } else { v };
    v.round().clamp(0.0, 255.0) as u8
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

/// Axis-aligned bounding box in canvas pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    pub min: DVec2,
    pub max: DVec2,
}

impl Default for BBox {
    fn default() -> Self {
        Self::new()
    }
}

impl BBox {
    /// Create an empty bounding box (will expand on first point)
    pub fn new() -> Self {
        BBox {
            min: DVec2::splat(f64::MAX),
            max: DVec2::splat(f64::MIN),
        }
    }

    /// Check if the bbox is empty (never expanded)
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn expand_point(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }
}

impl FromIterator<DVec2> for BBox {
    fn from_iter<I: IntoIterator<Item = DVec2>>(iter: I) -> Self {
        let mut bb = BBox::new();
        for p in iter {
            bb.expand_point(p);
        }
        bb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    #[test]
    fn finite_rejects_nan_and_infinity() {
        assert_eq!(finite(f64::NAN), Err(NumericError::NaN));
        assert_eq!(finite(f64::NEG_INFINITY), Err(NumericError::Infinite));
        assert_eq!(finite(-3.5), Ok(-3.5));
    }

    #[test]
    fn positive_rejects_zero_and_negative() {
        assert_eq!(positive(0.0), Err(NumericError::Zero));
        assert_eq!(positive(-1.0), Err(NumericError::Negative));
        assert_eq!(positive(30.0), Ok(30.0));
    }

    #[test]
    fn packed_color_splits_into_bytes() {
        let c = Rgba::from_packed(0x1122_33ff);
        assert_eq!(c, Rgba::new(0x11, 0x22, 0x33, 0xff));
        assert_eq!(c.packed(), 0x1122_33ff);
    }

    #[test]
    fn ratio_components_scale_to_bytes() {
        assert_eq!(Rgba::from_components(1.0, 0.0, 0.5, 1.0), Rgba::new(255, 0, 128, 255));
        // levels above one are taken as-is
        assert_eq!(Rgba::from_components(51.0, 300.0, 2.0, 1.0), Rgba::new(51, 255, 2, 255));
    }

    #[test]
    fn segment_heading() {
        let a = Angle::of_segment(dvec2(0.0, 0.0), dvec2(0.0, 10.0));
        assert!((a.0 - 90.0).abs() < 1e-9);
    }

    #[test]
    fn bbox_collects_points() {
        let bb: BBox = [dvec2(1.0, 5.0), dvec2(-2.0, 3.0), dvec2(4.0, 4.0)].into_iter().collect();
        assert_eq!(bb.min, dvec2(-2.0, 3.0));
        assert_eq!(bb.max, dvec2(4.0, 5.0));
        assert_eq!(bb.size(), dvec2(6.0, 2.0));
        assert!(BBox::new().is_empty());
    }
}
