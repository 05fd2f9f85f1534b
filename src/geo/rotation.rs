//! Planar rotation of local coordinates and headings.
//!
//! Angles are given in degrees, counter-clockwise positive, about the
//! frame origin. Headings are rotated by plain addition and are not wrapped;
//! use [`normalize_heading`] when a consumer needs `[0, 2π)`.

use std::f64::consts::TAU;

use super::{Heading, LocalPoint};

/// A rotation with its sine and cosine computed once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    degrees: f64,
    radians: f64,
    sin: f64,
    cos: f64,
}

impl Rotation {
    pub fn from_degrees(degrees: f64) -> Self {
        let radians = degrees.to_radians();
        let (sin, cos) = radians.sin_cos();
        Self {
            degrees,
            radians,
            sin,
            cos,
        }
    }

    pub fn identity() -> Self {
        Self::from_degrees(0.0)
    }

    pub fn degrees(&self) -> f64 {
        self.degrees
    }

    pub fn radians(&self) -> f64 {
        self.radians
    }

    pub fn is_identity(&self) -> bool {
        self.degrees == 0.0
    }

    /// `x' = x cos θ - y sin θ`, `y' = x sin θ + y cos θ`.
    #[inline]
    pub fn rotate_point(&self, point: LocalPoint) -> LocalPoint {
        LocalPoint::new(
            point.x * self.cos - point.y * self.sin,
            point.x * self.sin + point.y * self.cos,
        )
    }

    #[inline]
    pub fn rotate_heading(&self, heading: Heading) -> Heading {
        Heading(heading.0 + self.radians)
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::identity()
    }
}

/// Rotate a local point by `angle_deg` degrees counter-clockwise.
pub fn rotate_point(point: LocalPoint, angle_deg: f64) -> LocalPoint {
    Rotation::from_degrees(angle_deg).rotate_point(point)
}

/// Add `angle_deg` (converted to radians) to a heading.
pub fn rotate_heading(heading: Heading, angle_deg: f64) -> Heading {
    Heading(heading.0 + angle_deg.to_radians())
}

/// Wrap a heading into `[0, 2π)`.
pub fn normalize_heading(heading: Heading) -> Heading {
    let wrapped = heading.0.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    Heading(if wrapped >= TAU { 0.0 } else { wrapped })
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use super::*;

    const TOL: f64 = 1e-9;

    fn assert_close(a: LocalPoint, b: LocalPoint) {
        assert!(
            (a.x - b.x).abs() < TOL && (a.y - b.y).abs() < TOL,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn quarter_turn_maps_x_axis_to_y_axis() {
        assert_close(
            rotate_point(LocalPoint::new(10.0, 0.0), 90.0),
            LocalPoint::new(0.0, 10.0),
        );
        assert_close(
            rotate_point(LocalPoint::new(0.0, 10.0), 90.0),
            LocalPoint::new(-10.0, 0.0),
        );
    }

    #[test]
    fn half_turn_negates() {
        assert_close(
            rotate_point(LocalPoint::new(3.0, -4.0), 180.0),
            LocalPoint::new(-3.0, 4.0),
        );
    }

    #[test]
    fn zero_rotation_is_exact() {
        let p = LocalPoint::new(123.456, -7.89);
        assert_eq!(rotate_point(p, 0.0), p);
        assert_eq!(rotate_heading(Heading(1.25), 0.0), Heading(1.25));
        assert!(Rotation::identity().is_identity());
    }

    #[test]
    fn heading_rotation_is_unwrapped() {
        let rotated = rotate_heading(Heading(PI * 1.5), 180.0);
        assert!((rotated.0 - PI * 2.5).abs() < TOL);

        let rotated = rotate_heading(Heading(0.0), 90.0);
        assert!((rotated.0 - FRAC_PI_2).abs() < TOL);
    }

    #[test]
    fn normalize_wraps_into_range() {
        assert!((normalize_heading(Heading(PI * 2.5)).0 - FRAC_PI_2).abs() < TOL);
        assert!((normalize_heading(Heading(-FRAC_PI_2)).0 - PI * 1.5).abs() < TOL);
        assert_eq!(normalize_heading(Heading(0.0)).0, 0.0);
        assert_eq!(normalize_heading(Heading(TAU)).0, 0.0);
        let tiny = normalize_heading(Heading(-1e-18)).0;
        assert!((0.0..TAU).contains(&tiny));
    }

    #[test]
    fn rotation_struct_matches_free_functions() {
        let rotation = Rotation::from_degrees(37.5);
        let p = LocalPoint::new(-12.0, 8.5);
        assert_eq!(rotation.rotate_point(p), rotate_point(p, 37.5));
        assert_eq!(
            rotation.rotate_heading(Heading(0.3)),
            rotate_heading(Heading(0.3), 37.5)
        );
    }
}
