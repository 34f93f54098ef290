//! Spherical-cap socket sizing
//!
//! A ball of radius `r` cut by a plane at distance `offset` from its centre
//! leaves a circle of radius `sqrt(r² − offset²)` in that plane. The plates
//! receive that circle as their socket hole.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::constants::BALL_OFFSET_RATIO;

/// Radius of the circle a plane at `offset` cuts from a sphere of `sphere_radius`
///
/// Returns NaN when `offset > sphere_radius`.
pub fn circle_radius_of_sphere(sphere_radius: f64, offset: f64) -> f64 {
    (sphere_radius * sphere_radius - offset * offset).sqrt()
}

/// Sphere diameter whose cut at `offset` has the given circle radius
///
/// Inverse of [`circle_radius_of_sphere`] with `offset` held fixed.
pub fn diameter_for_circle_radius(circle_radius: f64, offset: f64) -> f64 {
    2.0 * (circle_radius * circle_radius + offset * offset).sqrt()
}

/// Socket cut depth for a ball diameter
pub fn ball_offset(ball_diameter: f64) -> f64 {
    ball_diameter * BALL_OFFSET_RATIO
}

/// Cross-section of a ball at the plate plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SocketGeometry {
    /// Distance from the ball centre to the cutting plane
    pub offset: f64,
    /// Radius of the socket circle
    pub radius: f64,
    /// Area of the socket circle
    pub area: f64,
    /// Circumference of the socket circle
    pub circumference: f64,
}

impl SocketGeometry {
    /// Derive the socket of a ball using the standard offset ratio
    pub fn derive(ball_diameter: f64) -> Option<Self> {
        Self::with_offset(ball_diameter, ball_offset(ball_diameter))
    }

    /// Derive the socket for an explicit offset
    ///
    /// `None` when the offset reaches past the ball or an input is not finite.
    pub fn with_offset(ball_diameter: f64, offset: f64) -> Option<Self> {
        if !ball_diameter.is_finite() || !offset.is_finite() || ball_diameter <= 0.0 {
            return None;
        }
        let radius = circle_radius_of_sphere(ball_diameter / 2.0, offset);
        if !radius.is_finite() {
            return None;
        }
        Some(Self {
            offset,
            radius,
            area: PI * radius * radius,
            circumference: 2.0 * PI * radius,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_circle_radius_matches_formula() {
        for (r, off) in [(2.5_f64, 0.0_f64), (2.5, 1.0), (1.0, 1.0), (10.0, 3.3)] {
            let expected = (r * r - off * off).sqrt();
            assert_eq!(circle_radius_of_sphere(r, off), expected);
        }
    }

    #[test]
    fn test_circle_radius_decreases_with_offset() {
        let r = 4.0;
        let mut last = f64::INFINITY;
        for i in 1..40 {
            let c = circle_radius_of_sphere(r, i as f64 * 0.1);
            assert!(c < last);
            last = c;
        }
    }

    #[test]
    fn test_offset_past_ball_is_undefined() {
        assert!(circle_radius_of_sphere(1.0, 1.5).is_nan());
        assert!(SocketGeometry::with_offset(2.0, 1.5).is_none());
    }

    #[test]
    fn test_diameter_inverts_circle_radius() {
        for off in [0.1, 0.5, 1.11, 4.0] {
            for c in [0.01, 0.3, 1.243, 7.5] {
                let d = diameter_for_circle_radius(c, off);
                assert_relative_eq!(
                    circle_radius_of_sphere(d / 2.0, off),
                    c,
                    max_relative = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_derive_socket() {
        let socket = SocketGeometry::derive(5.0).unwrap();
        assert_relative_eq!(socket.offset, 5.0 / 3.0);
        let r: f64 = 2.5;
        let c = (r * r - socket.offset * socket.offset).sqrt();
        assert_relative_eq!(socket.radius, c);
        assert_relative_eq!(socket.area, PI * c * c);
        assert_relative_eq!(socket.circumference, 2.0 * PI * c);
    }

    #[test]
    fn test_derive_rejects_bad_diameter() {
        assert!(SocketGeometry::derive(0.0).is_none());
        assert!(SocketGeometry::derive(-1.0).is_none());
        assert!(SocketGeometry::derive(f64::NAN).is_none());
    }
}
