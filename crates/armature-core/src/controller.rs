//! Input bounds and manipulator placement
//!
//! Each time the user edits a value, the bounds of the dependent inputs and
//! the positions of the on-canvas manipulators are recomputed from the
//! current parameters.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::params::JointParameters;

/// Position and drag direction of a manipulator handle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Manipulator {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl Manipulator {
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self { origin, direction }
    }
}

/// Bounds and manipulators pushed back to the input widgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputExtents {
    /// Lower bound of the length input
    pub length_min: f64,
    /// Lower bound of the width input
    pub width_min: f64,
    /// Upper bound of the ball diameter input
    pub ball_diameter_max: f64,
    pub length: Manipulator,
    pub width: Manipulator,
    pub plate_thickness: Manipulator,
    pub ball_diameter: Manipulator,
}

impl InputExtents {
    /// Compute the extents for the current parameters
    pub fn compute(params: &JointParameters) -> Self {
        let g = params.geometry();
        Self {
            length_min: g.min_length(),
            width_min: g.min_width(),
            ball_diameter_max: g.max_ball_diameter(),
            length: Manipulator::new(DVec3::ZERO, DVec3::X),
            width: Manipulator::new(DVec3::ZERO, DVec3::Z),
            plate_thickness: Manipulator::new(DVec3::ZERO, DVec3::Y),
            ball_diameter: Manipulator::new(
                DVec3::new(g.ball_x(1), g.ball_z(), -g.ball_y(1)),
                DVec3::Y,
            ),
        }
    }
}

/// A value changed by the controller rather than by the user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Adjustment {
    /// Width raised to the minimum the sockets need
    WidthRaised { from: f64, to: f64 },
}

/// Recompute the extents and clamp the width to its lower bound
///
/// The width widget refuses values under its minimum, so a width that has
/// fallen below it is raised to meet it.
pub fn apply(params: &mut JointParameters) -> (InputExtents, Option<Adjustment>) {
    let extents = InputExtents::compute(params);
    if params.width < extents.width_min {
        let from = params.width;
        params.width = extents.width_min;
        let extents = InputExtents::compute(params);
        return (
            extents,
            Some(Adjustment::WidthRaised {
                from,
                to: params.width,
            }),
        );
    }
    (extents, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_apply_raises_width() {
        let mut p = JointParameters::default();
        let (extents, adjustment) = apply(&mut p);

        assert_eq!(p.width, extents.width_min);
        match adjustment {
            Some(Adjustment::WidthRaised { from, to }) => {
                assert_eq!(from, 5.0);
                assert_relative_eq!(to, 7.55, epsilon = 1e-2);
            }
            other => panic!("unexpected adjustment {:?}", other),
        }
        assert!(p.geometry().is_valid());
    }

    #[test]
    fn test_apply_keeps_wide_plate() {
        let mut p = JointParameters::default();
        p.width = 12.0;
        let (_, adjustment) = apply(&mut p);
        assert!(adjustment.is_none());
        assert_eq!(p.width, 12.0);
    }

    #[test]
    fn test_ball_manipulator_position() {
        let mut p = JointParameters::default();
        p.width = 10.0;
        let extents = InputExtents::compute(&p);
        let g = p.geometry();
        assert_relative_eq!(extents.ball_diameter.origin.x, 2.5);
        assert_relative_eq!(extents.ball_diameter.origin.y, g.ball_z());
        assert_relative_eq!(extents.ball_diameter.origin.z, 2.5);
        assert_eq!(extents.ball_diameter.direction, DVec3::Y);
    }

    #[test]
    fn test_bounds_follow_parameters() {
        let mut p = JointParameters::default();
        p.width = 10.0;
        let before = InputExtents::compute(&p);
        p.set_grid(3, 2);
        let after = InputExtents::compute(&p);
        assert!(after.width_min > before.width_min);
        assert!(after.ball_diameter_max < before.ball_diameter_max);
        assert!(after.length_min >= before.length_min);
    }
}
