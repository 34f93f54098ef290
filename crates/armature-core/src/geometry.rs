//! Derived joint geometry
//!
//! [`JointGeometry`] is a read-only view over [`JointParameters`]. Every
//! accessor recomputes its value from the current parameters; nothing is
//! cached.
//!
//! Coordinates follow the plate sketch: X runs along the plate length from 0
//! to `length`, Y runs across the width from 0 down to `-width`, and Z is the
//! elevation above the bottom plate's sketch plane.

use std::f64::consts::PI;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{GeometryError, GeometryResult};
use crate::params::{JointParameters, JointType};
use crate::socket::{self, SocketGeometry};

/// Derived quantities of a joint, borrowed from its parameters
#[derive(Debug, Clone, Copy)]
pub struct JointGeometry<'a> {
    params: &'a JointParameters,
}

impl JointParameters {
    /// View the derived geometry of these parameters
    pub fn geometry(&self) -> JointGeometry<'_> {
        JointGeometry { params: self }
    }
}

impl<'a> JointGeometry<'a> {
    pub fn new(params: &'a JointParameters) -> Self {
        Self { params }
    }

    /// The parameters this view derives from
    pub fn params(&self) -> &'a JointParameters {
        self.params
    }

    // ========== Socket ==========

    pub fn ball_radius(&self) -> f64 {
        self.params.ball_diameter / 2.0
    }

    /// How far the plate plane sits from the ball centre
    pub fn ball_offset(&self) -> f64 {
        socket::ball_offset(self.params.ball_diameter)
    }

    /// Socket cross-section, `None` when it is undefined
    pub fn socket(&self) -> Option<SocketGeometry> {
        SocketGeometry::derive(self.params.ball_diameter)
    }

    /// Radius of the socket circle (NaN when undefined)
    pub fn circle_radius(&self) -> f64 {
        socket::circle_radius_of_sphere(self.ball_radius(), self.ball_offset())
    }

    pub fn circle_area(&self) -> f64 {
        let c = self.circle_radius();
        PI * c * c
    }

    pub fn circle_circumference(&self) -> f64 {
        2.0 * PI * self.circle_radius()
    }

    // ========== Placement ==========

    /// Height of one row band
    pub fn band(&self) -> f64 {
        self.params.width / self.params.rows as f64
    }

    /// X of the joint centre in column `col` (1-indexed)
    ///
    /// Column 1 sits one ball radius in from the origin end, the last column
    /// one ball radius in from the far end.
    pub fn ball_x(&self, col: u32) -> f64 {
        if col <= 1 {
            self.ball_radius()
        } else {
            self.params.length - self.ball_radius()
        }
    }

    /// Y of the joint centre in row `row` (1-indexed)
    pub fn ball_y(&self, row: u32) -> f64 {
        let band = self.band();
        -((band * row as f64) - band / 2.0)
    }

    /// Elevation of the ball centres above the bottom plate's sketch plane
    pub fn ball_z(&self) -> f64 {
        self.params.plate_thickness + self.ball_radius() - self.ball_offset() / 2.0
    }

    pub fn cell_center(&self, row: u32, col: u32) -> DVec2 {
        DVec2::new(self.ball_x(col), self.ball_y(row))
    }

    // ========== Bounds ==========

    /// Smallest width that keeps the socket circles of adjacent rows apart
    pub fn min_width(&self) -> f64 {
        (2.0 * self.circle_radius() + MARGIN) * self.params.rows as f64
    }

    /// Largest ball diameter whose socket circles still fit in one row band
    ///
    /// Exact inverse of [`JointGeometry::min_width`] with the offset scaling
    /// with the diameter.
    pub fn max_ball_diameter(&self) -> f64 {
        let circle = (self.band() - MARGIN) / 2.0;
        if circle.is_nan() || circle <= 0.0 {
            return 0.0;
        }
        circle / (0.25 - BALL_OFFSET_RATIO * BALL_OFFSET_RATIO).sqrt()
    }

    /// Shortest plate that keeps every column's socket on the plate
    pub fn min_length(&self) -> f64 {
        let r = self.ball_radius();
        let c = self.circle_radius();
        let columns = if self.params.cols >= 2 {
            2.0 * r + 2.0 * c + MARGIN
        } else {
            r + c + MARGIN
        };
        self.min_width().max(columns)
    }

    // ========== Rim and top plate ==========

    pub fn chamfer_length(&self) -> f64 {
        self.ball_radius() * CHAMFER_RATIO
    }

    pub fn chamfer_angle(&self) -> f64 {
        CHAMFER_ANGLE
    }

    /// Offset of the top plate plane above the ball plane
    pub fn plate_offset(&self) -> f64 {
        self.ball_offset() - self.chamfer_length() / TOP_PLATE_CHAMFER_DIVISOR
    }

    /// Elevation of the top plate's sketch plane
    pub fn top_plate_z(&self) -> f64 {
        self.ball_z() + self.plate_offset()
    }

    // ========== Holes ==========

    pub fn bolt_hole_radius(&self) -> f64 {
        self.params.bolt_hole_diameter / 2.0
    }

    pub fn bolt_circle_area(&self) -> f64 {
        let r = self.bolt_hole_radius();
        PI * r * r
    }

    /// Radius of the screw hole through the ball in a cell
    pub fn hole_radius(&self, row: u32, col: u32) -> f64 {
        self.params.cell(row, col).hole_diameter / 2.0
    }

    /// Position of the plate's centre bolt hole
    pub fn center_bolt_position(&self) -> DVec2 {
        DVec2::new(self.params.length / 2.0, -self.params.width / 2.0)
    }

    /// Number of cells holding a ball
    pub fn ball_count(&self) -> usize {
        self.params.count(JointType::Ball)
    }

    /// Area of the plate profile: footprint minus every hole cut into it
    pub fn expected_area(&self) -> f64 {
        let mut area =
            self.params.length * self.params.width - self.ball_count() as f64 * self.circle_area();
        if self.params.center_bolt_hole {
            area -= self.bolt_circle_area();
        }
        area
    }

    // ========== Nuts ==========

    /// Half the length of one hexagon side
    pub fn nut_half_side(&self) -> f64 {
        self.ball_offset() * HEX_HALF_ANGLE.tan()
    }

    /// Distance between opposite hexagon flats
    pub fn nut_flat_to_flat(&self) -> f64 {
        2.0 * self.ball_offset()
    }

    /// Area enclosed by a nut hexagon
    pub fn nut_hexagon_area(&self) -> f64 {
        6.0 * self.nut_half_side() * self.ball_offset()
    }

    /// Area of a nut profile: the hexagon around its bolt hole
    pub fn nut_profile_area(&self) -> f64 {
        self.nut_hexagon_area() - self.bolt_circle_area()
    }

    /// Distance the nut extends on each side of its sketch plane
    pub fn nut_extent(&self) -> f64 {
        self.ball_radius() / 2.0
    }

    /// Centre of a nut in its column's sketch plane
    pub fn nut_center(&self, row: u32) -> DVec2 {
        DVec2::new(self.ball_y(row), self.ball_z())
    }

    /// Hexagon corners of a nut, walking from the upper left flat corner
    pub fn nut_hexagon(&self, row: u32) -> [DVec2; 6] {
        let center = self.nut_center(row);
        let apothem = self.ball_offset();
        let half = self.nut_half_side();
        [
            center + DVec2::new(-half, apothem),
            center + DVec2::new(half, apothem),
            center + DVec2::new(2.0 * half, 0.0),
            center + DVec2::new(half, -apothem),
            center + DVec2::new(-half, -apothem),
            center + DVec2::new(-2.0 * half, 0.0),
        ]
    }

    // ========== Validity ==========

    /// Check the parameters, reporting the first violated rule
    pub fn validate(&self) -> GeometryResult<()> {
        let p = self.params;
        for (field, value) in [
            ("length", p.length),
            ("width", p.width),
            ("plate_thickness", p.plate_thickness),
            ("ball_diameter", p.ball_diameter),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(GeometryError::NonPositive { field, value });
            }
        }

        if !(MIN_ROWS..=MAX_ROWS).contains(&p.rows) {
            return Err(GeometryError::RowsOutOfRange {
                value: p.rows,
                min: MIN_ROWS,
                max: MAX_ROWS,
            });
        }
        if !(MIN_COLS..=MAX_COLS).contains(&p.cols) {
            return Err(GeometryError::ColsOutOfRange {
                value: p.cols,
                min: MIN_COLS,
                max: MAX_COLS,
            });
        }

        let Some(socket) = self.socket() else {
            return Err(GeometryError::UndefinedSocket {
                ball_diameter: p.ball_diameter,
                offset: self.ball_offset(),
            });
        };

        let min_width = self.min_width();
        if p.width < min_width {
            return Err(GeometryError::WidthBelowMinimum {
                width: p.width,
                min_width,
            });
        }

        let max_ball_diameter = self.max_ball_diameter();
        if p.ball_diameter > max_ball_diameter * (1.0 + DIAMETER_EPSILON) {
            return Err(GeometryError::BallDiameterAboveMaximum {
                ball_diameter: p.ball_diameter,
                max_ball_diameter,
            });
        }

        let min_length = self.min_length();
        if p.length < min_length {
            return Err(GeometryError::LengthBelowMinimum {
                length: p.length,
                min_length,
            });
        }

        let mut has_nut = false;
        for (row, col) in p.positions() {
            let cell = p.cell(row, col);
            match cell.joint {
                JointType::Ball => {
                    if !(cell.hole_diameter.is_finite() && cell.hole_diameter >= 0.0) {
                        return Err(GeometryError::NonPositive {
                            field: "hole_diameter",
                            value: cell.hole_diameter,
                        });
                    }
                    if cell.hole_diameter >= p.ball_diameter {
                        return Err(GeometryError::HoleTooLarge {
                            row,
                            col,
                            hole_diameter: cell.hole_diameter,
                            ball_diameter: p.ball_diameter,
                        });
                    }
                }
                JointType::Nut => has_nut = true,
                JointType::None => {}
            }
        }

        if has_nut || p.center_bolt_hole {
            let value = p.bolt_hole_diameter;
            if !(value.is_finite() && value > 0.0) {
                return Err(GeometryError::NonPositive {
                    field: "bolt_hole_diameter",
                    value,
                });
            }
        }

        if has_nut {
            let flat_to_flat = self.nut_flat_to_flat();
            if p.bolt_hole_diameter >= flat_to_flat {
                return Err(GeometryError::BoltHoleTooLargeForNut {
                    bolt_hole_diameter: p.bolt_hole_diameter,
                    flat_to_flat,
                });
            }
        }

        if p.center_bolt_hole {
            let limit = p.length.min(p.width);
            if p.bolt_hole_diameter >= limit {
                return Err(GeometryError::BoltHoleOutsidePlate {
                    bolt_hole_diameter: p.bolt_hole_diameter,
                    length: p.length,
                    width: p.width,
                });
            }

            let bolt = self.center_bolt_position();
            let clearance = socket.radius + self.bolt_hole_radius();
            for (row, col) in p.positions() {
                if p.joint_type(row, col) == JointType::Ball
                    && bolt.distance(self.cell_center(row, col)) < clearance
                {
                    return Err(GeometryError::BoltHoleOverlapsSocket { row, col });
                }
            }
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Snapshot every derived quantity
    pub fn derived(&self) -> DerivedGeometry {
        let p = self.params;
        let cells = p
            .positions()
            .map(|(row, col)| CellGeometry {
                row,
                col,
                joint: p.joint_type(row, col),
                center: self.cell_center(row, col),
                hole_radius: self.hole_radius(row, col),
            })
            .collect();

        DerivedGeometry {
            ball_radius: self.ball_radius(),
            ball_offset: self.ball_offset(),
            circle_radius: self.circle_radius(),
            circle_area: self.circle_area(),
            circle_circumference: self.circle_circumference(),
            ball_z: self.ball_z(),
            min_width: self.min_width(),
            min_length: self.min_length(),
            max_ball_diameter: self.max_ball_diameter(),
            chamfer_length: self.chamfer_length(),
            chamfer_angle: self.chamfer_angle(),
            plate_offset: self.plate_offset(),
            top_plate_z: self.top_plate_z(),
            bolt_hole_radius: self.bolt_hole_radius(),
            expected_area: self.expected_area(),
            valid: self.is_valid(),
            cells,
        }
    }
}

/// Placement of one grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellGeometry {
    pub row: u32,
    pub col: u32,
    pub joint: JointType,
    pub center: DVec2,
    pub hole_radius: f64,
}

/// Owned snapshot of [`JointGeometry`], for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedGeometry {
    pub ball_radius: f64,
    pub ball_offset: f64,
    pub circle_radius: f64,
    pub circle_area: f64,
    pub circle_circumference: f64,
    pub ball_z: f64,
    pub min_width: f64,
    pub min_length: f64,
    pub max_ball_diameter: f64,
    pub chamfer_length: f64,
    pub chamfer_angle: f64,
    pub plate_offset: f64,
    pub top_plate_z: f64,
    pub bolt_hole_radius: f64,
    pub expected_area: f64,
    pub valid: bool,
    pub cells: Vec<CellGeometry>,
}
