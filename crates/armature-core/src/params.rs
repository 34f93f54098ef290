//! Joint parameters and the per-cell specification table

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{GeometryError, GeometryResult};
use crate::units::LengthUnit;

/// What occupies a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JointType {
    /// A ball revolved into a socket between the plates
    #[default]
    Ball,
    /// A hexagonal nut with a bolt hole
    Nut,
    /// Nothing; the plates stay solid
    None,
}

impl JointType {
    /// All options in the order the host table lists them
    pub const ALL: [JointType; 3] = [JointType::Ball, JointType::Nut, JointType::None];

    /// Label shown in the joint table
    pub fn label(self) -> &'static str {
        match self {
            JointType::Ball => "Ball",
            JointType::Nut => "Nut",
            JointType::None => "None",
        }
    }
}

impl std::fmt::Display for JointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for JointType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JointType::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown joint type '{}'", s))
    }
}

/// Specification of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSpec {
    /// What the cell holds
    pub joint: JointType,
    /// Diameter of the screw hole drilled through a ball
    pub hole_diameter: f64,
}

impl CellSpec {
    /// A ball cell with the given screw hole
    pub fn ball(hole_diameter: f64) -> Self {
        Self {
            joint: JointType::Ball,
            hole_diameter,
        }
    }

    /// A nut cell
    pub fn nut(hole_diameter: f64) -> Self {
        Self {
            joint: JointType::Nut,
            hole_diameter,
        }
    }

    /// An empty cell
    pub fn empty(hole_diameter: f64) -> Self {
        Self {
            joint: JointType::None,
            hole_diameter,
        }
    }
}

/// Row-major table of cell specifications, addressed 1-indexed like the host table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellGrid {
    rows: Vec<Vec<CellSpec>>,
}

impl CellGrid {
    /// Create a grid filled with `fill`
    pub fn new(rows: u32, cols: u32, fill: CellSpec) -> Self {
        Self {
            rows: vec![vec![fill; cols as usize]; rows as usize],
        }
    }

    /// Number of rows
    pub fn rows(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Number of columns
    pub fn cols(&self) -> u32 {
        self.rows.first().map_or(0, |r| r.len() as u32)
    }

    /// Get a cell by 1-indexed row and column
    pub fn get(&self, row: u32, col: u32) -> Option<&CellSpec> {
        if row == 0 || col == 0 {
            return None;
        }
        self.rows
            .get(row as usize - 1)
            .and_then(|r| r.get(col as usize - 1))
    }

    /// Get a mutable cell by 1-indexed row and column
    pub fn get_mut(&mut self, row: u32, col: u32) -> Option<&mut CellSpec> {
        if row == 0 || col == 0 {
            return None;
        }
        self.rows
            .get_mut(row as usize - 1)
            .and_then(|r| r.get_mut(col as usize - 1))
    }

    /// Replace a cell
    pub fn set(&mut self, row: u32, col: u32, spec: CellSpec) -> GeometryResult<()> {
        let (rows, cols) = (self.rows(), self.cols());
        let cell = self.get_mut(row, col).ok_or(GeometryError::CellOutOfRange {
            row,
            col,
            rows,
            cols,
        })?;
        *cell = spec;
        Ok(())
    }

    /// Resize the grid, keeping cells that remain in range and filling new ones
    pub fn resize(&mut self, rows: u32, cols: u32, fill: CellSpec) {
        self.rows.resize_with(rows as usize, Vec::new);
        for row in &mut self.rows {
            row.resize(cols as usize, fill);
        }
    }

    /// Iterate over `(row, col, spec)` in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &CellSpec)> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(move |(c, spec)| (r as u32 + 1, c as u32 + 1, spec))
        })
    }
}

/// User-supplied dimensions of one armature joint
///
/// Every length uses the same unit; the model never converts on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointParameters {
    /// Name given to the generated component
    pub name: String,
    /// Plate length (along X)
    pub length: f64,
    /// Plate width (across the rows)
    pub width: f64,
    /// Plate slab thickness
    pub plate_thickness: f64,
    /// Diameter of the socket sphere
    pub ball_diameter: f64,
    /// Number of joint rows
    pub rows: u32,
    /// Number of joint columns
    pub cols: u32,
    /// Diameter of the bolt through the plates and nuts
    pub bolt_hole_diameter: f64,
    /// Whether the plates get a bolt hole at their centre
    #[serde(default)]
    pub center_bolt_hole: bool,
    /// Screw hole diameter used for cells missing from the table
    pub hole_diameter: f64,
    /// Per-cell specification
    #[serde(default)]
    pub cells: CellGrid,
}

impl Default for JointParameters {
    fn default() -> Self {
        Self::defaults(LengthUnit::Millimeter)
    }
}

impl JointParameters {
    /// Seed values offered the first time the command runs, expressed in `unit`
    pub fn defaults(unit: LengthUnit) -> Self {
        let mm = |v: f64| LengthUnit::Millimeter.convert(v, unit);
        let hole_diameter = mm(DEFAULT_HOLE_DIAMETER_MM);
        Self {
            name: DEFAULT_NAME.to_string(),
            length: mm(DEFAULT_LENGTH_MM),
            width: mm(DEFAULT_WIDTH_MM),
            plate_thickness: LengthUnit::Inch.convert(DEFAULT_THICKNESS_IN, unit),
            ball_diameter: mm(DEFAULT_BALL_DIAMETER_MM),
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            bolt_hole_diameter: mm(DEFAULT_BOLT_HOLE_DIAMETER_MM),
            center_bolt_hole: true,
            hole_diameter,
            cells: CellGrid::new(DEFAULT_ROWS, DEFAULT_COLS, CellSpec::ball(hole_diameter)),
        }
    }

    /// A single ball joint without nuts or bolt holes
    pub fn single_joint(length: f64, width: f64, plate_thickness: f64, ball_diameter: f64) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            length,
            width,
            plate_thickness,
            ball_diameter,
            rows: 1,
            cols: 1,
            bolt_hole_diameter: 0.0,
            center_bolt_hole: false,
            hole_diameter: 0.0,
            cells: CellGrid::new(1, 1, CellSpec::ball(0.0)),
        }
    }

    /// Change the grid size, resizing the cell table to match
    pub fn set_grid(&mut self, rows: u32, cols: u32) {
        self.rows = rows;
        self.cols = cols;
        self.cells
            .resize(rows, cols, CellSpec::ball(self.hole_diameter));
    }

    /// Builder form of [`JointParameters::set_grid`]
    pub fn with_grid(mut self, rows: u32, cols: u32) -> Self {
        self.set_grid(rows, cols);
        self
    }

    /// Specification of a cell; cells missing from the table are balls
    pub fn cell(&self, row: u32, col: u32) -> CellSpec {
        self.cells
            .get(row, col)
            .copied()
            .unwrap_or(CellSpec::ball(self.hole_diameter))
    }

    /// Joint type of a cell
    pub fn joint_type(&self, row: u32, col: u32) -> JointType {
        self.cell(row, col).joint
    }

    /// Set every cell to the same joint type
    pub fn fill(&mut self, joint: JointType) {
        let hole = self.hole_diameter;
        self.cells = CellGrid::new(
            self.rows,
            self.cols,
            CellSpec {
                joint,
                hole_diameter: hole,
            },
        );
    }

    /// Iterate over every `(row, col)` of the grid in row-major order
    pub fn positions(&self) -> impl Iterator<Item = (u32, u32)> + use<> {
        let cols = self.cols;
        (1..=self.rows).flat_map(move |row| (1..=cols).map(move |col| (row, col)))
    }

    /// Count the cells of a given joint type
    pub fn count(&self, joint: JointType) -> usize {
        self.positions()
            .filter(|&(row, col)| self.joint_type(row, col) == joint)
            .count()
    }

    /// Convert every length into another unit
    pub fn converted(&self, from: LengthUnit, to: LengthUnit) -> Self {
        let c = |v: f64| from.convert(v, to);
        let mut out = self.clone();
        out.length = c(self.length);
        out.width = c(self.width);
        out.plate_thickness = c(self.plate_thickness);
        out.ball_diameter = c(self.ball_diameter);
        out.bolt_hole_diameter = c(self.bolt_hole_diameter);
        out.hole_diameter = c(self.hole_diameter);
        for (row, col, spec) in self.cells.iter() {
            if let Some(cell) = out.cells.get_mut(row, col) {
                cell.hole_diameter = c(spec.hole_diameter);
            }
        }
        out
    }
}
