//! Command input identifiers and the input surface
//!
//! Parameters are re-read from the input widgets on every change. The widgets
//! are reached through [`InputSource`]; [`InputMap`] is a plain map-backed
//! source used by sessions and tests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, GeometryResult};
use crate::params::{CellSpec, JointParameters, JointType};

pub const NAME_INPUT_ID: &str = "armatureJointNameInputID";
pub const LENGTH_INPUT_ID: &str = "armatureJointLengthInputID";
pub const WIDTH_INPUT_ID: &str = "armatureJointWidthInputID";
pub const PLATE_THICKNESS_INPUT_ID: &str = "armatureJointPlateThicknesshInputID";
pub const BALL_DIAMETER_INPUT_ID: &str = "armatureJointBallDiameterInputID";
pub const BOLT_HOLE_DIAMETER_INPUT_ID: &str = "armatureJointBoltHoleDiameterInputID";
pub const CENTER_BOLT_HOLE_INPUT_ID: &str = "armatureJointCenterBoltHoleInputID";
pub const ROWS_INPUT_ID: &str = "armatureJointRowsInputID";
pub const COLS_INPUT_ID: &str = "armatureJointColsInputID";
pub const TABLE_INPUT_ID: &str = "armatureJointTableInputID";

/// Id of the joint type dropdown of a table cell
pub fn cell_type_input_id(row: u32, col: u32) -> String {
    format!("{}_{}_{}_type", TABLE_INPUT_ID, row, col)
}

/// Id of the screw hole input of a table cell
pub fn cell_hole_input_id(row: u32, col: u32) -> String {
    format!("{}_{}_{}_hole", TABLE_INPUT_ID, row, col)
}

/// Read access to the command's input widgets
pub trait InputSource {
    /// Value of a distance input, in internal units
    fn real(&self, id: &str) -> Option<f64>;

    /// Value of an integer spinner
    fn integer(&self, id: &str) -> Option<i64>;

    /// Value of a text input or the selected item of a dropdown
    fn text(&self, id: &str) -> Option<String>;

    /// Value of a checkbox
    fn boolean(&self, id: &str) -> Option<bool>;
}

/// A single widget value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputValue {
    Real(f64),
    Integer(i64),
    Text(String),
    Bool(bool),
}

/// Map-backed [`InputSource`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputMap {
    values: BTreeMap<String, InputValue>,
}

impl InputMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: impl Into<String>, value: InputValue) {
        self.values.insert(id.into(), value);
    }

    pub fn get(&self, id: &str) -> Option<&InputValue> {
        self.values.get(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<InputValue> {
        self.values.remove(id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Populate every widget from a set of parameters
    pub fn from_parameters(params: &JointParameters) -> Self {
        let mut map = Self::new();
        map.set(NAME_INPUT_ID, InputValue::Text(params.name.clone()));
        map.set(LENGTH_INPUT_ID, InputValue::Real(params.length));
        map.set(WIDTH_INPUT_ID, InputValue::Real(params.width));
        map.set(PLATE_THICKNESS_INPUT_ID, InputValue::Real(params.plate_thickness));
        map.set(BALL_DIAMETER_INPUT_ID, InputValue::Real(params.ball_diameter));
        map.set(
            BOLT_HOLE_DIAMETER_INPUT_ID,
            InputValue::Real(params.bolt_hole_diameter),
        );
        map.set(
            CENTER_BOLT_HOLE_INPUT_ID,
            InputValue::Bool(params.center_bolt_hole),
        );
        map.set(ROWS_INPUT_ID, InputValue::Integer(params.rows as i64));
        map.set(COLS_INPUT_ID, InputValue::Integer(params.cols as i64));
        for (row, col) in params.positions() {
            let cell = params.cell(row, col);
            map.set(
                cell_type_input_id(row, col),
                InputValue::Text(cell.joint.label().to_string()),
            );
            map.set(
                cell_hole_input_id(row, col),
                InputValue::Real(cell.hole_diameter),
            );
        }
        map
    }
}

impl InputSource for InputMap {
    fn real(&self, id: &str) -> Option<f64> {
        match self.values.get(id)? {
            InputValue::Real(v) => Some(*v),
            InputValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    fn integer(&self, id: &str) -> Option<i64> {
        match self.values.get(id)? {
            InputValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    fn text(&self, id: &str) -> Option<String> {
        match self.values.get(id)? {
            InputValue::Text(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn boolean(&self, id: &str) -> Option<bool> {
        match self.values.get(id)? {
            InputValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

fn required_real(source: &impl InputSource, id: &str) -> GeometryResult<f64> {
    source
        .real(id)
        .ok_or_else(|| GeometryError::MissingInput(id.to_string()))
}

fn required_count(source: &impl InputSource, id: &str) -> GeometryResult<i64> {
    source
        .integer(id)
        .ok_or_else(|| GeometryError::MissingInput(id.to_string()))
}

impl JointParameters {
    /// Re-read the parameters from the input widgets
    ///
    /// Dimension and grid inputs are required. The name, bolt hole inputs and
    /// table cells fall back to `fallback` when their widget is absent; a
    /// table cell without a widget is a ball.
    pub fn read(source: &impl InputSource, fallback: &JointParameters) -> GeometryResult<Self> {
        let length = required_real(source, LENGTH_INPUT_ID)?;
        let width = required_real(source, WIDTH_INPUT_ID)?;
        let plate_thickness = required_real(source, PLATE_THICKNESS_INPUT_ID)?;
        let ball_diameter = required_real(source, BALL_DIAMETER_INPUT_ID)?;

        let rows = required_count(source, ROWS_INPUT_ID)?;
        let rows = u32::try_from(rows).map_err(|_| GeometryError::RowsOutOfRange {
            value: 0,
            min: crate::constants::MIN_ROWS,
            max: crate::constants::MAX_ROWS,
        })?;
        let cols = required_count(source, COLS_INPUT_ID)?;
        let cols = u32::try_from(cols).map_err(|_| GeometryError::ColsOutOfRange {
            value: 0,
            min: crate::constants::MIN_COLS,
            max: crate::constants::MAX_COLS,
        })?;

        let mut params = Self {
            name: source
                .text(NAME_INPUT_ID)
                .unwrap_or_else(|| fallback.name.clone()),
            length,
            width,
            plate_thickness,
            ball_diameter,
            rows: fallback.rows,
            cols: fallback.cols,
            bolt_hole_diameter: source
                .real(BOLT_HOLE_DIAMETER_INPUT_ID)
                .unwrap_or(fallback.bolt_hole_diameter),
            center_bolt_hole: source
                .boolean(CENTER_BOLT_HOLE_INPUT_ID)
                .unwrap_or(fallback.center_bolt_hole),
            hole_diameter: fallback.hole_diameter,
            cells: fallback.cells.clone(),
        };
        params.set_grid(rows, cols);

        for (row, col) in params.positions() {
            let current = params.cell(row, col);
            let joint = match source.text(&cell_type_input_id(row, col)) {
                Some(label) => label.parse::<JointType>().unwrap_or(JointType::Ball),
                None => current.joint,
            };
            let hole_diameter = source
                .real(&cell_hole_input_id(row, col))
                .unwrap_or(current.hole_diameter);
            params.cells.set(
                row,
                col,
                CellSpec {
                    joint,
                    hole_diameter,
                },
            )?;
        }

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_round_trips_widgets() {
        let mut p = JointParameters::default().with_grid(2, 2);
        p.width = 9.0;
        p.cells.set(2, 2, CellSpec::nut(2.0)).unwrap();
        let map = InputMap::from_parameters(&p);

        let read = JointParameters::read(&map, &JointParameters::default()).unwrap();
        assert_eq!(read, p);
    }

    #[test]
    fn test_missing_dimension_is_reported() {
        let mut map = InputMap::from_parameters(&JointParameters::default());
        map.remove(BALL_DIAMETER_INPUT_ID);
        let err = JointParameters::read(&map, &JointParameters::default()).unwrap_err();
        assert_eq!(
            err,
            GeometryError::MissingInput(BALL_DIAMETER_INPUT_ID.to_string())
        );
    }

    #[test]
    fn test_optional_inputs_fall_back() {
        let defaults = JointParameters::default();
        let mut map = InputMap::from_parameters(&defaults);
        map.remove(NAME_INPUT_ID);
        map.remove(BOLT_HOLE_DIAMETER_INPUT_ID);
        map.remove(&cell_type_input_id(1, 1));

        let read = JointParameters::read(&map, &defaults).unwrap();
        assert_eq!(read.name, "Joint");
        assert_eq!(read.bolt_hole_diameter, defaults.bolt_hole_diameter);
        assert_eq!(read.joint_type(1, 1), JointType::Ball);
    }

    #[test]
    fn test_growing_grid_adds_ball_cells() {
        let defaults = JointParameters::default();
        let mut map = InputMap::from_parameters(&defaults);
        map.set(ROWS_INPUT_ID, InputValue::Integer(4));

        let read = JointParameters::read(&map, &defaults).unwrap();
        assert_eq!(read.cells.rows(), 4);
        assert_eq!(read.joint_type(4, 1), JointType::Ball);
        assert_eq!(read.cell(4, 1).hole_diameter, defaults.hole_diameter);
    }

    #[test]
    fn test_negative_rows_rejected() {
        let mut map = InputMap::from_parameters(&JointParameters::default());
        map.set(ROWS_INPUT_ID, InputValue::Integer(-1));
        assert!(matches!(
            JointParameters::read(&map, &JointParameters::default()),
            Err(GeometryError::RowsOutOfRange { .. })
        ));
    }
}
