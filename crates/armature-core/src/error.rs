//! Validity failures of a joint configuration

use thiserror::Error;

/// Reasons a set of joint parameters cannot be turned into geometry
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("{field} must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("Rows must be within {min}..={max}, got {value}")]
    RowsOutOfRange { value: u32, min: u32, max: u32 },

    #[error("Columns must be within {min}..={max}, got {value}")]
    ColsOutOfRange { value: u32, min: u32, max: u32 },

    #[error("Cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    CellOutOfRange {
        row: u32,
        col: u32,
        rows: u32,
        cols: u32,
    },

    #[error("Socket geometry is undefined for ball diameter {ball_diameter} and offset {offset}")]
    UndefinedSocket { ball_diameter: f64, offset: f64 },

    #[error("Width {width} is below the minimum {min_width}")]
    WidthBelowMinimum { width: f64, min_width: f64 },

    #[error("Length {length} is below the minimum {min_length}")]
    LengthBelowMinimum { length: f64, min_length: f64 },

    #[error("Ball diameter {ball_diameter} exceeds the maximum {max_ball_diameter}")]
    BallDiameterAboveMaximum {
        ball_diameter: f64,
        max_ball_diameter: f64,
    },

    #[error("Screw hole {hole_diameter} in cell ({row}, {col}) does not fit the ball {ball_diameter}")]
    HoleTooLarge {
        row: u32,
        col: u32,
        hole_diameter: f64,
        ball_diameter: f64,
    },

    #[error("Bolt hole {bolt_hole_diameter} does not fit inside the nut flats {flat_to_flat}")]
    BoltHoleTooLargeForNut {
        bolt_hole_diameter: f64,
        flat_to_flat: f64,
    },

    #[error("Centre bolt hole {bolt_hole_diameter} does not fit the {length} x {width} plate")]
    BoltHoleOutsidePlate {
        bolt_hole_diameter: f64,
        length: f64,
        width: f64,
    },

    #[error("Centre bolt hole overlaps the socket of cell ({row}, {col})")]
    BoltHoleOverlapsSocket { row: u32, col: u32 },
}

/// Result type for geometry validation
pub type GeometryResult<T> = Result<T, GeometryError>;
