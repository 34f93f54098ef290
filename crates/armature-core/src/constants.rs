//! Global constants for armature-core

/// Clearance added to every socket circle when packing rows
///
/// Taken in the parameters' own unit, so a centimetre joint gets ten times
/// the physical clearance of a millimetre one. The dialog host works in
/// centimetres.
pub const MARGIN: f64 = 0.05;

/// Socket cut depth as a fraction of the ball diameter
pub const BALL_OFFSET_RATIO: f64 = 1.0 / 3.0;

/// Chamfer length as a fraction of the ball radius
pub const CHAMFER_RATIO: f64 = 0.25;

/// Chamfer angle on the socket rim (radians)
pub const CHAMFER_ANGLE: f64 = std::f64::consts::FRAC_PI_4;

/// Divisor applied to the chamfer length when seating the top plate
pub const TOP_PLATE_CHAMFER_DIVISOR: f64 = 1.25;

/// Half of the interior angle between hexagon flats (radians)
pub const HEX_HALF_ANGLE: f64 = std::f64::consts::PI / 6.0;

/// Relative tolerance of the host's low accuracy area and length computations
pub const AREA_TOLERANCE: f64 = 0.005;

/// Relative slack when comparing a ball diameter against its derived maximum
pub const DIAMETER_EPSILON: f64 = 1e-9;

/// Smallest allowed number of rows
pub const MIN_ROWS: u32 = 1;

/// Largest allowed number of rows
pub const MAX_ROWS: u32 = 10;

/// Smallest allowed number of columns
pub const MIN_COLS: u32 = 1;

/// Largest allowed number of columns
pub const MAX_COLS: u32 = 2;

/// Default component name
pub const DEFAULT_NAME: &str = "Joint";

/// Default plate length (mm)
pub const DEFAULT_LENGTH_MM: f64 = 15.0;

/// Default plate width (mm)
pub const DEFAULT_WIDTH_MM: f64 = 5.0;

/// Default plate thickness (in)
pub const DEFAULT_THICKNESS_IN: f64 = 1.0 / 16.0;

/// Default ball diameter (mm)
pub const DEFAULT_BALL_DIAMETER_MM: f64 = 5.0;

/// Default bolt hole diameter (mm)
pub const DEFAULT_BOLT_HOLE_DIAMETER_MM: f64 = 3.0;

/// Default screw hole diameter through a ball (mm)
pub const DEFAULT_HOLE_DIAMETER_MM: f64 = 3.0;

/// Default number of rows
pub const DEFAULT_ROWS: u32 = 2;

/// Default number of columns
pub const DEFAULT_COLS: u32 = 1;
