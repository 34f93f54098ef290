//! Armature Core - parametric geometry of stop-motion armature ball joints
//!
//! Turns a handful of user dimensions into every quantity needed to build the
//! joint: socket circles, ball positions, plane elevations, chamfers, and the
//! bounds that keep the configuration buildable.

pub mod constants;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod inputs;
pub mod matching;
pub mod params;
pub mod preset;
pub mod socket;
pub mod units;

pub use controller::{Adjustment, InputExtents, Manipulator};
pub use error::{GeometryError, GeometryResult};
pub use geometry::{CellGeometry, DerivedGeometry, JointGeometry};
pub use inputs::{InputMap, InputSource, InputValue};
pub use params::{CellGrid, CellSpec, JointParameters, JointType};
pub use preset::{Preset, PresetError};
pub use socket::{SocketGeometry, circle_radius_of_sphere, diameter_for_circle_radius};
pub use units::LengthUnit;
