//! CAD kernel abstraction

mod sim;
mod traits;

pub use sim::{BodyShape, OperationKind, SimKernel, SimOperation, SketchCurve};
pub use traits::*;
