//! Armature CAD - builds armature ball joints through a CAD kernel
//!
//! This crate provides:
//! - The kernel surface the joint is built through, with an in-memory kernel
//! - Plate, ball and nut features driven by the joint geometry
//! - Construction history with rollback of failed builds
//! - The command session that owns inputs, bounds and the preview

pub mod builder;
pub mod feature;
pub mod history;
pub mod kernel;
pub mod session;

// Re-exports for convenience
pub use builder::{BuildReport, JointBuilder};
pub use feature::{BallOutput, BuildContext, Feature, FeatureError, FeatureResult, NutOutput, PlateOutput};
pub use history::{ConstructionHistory, HistoryEntry};
pub use kernel::{
    Accuracy, BasePlane, BodyShape, CadError, CadKernel, CadResult, EdgeId, EdgeInfo, EdgeKind,
    EntityId, EntityKind, ExtrudeExtent, FeatureOperation, FeatureOutput, NullKernel,
    OperationKind, Plane, PlaneRef, ProfileInfo, SimKernel, SimOperation, SketchCurve,
};
pub use session::{COMMAND_ID, CommandSession, InputChange};
