//! Joint features
//!
//! Each submodule builds one part of the joint on top of a [`BuildContext`]:
//! the plates, the balls with their screw holes, and the nuts. Every object
//! created through the context is recorded so a failed build can be rolled
//! back.

pub mod ball;
pub mod nut;
pub mod plate;

use armature_core::{GeometryError, JointGeometry, JointParameters};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::history::ConstructionHistory;
use crate::kernel::{
    Accuracy, CadError, CadKernel, EdgeId, EntityId, ExtrudeExtent, FeatureOperation,
    FeatureOutput, PlaneRef, ProfileInfo,
};

pub use ball::BallOutput;
pub use nut::NutOutput;
pub use plate::PlateOutput;

/// Feature-related errors
#[derive(Debug, Clone, Error)]
pub enum FeatureError {
    #[error("Invalid geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("CAD kernel error: {0}")]
    Cad(#[from] CadError),

    #[error("No profile of sketch '{sketch}' matches the expected area {expected_area}")]
    ProfileNotFound { sketch: String, expected_area: f64 },

    #[error("Expected {expected} bodies from {feature}, got {actual}")]
    UnexpectedBodyCount {
        feature: String,
        expected: usize,
        actual: usize,
    },

    #[error("Expected {expected} profiles in sketch '{sketch}', got {actual}")]
    UnexpectedProfileCount {
        sketch: String,
        expected: usize,
        actual: usize,
    },

    #[error("Nothing to build: {0}")]
    EmptyResult(String),
}

/// Result type for feature operations
pub type FeatureResult<T> = Result<T, FeatureError>;

/// A kernel object created while building a joint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Feature {
    Component {
        id: EntityId,
        name: String,
    },
    Plane {
        id: EntityId,
        name: String,
    },
    Sketch {
        id: EntityId,
        name: String,
    },
    Extrude {
        id: EntityId,
        bodies: Vec<EntityId>,
    },
    Revolve {
        id: EntityId,
        bodies: Vec<EntityId>,
    },
    Cut {
        id: EntityId,
    },
    Chamfer {
        id: EntityId,
        edges: usize,
    },
    Fillet {
        id: EntityId,
        edges: usize,
    },
}

impl Feature {
    /// Kernel handle of the feature
    pub fn id(&self) -> EntityId {
        match self {
            Feature::Component { id, .. }
            | Feature::Plane { id, .. }
            | Feature::Sketch { id, .. }
            | Feature::Extrude { id, .. }
            | Feature::Revolve { id, .. }
            | Feature::Cut { id }
            | Feature::Chamfer { id, .. }
            | Feature::Fillet { id, .. } => *id,
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        match self {
            Feature::Component { name, .. }
            | Feature::Plane { name, .. }
            | Feature::Sketch { name, .. } => name,
            Feature::Extrude { .. } => "Extrude",
            Feature::Revolve { .. } => "Revolve",
            Feature::Cut { .. } => "Cut",
            Feature::Chamfer { .. } => "Chamfer",
            Feature::Fillet { .. } => "Fillet",
        }
    }

    /// Bodies the feature created
    pub fn bodies(&self) -> &[EntityId] {
        match self {
            Feature::Extrude { bodies, .. } | Feature::Revolve { bodies, .. } => bodies,
            _ => &[],
        }
    }
}

/// Everything a feature builder needs, plus the record of what it created
pub struct BuildContext<'a> {
    pub kernel: &'a dyn CadKernel,
    pub params: &'a JointParameters,
    pub component: EntityId,
    pub history: ConstructionHistory,
}

impl<'a> BuildContext<'a> {
    /// Start from an already created component
    pub fn new(
        kernel: &'a dyn CadKernel,
        params: &'a JointParameters,
        component: EntityId,
        history: ConstructionHistory,
    ) -> Self {
        Self {
            kernel,
            params,
            component,
            history,
        }
    }

    pub fn geometry(&self) -> JointGeometry<'a> {
        self.params.geometry()
    }

    pub fn offset_plane(
        &mut self,
        base: PlaneRef,
        offset: f64,
        name: &str,
    ) -> FeatureResult<EntityId> {
        let id = self
            .kernel
            .offset_plane(self.component, base, offset, name)?;
        self.history.add_feature(Feature::Plane {
            id,
            name: name.to_string(),
        });
        Ok(id)
    }

    pub fn angled_plane(&mut self, line: EntityId, angle: f64, name: &str) -> FeatureResult<EntityId> {
        let id = self
            .kernel
            .angled_plane(self.component, line, angle, name)?;
        self.history.add_feature(Feature::Plane {
            id,
            name: name.to_string(),
        });
        Ok(id)
    }

    pub fn sketch(&mut self, plane: PlaneRef, name: &str) -> FeatureResult<EntityId> {
        let id = self.kernel.create_sketch(self.component, plane, name)?;
        self.history.add_feature(Feature::Sketch {
            id,
            name: name.to_string(),
        });
        Ok(id)
    }

    /// First profile of a sketch whose low accuracy area matches `expected_area`
    pub fn profile_by_area(
        &self,
        sketch: EntityId,
        sketch_name: &str,
        expected_area: f64,
    ) -> FeatureResult<ProfileInfo> {
        let profiles = self.kernel.profiles(sketch, Accuracy::Low)?;
        armature_core::matching::select_first(profiles, expected_area, |p| p.area).ok_or_else(
            || FeatureError::ProfileNotFound {
                sketch: sketch_name.to_string(),
                expected_area,
            },
        )
    }

    pub fn extrude(
        &mut self,
        profile: EntityId,
        extent: ExtrudeExtent,
        operation: FeatureOperation,
    ) -> FeatureResult<FeatureOutput> {
        let out = self
            .kernel
            .extrude(self.component, profile, extent, operation)?;
        let feature = match operation {
            FeatureOperation::NewBody => Feature::Extrude {
                id: out.feature,
                bodies: out.bodies.clone(),
            },
            FeatureOperation::Cut => Feature::Cut { id: out.feature },
        };
        self.history.add_feature(feature);
        Ok(out)
    }

    pub fn revolve(
        &mut self,
        profile: EntityId,
        axis: EntityId,
        angle: f64,
    ) -> FeatureResult<FeatureOutput> {
        let out = self.kernel.revolve(self.component, profile, axis, angle)?;
        self.history.add_feature(Feature::Revolve {
            id: out.feature,
            bodies: out.bodies.clone(),
        });
        Ok(out)
    }

    pub fn chamfer(&mut self, edges: &[EdgeId], distance: f64, angle: f64) -> FeatureResult<EntityId> {
        let id = self
            .kernel
            .chamfer(self.component, edges, distance, angle)?;
        self.history.add_feature(Feature::Chamfer {
            id,
            edges: edges.len(),
        });
        Ok(id)
    }

    pub fn fillet(&mut self, edges: &[EdgeId], radius: f64) -> FeatureResult<EntityId> {
        let id = self.kernel.fillet(self.component, edges, radius)?;
        self.history.add_feature(Feature::Fillet {
            id,
            edges: edges.len(),
        });
        Ok(id)
    }

    pub fn circle(&self, sketch: EntityId, center: DVec2, radius: f64) -> FeatureResult<EntityId> {
        Ok(self.kernel.add_circle(sketch, center, radius)?)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::kernel::SimKernel;

    /// Default parameters with the width raised to its minimum
    pub fn valid_params() -> JointParameters {
        let mut params = JointParameters::default();
        armature_core::controller::apply(&mut params);
        params
    }

    /// A context with a freshly created component
    pub fn context<'a>(kernel: &'a SimKernel, params: &'a JointParameters) -> BuildContext<'a> {
        let component = kernel.create_component(&params.name).unwrap();
        let mut history = ConstructionHistory::new();
        history.add_feature(Feature::Component {
            id: component,
            name: params.name.clone(),
        });
        BuildContext::new(kernel, params, component, history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_accessors() {
        let id = EntityId::new();
        let body = EntityId::new();
        let feature = Feature::Revolve {
            id,
            bodies: vec![body],
        };
        assert_eq!(feature.id(), id);
        assert_eq!(feature.name(), "Revolve");
        assert_eq!(feature.bodies(), &[body]);

        let plane = Feature::Plane {
            id,
            name: "Joint Balls".into(),
        };
        assert_eq!(plane.name(), "Joint Balls");
        assert!(plane.bodies().is_empty());
    }

    #[test]
    fn test_geometry_error_converts() {
        let err: FeatureError = GeometryError::MissingInput("x".into()).into();
        assert!(matches!(err, FeatureError::Geometry(_)));
    }
}
