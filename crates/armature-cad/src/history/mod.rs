//! Construction History
//!
//! Records every kernel object a build creates, in order, so that a failed
//! or abandoned build can be removed without leaving stray planes, sketches
//! or bodies behind.

use serde::{Deserialize, Serialize};

use crate::feature::Feature;
use crate::kernel::{CadError, CadKernel, EntityId};

/// An entry in the construction history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The feature
    pub feature: Feature,
    /// Bodies created by this feature
    pub created_bodies: Vec<EntityId>,
}

impl HistoryEntry {
    /// Create a new history entry
    pub fn new(feature: Feature) -> Self {
        let created_bodies = feature.bodies().to_vec();
        Self {
            feature,
            created_bodies,
        }
    }
}

/// Ordered record of a build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstructionHistory {
    entries: Vec<HistoryEntry>,
}

impl ConstructionHistory {
    /// Create a new empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of features
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a feature to the history
    pub fn add_feature(&mut self, feature: Feature) {
        self.entries.push(HistoryEntry::new(feature));
    }

    /// Get all history entries
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Get all features
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.entries.iter().map(|e| &e.feature)
    }

    /// The component the build started with
    pub fn component(&self) -> Option<EntityId> {
        self.features().find_map(|f| match f {
            Feature::Component { id, .. } => Some(*id),
            _ => None,
        })
    }

    /// Every body created so far
    pub fn bodies(&self) -> Vec<EntityId> {
        self.entries
            .iter()
            .flat_map(|e| e.created_bodies.iter().copied())
            .collect()
    }

    /// Delete everything recorded after the first `len` entries, newest first
    ///
    /// Returns the number of kernel objects deleted. Objects that are already
    /// gone are skipped; other failures are logged and skipped so the rest of
    /// the history still gets removed.
    pub fn rollback_to(&mut self, len: usize, kernel: &dyn CadKernel) -> usize {
        let mut deleted = 0;
        while self.entries.len() > len {
            let Some(entry) = self.entries.pop() else {
                break;
            };
            let ids = entry
                .created_bodies
                .iter()
                .rev()
                .copied()
                .chain(std::iter::once(entry.feature.id()));
            for id in ids {
                match kernel.delete(id) {
                    Ok(()) => deleted += 1,
                    Err(CadError::EntityNotFound(_)) => {}
                    Err(e) => {
                        tracing::warn!("Failed to delete {} ({}): {}", entry.feature.name(), id, e)
                    }
                }
            }
        }
        deleted
    }

    /// Delete everything recorded
    pub fn rollback(&mut self, kernel: &dyn CadKernel) -> usize {
        let deleted = self.rollback_to(0, kernel);
        tracing::debug!("Rolled back {} kernel objects", deleted);
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{BasePlane, EntityKind, PlaneRef, SimKernel};

    #[test]
    fn test_add_feature() {
        let mut history = ConstructionHistory::new();
        let id = EntityId::new();
        history.add_feature(Feature::Component {
            id,
            name: "Joint".into(),
        });

        assert_eq!(history.len(), 1);
        assert_eq!(history.component(), Some(id));
    }

    #[test]
    fn test_created_bodies_follow_feature() {
        let body = EntityId::new();
        let entry = HistoryEntry::new(Feature::Extrude {
            id: EntityId::new(),
            bodies: vec![body],
        });
        assert_eq!(entry.created_bodies, vec![body]);
    }

    #[test]
    fn test_rollback_to_mark() {
        let kernel = SimKernel::new();
        let mut history = ConstructionHistory::new();

        let component = kernel.create_component("Joint").unwrap();
        history.add_feature(Feature::Component {
            id: component,
            name: "Joint".into(),
        });
        let mark = history.len();

        let plane = kernel
            .offset_plane(component, PlaneRef::Base(BasePlane::YZ), 1.0, "Joint Nuts 1")
            .unwrap();
        history.add_feature(Feature::Plane {
            id: plane,
            name: "Joint Nuts 1".into(),
        });
        let sketch = kernel
            .create_sketch(component, PlaneRef::Construction(plane), "Joint Nuts Sketch1")
            .unwrap();
        history.add_feature(Feature::Sketch {
            id: sketch,
            name: "Joint Nuts Sketch1".into(),
        });

        assert_eq!(history.rollback_to(mark, &kernel), 2);
        assert_eq!(history.len(), 1);
        assert!(kernel.contains(component));
        assert_eq!(kernel.count(EntityKind::Plane), 0);
        assert_eq!(kernel.count(EntityKind::Sketch), 0);
    }

    #[test]
    fn test_rollback_everything() {
        let kernel = SimKernel::new();
        let mut history = ConstructionHistory::new();
        let component = kernel.create_component("Joint").unwrap();
        history.add_feature(Feature::Component {
            id: component,
            name: "Joint".into(),
        });
        let plane = kernel
            .offset_plane(component, PlaneRef::Base(BasePlane::XZ), 2.0, "Joint Top Offset")
            .unwrap();
        history.add_feature(Feature::Plane {
            id: plane,
            name: "Joint Top Offset".into(),
        });

        history.rollback(&kernel);
        assert!(history.is_empty());
        assert!(kernel.is_empty());
    }

    #[test]
    fn test_rollback_skips_missing() {
        let kernel = SimKernel::new();
        let mut history = ConstructionHistory::new();
        history.add_feature(Feature::Sketch {
            id: EntityId::new(),
            name: "Gone".into(),
        });
        assert_eq!(history.rollback(&kernel), 0);
        assert!(history.is_empty());
    }
}
