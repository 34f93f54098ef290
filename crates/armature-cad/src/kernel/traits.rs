//! CAD Kernel trait definitions
//!
//! The host application exposes its modelling surface through handles:
//! components own construction planes, sketches, features and bodies, and
//! every object is addressed by an opaque id. [`CadKernel`] is that surface.

use glam::{DQuat, DVec2, DVec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Distance under which two points are considered coincident
pub const POINT_TOLERANCE: f64 = 1e-9;

/// Opaque handle to a kernel object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a fresh id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of object an [`EntityId`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Component,
    Plane,
    Sketch,
    Curve,
    Profile,
    Feature,
    Body,
}

/// Unique identifier for an edge within a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId {
    /// Body this edge belongs to
    pub body: EntityId,
    /// Index of the edge within the body
    pub index: u32,
}

impl EdgeId {
    /// Create a new edge ID
    pub fn new(body: EntityId, index: u32) -> Self {
        Self { body, index }
    }
}

/// Shape of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    Line,
    Circle,
    Arc,
}

/// Information about an edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeInfo {
    /// Unique identifier for this edge
    pub id: EdgeId,
    pub kind: EdgeKind,
    /// Start point of the edge
    pub start: DVec3,
    /// End point of the edge (equal to `start` for closed edges)
    pub end: DVec3,
    /// A point halfway along the edge
    pub midpoint: DVec3,
    /// Length of the edge
    pub length: f64,
}

impl EdgeInfo {
    /// Create a straight edge
    pub fn line(id: EdgeId, start: DVec3, end: DVec3) -> Self {
        Self {
            id,
            kind: EdgeKind::Line,
            start,
            end,
            midpoint: (start + end) * 0.5,
            length: (end - start).length(),
        }
    }

    /// Create a full circle edge starting along `x_axis`
    pub fn circle(id: EdgeId, center: DVec3, radius: f64, x_axis: DVec3) -> Self {
        let start = center + x_axis * radius;
        Self {
            id,
            kind: EdgeKind::Circle,
            start,
            end: start,
            midpoint: center - x_axis * radius,
            length: std::f64::consts::TAU * radius,
        }
    }

    /// Create a half circle edge from `start` to the opposite point, passing `midpoint`
    pub fn half_circle(id: EdgeId, center: DVec3, radius: f64, start: DVec3, midpoint: DVec3) -> Self {
        Self {
            id,
            kind: EdgeKind::Arc,
            start,
            end: center * 2.0 - start,
            midpoint,
            length: std::f64::consts::PI * radius,
        }
    }
}

/// A plane with its sketch axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub origin: DVec3,
    /// Sketch X direction
    pub x_axis: DVec3,
    /// Sketch Y direction
    pub y_axis: DVec3,
}

impl Plane {
    pub fn new(origin: DVec3, x_axis: DVec3, y_axis: DVec3) -> Self {
        Self {
            origin,
            x_axis: x_axis.normalize(),
            y_axis: y_axis.normalize(),
        }
    }

    pub fn normal(&self) -> DVec3 {
        self.x_axis.cross(self.y_axis).normalize()
    }

    /// Map a sketch point into model space
    pub fn to_world(&self, p: DVec2) -> DVec3 {
        self.origin + self.x_axis * p.x + self.y_axis * p.y
    }

    /// Project a model space point into sketch coordinates
    pub fn to_local(&self, p: DVec3) -> DVec2 {
        let d = p - self.origin;
        DVec2::new(d.dot(self.x_axis), d.dot(self.y_axis))
    }

    /// Signed distance of a point along the normal
    pub fn distance(&self, p: DVec3) -> f64 {
        (p - self.origin).dot(self.normal())
    }

    pub fn contains(&self, p: DVec3, tolerance: f64) -> bool {
        self.distance(p).abs() <= tolerance
    }

    /// Parallel plane moved `offset` along the normal
    pub fn offset(&self, offset: f64) -> Self {
        Self {
            origin: self.origin + self.normal() * offset,
            ..*self
        }
    }

    /// Plane containing the line `start..end`, rotated about it from `self` by `angle`
    ///
    /// The result is centred on the line's midpoint with its X axis along the
    /// line.
    pub fn through_line(&self, start: DVec3, end: DVec3, angle: f64) -> Option<Self> {
        let direction = (end - start).try_normalize()?;
        let normal = DQuat::from_axis_angle(direction, angle) * self.normal();
        Some(Self::new(
            (start + end) * 0.5,
            direction,
            normal.cross(direction),
        ))
    }
}

/// The three origin planes of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasePlane {
    XY,
    XZ,
    YZ,
}

impl BasePlane {
    /// Geometry of the plane with the host's sketch axes
    pub fn plane(self) -> Plane {
        match self {
            BasePlane::XY => Plane::new(DVec3::ZERO, DVec3::X, DVec3::Y),
            BasePlane::XZ => Plane::new(DVec3::ZERO, DVec3::X, DVec3::NEG_Z),
            BasePlane::YZ => Plane::new(DVec3::ZERO, DVec3::NEG_Z, DVec3::Y),
        }
    }
}

/// A plane a sketch or offset plane can be placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaneRef {
    Base(BasePlane),
    Construction(EntityId),
}

/// Precision of area computations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Accuracy {
    #[default]
    Low,
    Medium,
    High,
}

/// A closed region of a sketch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileInfo {
    pub id: EntityId,
    /// Area at the requested accuracy
    pub area: f64,
    /// Boundary loops: the outer one plus one per hole
    pub loops: usize,
}

/// How far an extrusion reaches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExtrudeExtent {
    /// One-sided, negative values extrude against the normal
    Distance(f64),
    /// The given distance on each side of the sketch plane
    Symmetric(f64),
}

/// What a feature does with its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureOperation {
    NewBody,
    Cut,
}

/// Result of a feature that can create bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureOutput {
    pub feature: EntityId,
    pub bodies: Vec<EntityId>,
}

/// Error type for CAD kernel operations
#[derive(Debug, Clone, Error)]
pub enum CadError {
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Entity {id} is not a {expected:?}")]
    WrongKind { id: EntityId, expected: EntityKind },

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Kernel not available: {0}")]
    KernelNotAvailable(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for CAD operations
pub type CadResult<T> = Result<T, CadError>;

/// The host modelling surface
///
/// Every call either succeeds with a handle or fails; nothing is retried.
pub trait CadKernel: Send + Sync {
    /// Get the name of this kernel
    fn name(&self) -> &str;

    /// Check if the kernel is available
    fn is_available(&self) -> bool;

    // ========== Components and planes ==========

    /// Create a new component
    fn create_component(&self, name: &str) -> CadResult<EntityId>;

    /// Add a construction plane parallel to `base` at `offset` along its normal
    fn offset_plane(
        &self,
        component: EntityId,
        base: PlaneRef,
        offset: f64,
        name: &str,
    ) -> CadResult<EntityId>;

    /// Add a construction plane through a sketch line, rotated from the
    /// line's sketch plane by `angle` radians
    fn angled_plane(
        &self,
        component: EntityId,
        line: EntityId,
        angle: f64,
        name: &str,
    ) -> CadResult<EntityId>;

    /// Geometry of a plane
    fn plane(&self, plane: PlaneRef) -> CadResult<Plane>;

    // ========== Sketches ==========

    fn create_sketch(&self, component: EntityId, plane: PlaneRef, name: &str)
    -> CadResult<EntityId>;

    fn add_line(&self, sketch: EntityId, start: DVec2, end: DVec2) -> CadResult<EntityId>;

    /// Add an axis-aligned rectangle from two opposite corners
    fn add_rectangle(&self, sketch: EntityId, a: DVec2, b: DVec2) -> CadResult<EntityId>;

    fn add_circle(&self, sketch: EntityId, center: DVec2, radius: f64) -> CadResult<EntityId>;

    /// Add a closed polygon through `points`
    fn add_polygon(&self, sketch: EntityId, points: &[DVec2]) -> CadResult<EntityId>;

    /// Closed regions of a sketch, in the kernel's enumeration order
    fn profiles(&self, sketch: EntityId, accuracy: Accuracy) -> CadResult<Vec<ProfileInfo>>;

    // ========== Features ==========

    fn extrude(
        &self,
        component: EntityId,
        profile: EntityId,
        extent: ExtrudeExtent,
        operation: FeatureOperation,
    ) -> CadResult<FeatureOutput>;

    /// Revolve a profile around a sketch line
    fn revolve(
        &self,
        component: EntityId,
        profile: EntityId,
        axis: EntityId,
        angle: f64,
    ) -> CadResult<FeatureOutput>;

    /// Chamfer edges by a distance and an angle
    fn chamfer(
        &self,
        component: EntityId,
        edges: &[EdgeId],
        distance: f64,
        angle: f64,
    ) -> CadResult<EntityId>;

    /// Round edges with a constant radius
    fn fillet(&self, component: EntityId, edges: &[EdgeId], radius: f64) -> CadResult<EntityId>;

    // ========== Bodies ==========

    fn set_body_name(&self, body: EntityId, name: &str) -> CadResult<()>;

    fn body_name(&self, body: EntityId) -> CadResult<String>;

    /// Get all edges of a body with their geometric information
    fn edges(&self, body: EntityId) -> CadResult<Vec<EdgeInfo>>;

    /// Delete an object and everything it owns
    fn delete(&self, entity: EntityId) -> CadResult<()>;
}

/// A null kernel that always returns errors (used when no host is attached)
#[derive(Debug, Default)]
pub struct NullKernel;

impl NullKernel {
    fn unavailable<T>() -> CadResult<T> {
        Err(CadError::KernelNotAvailable("No CAD kernel available".into()))
    }
}

impl CadKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn create_component(&self, _name: &str) -> CadResult<EntityId> {
        Self::unavailable()
    }

    fn offset_plane(
        &self,
        _component: EntityId,
        _base: PlaneRef,
        _offset: f64,
        _name: &str,
    ) -> CadResult<EntityId> {
        Self::unavailable()
    }

    fn angled_plane(
        &self,
        _component: EntityId,
        _line: EntityId,
        _angle: f64,
        _name: &str,
    ) -> CadResult<EntityId> {
        Self::unavailable()
    }

    fn plane(&self, plane: PlaneRef) -> CadResult<Plane> {
        match plane {
            PlaneRef::Base(base) => Ok(base.plane()),
            PlaneRef::Construction(_) => Self::unavailable(),
        }
    }

    fn create_sketch(
        &self,
        _component: EntityId,
        _plane: PlaneRef,
        _name: &str,
    ) -> CadResult<EntityId> {
        Self::unavailable()
    }

    fn add_line(&self, _sketch: EntityId, _start: DVec2, _end: DVec2) -> CadResult<EntityId> {
        Self::unavailable()
    }

    fn add_rectangle(&self, _sketch: EntityId, _a: DVec2, _b: DVec2) -> CadResult<EntityId> {
        Self::unavailable()
    }

    fn add_circle(&self, _sketch: EntityId, _center: DVec2, _radius: f64) -> CadResult<EntityId> {
        Self::unavailable()
    }

    fn add_polygon(&self, _sketch: EntityId, _points: &[DVec2]) -> CadResult<EntityId> {
        Self::unavailable()
    }

    fn profiles(&self, _sketch: EntityId, _accuracy: Accuracy) -> CadResult<Vec<ProfileInfo>> {
        Self::unavailable()
    }

    fn extrude(
        &self,
        _component: EntityId,
        _profile: EntityId,
        _extent: ExtrudeExtent,
        _operation: FeatureOperation,
    ) -> CadResult<FeatureOutput> {
        Self::unavailable()
    }

    fn revolve(
        &self,
        _component: EntityId,
        _profile: EntityId,
        _axis: EntityId,
        _angle: f64,
    ) -> CadResult<FeatureOutput> {
        Self::unavailable()
    }

    fn chamfer(
        &self,
        _component: EntityId,
        _edges: &[EdgeId],
        _distance: f64,
        _angle: f64,
    ) -> CadResult<EntityId> {
        Self::unavailable()
    }

    fn fillet(&self, _component: EntityId, _edges: &[EdgeId], _radius: f64) -> CadResult<EntityId> {
        Self::unavailable()
    }

    fn set_body_name(&self, _body: EntityId, _name: &str) -> CadResult<()> {
        Self::unavailable()
    }

    fn body_name(&self, _body: EntityId) -> CadResult<String> {
        Self::unavailable()
    }

    fn edges(&self, _body: EntityId) -> CadResult<Vec<EdgeInfo>> {
        Self::unavailable()
    }

    fn delete(&self, _entity: EntityId) -> CadResult<()> {
        Self::unavailable()
    }
}
