//! In-memory kernel
//!
//! `SimKernel` keeps just enough geometry to answer the queries the joint
//! builder relies on: profile areas from closed sketch loops, edge lengths
//! and positions of extruded bodies, and sphere placement of revolved balls.
//! A line through the centre of a circle splits its disc into two halves,
//! the way a host sketch does.
//! Every mutating call is appended to an operation log.

use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

use glam::{DVec2, DVec3};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::traits::*;

/// Relative shrink applied to boundary samples before containment tests
const SAMPLE_INSET: f64 = 1e-6;

/// Curves a sketch can hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SketchCurve {
    Line { start: DVec2, end: DVec2 },
    Circle { center: DVec2, radius: f64 },
    Polygon { points: Vec<DVec2> },
}

/// Solid shape of a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BodyShape {
    /// A region extruded between two offsets of its sketch plane
    Prism { area: f64, height: f64 },
    Sphere { center: DVec3, radius: f64 },
}

/// Kinds of mutating operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    CreateComponent,
    OffsetPlane,
    AngledPlane,
    CreateSketch,
    AddCurve,
    Extrude,
    Revolve,
    Chamfer,
    Fillet,
    RenameBody,
    Delete,
}

/// One entry of the operation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimOperation {
    CreateComponent {
        id: EntityId,
        name: String,
    },
    OffsetPlane {
        id: EntityId,
        name: String,
        offset: f64,
    },
    AngledPlane {
        id: EntityId,
        name: String,
        angle: f64,
    },
    CreateSketch {
        id: EntityId,
        name: String,
    },
    AddCurve {
        sketch: EntityId,
        id: EntityId,
        curve: SketchCurve,
    },
    Extrude {
        feature: EntityId,
        profile: EntityId,
        extent: ExtrudeExtent,
        operation: FeatureOperation,
        bodies: Vec<EntityId>,
    },
    Revolve {
        feature: EntityId,
        profile: EntityId,
        axis: EntityId,
        angle: f64,
        bodies: Vec<EntityId>,
    },
    Chamfer {
        feature: EntityId,
        edges: usize,
        distance: f64,
        angle: f64,
    },
    Fillet {
        feature: EntityId,
        edges: usize,
        radius: f64,
    },
    RenameBody {
        body: EntityId,
        name: String,
    },
    Delete {
        id: EntityId,
        kind: EntityKind,
    },
}

impl SimOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            SimOperation::CreateComponent { .. } => OperationKind::CreateComponent,
            SimOperation::OffsetPlane { .. } => OperationKind::OffsetPlane,
            SimOperation::AngledPlane { .. } => OperationKind::AngledPlane,
            SimOperation::CreateSketch { .. } => OperationKind::CreateSketch,
            SimOperation::AddCurve { .. } => OperationKind::AddCurve,
            SimOperation::Extrude { .. } => OperationKind::Extrude,
            SimOperation::Revolve { .. } => OperationKind::Revolve,
            SimOperation::Chamfer { .. } => OperationKind::Chamfer,
            SimOperation::Fillet { .. } => OperationKind::Fillet,
            SimOperation::RenameBody { .. } => OperationKind::RenameBody,
            SimOperation::Delete { .. } => OperationKind::Delete,
        }
    }
}

// ========== Loops and regions ==========

#[derive(Debug, Clone, PartialEq)]
enum LoopShape {
    Circle { center: DVec2, radius: f64 },
    /// The half of a disc lying on the `side` of its diameter
    HalfDisc {
        center: DVec2,
        radius: f64,
        side: DVec2,
    },
    Polygon(Vec<DVec2>),
}

impl LoopShape {
    fn from_curve(curve: &SketchCurve) -> Option<Self> {
        match curve {
            SketchCurve::Circle { center, radius } => Some(LoopShape::Circle {
                center: *center,
                radius: *radius,
            }),
            SketchCurve::Polygon { points } => Some(LoopShape::Polygon(points.clone())),
            SketchCurve::Line { .. } => None,
        }
    }

    fn area(&self) -> f64 {
        match self {
            LoopShape::Circle { radius, .. } => PI * radius * radius,
            LoopShape::HalfDisc { radius, .. } => PI * radius * radius / 2.0,
            LoopShape::Polygon(points) => {
                let n = points.len();
                let twice: f64 = (0..n)
                    .map(|i| points[i].perp_dot(points[(i + 1) % n]))
                    .sum();
                twice.abs() / 2.0
            }
        }
    }

    fn centroid(&self) -> DVec2 {
        match self {
            LoopShape::Circle { center, .. } => *center,
            LoopShape::HalfDisc {
                center,
                radius,
                side,
            } => *center + *side * (4.0 * radius / (3.0 * PI)),
            LoopShape::Polygon(points) => {
                points.iter().copied().sum::<DVec2>() / points.len().max(1) as f64
            }
        }
    }

    fn contains_point(&self, p: DVec2) -> bool {
        match self {
            LoopShape::Circle { center, radius } => p.distance(*center) <= *radius,
            LoopShape::HalfDisc {
                center,
                radius,
                side,
            } => p.distance(*center) <= *radius && (p - *center).dot(*side) >= 0.0,
            LoopShape::Polygon(points) => {
                let n = points.len();
                let mut inside = false;
                let mut j = n.wrapping_sub(1);
                for i in 0..n {
                    let (a, b) = (points[i], points[j]);
                    if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x
                    {
                        inside = !inside;
                    }
                    j = i;
                }
                inside
            }
        }
    }

    /// Boundary points pulled slightly towards the centroid
    fn samples(&self) -> Vec<DVec2> {
        let centroid = self.centroid();
        let boundary: Vec<DVec2> = match self {
            LoopShape::Circle { center, radius } => (0..8)
                .map(|i| {
                    let a = i as f64 / 8.0 * TAU;
                    *center + DVec2::new(a.cos(), a.sin()) * *radius
                })
                .collect(),
            LoopShape::HalfDisc {
                center,
                radius,
                side,
            } => {
                let first = side.y.atan2(side.x) - FRAC_PI_2;
                (0..=8)
                    .map(|i| {
                        let a = first + i as f64 / 8.0 * PI;
                        *center + DVec2::new(a.cos(), a.sin()) * *radius
                    })
                    .collect()
            }
            LoopShape::Polygon(points) => points.clone(),
        };
        boundary
            .into_iter()
            .map(|p| p + (centroid - p) * SAMPLE_INSET)
            .collect()
    }

    fn contains(&self, other: &LoopShape) -> bool {
        other.area() < self.area() && other.samples().iter().all(|p| self.contains_point(*p))
    }
}

/// Normal of a sketch line spanning a circle through its centre, if it does
fn diameter_side(center: DVec2, radius: f64, start: DVec2, end: DVec2) -> Option<DVec2> {
    let direction = (end - start).try_normalize()?;
    let tolerance = POINT_TOLERANCE.max(radius * 1e-9);
    if (center - start).perp_dot(direction).abs() > tolerance {
        return None;
    }
    let (from, to) = ((start - center).dot(direction), (end - center).dot(direction));
    (from <= -radius + tolerance && to >= radius - tolerance).then_some(direction.perp())
}

/// Replace every circle crossed by a line through its centre with its two halves
///
/// Chords away from the centre leave the disc whole.
fn split_by_diameters(loops: Vec<LoopShape>, lines: &[(DVec2, DVec2)]) -> Vec<LoopShape> {
    loops
        .into_iter()
        .flat_map(|shape| {
            let side = match &shape {
                LoopShape::Circle { center, radius } => lines
                    .iter()
                    .find_map(|&(start, end)| diameter_side(*center, *radius, start, end)),
                _ => None,
            };
            match (shape, side) {
                (LoopShape::Circle { center, radius }, Some(side)) => vec![
                    LoopShape::HalfDisc {
                        center,
                        radius,
                        side,
                    },
                    LoopShape::HalfDisc {
                        center,
                        radius,
                        side: -side,
                    },
                ],
                (shape, _) => vec![shape],
            }
        })
        .collect()
}

/// Area shared by two circles
fn lens_area(c1: DVec2, r1: f64, c2: DVec2, r2: f64) -> f64 {
    let d = c1.distance(c2);
    if d >= r1 + r2 {
        return 0.0;
    }
    if d <= (r1 - r2).abs() {
        let r = r1.min(r2);
        return PI * r * r;
    }
    let a1 = ((d * d + r1 * r1 - r2 * r2) / (2.0 * d * r1)).clamp(-1.0, 1.0).acos();
    let a2 = ((d * d + r2 * r2 - r1 * r1) / (2.0 * d * r2)).clamp(-1.0, 1.0).acos();
    let k = ((-d + r1 + r2) * (d + r1 - r2) * (d - r1 + r2) * (d + r1 + r2)).max(0.0);
    r1 * r1 * a1 + r2 * r2 * a2 - 0.5 * k.sqrt()
}

#[derive(Debug, Clone)]
struct Region {
    outer: LoopShape,
    holes: Vec<LoopShape>,
    area: f64,
}

/// Split closed loops into regions: each loop minus the loops directly inside it
fn regions(loops: &[LoopShape]) -> Vec<Region> {
    let parents: Vec<Option<usize>> = (0..loops.len())
        .map(|i| {
            (0..loops.len())
                .filter(|&j| j != i && loops[j].contains(&loops[i]))
                .min_by(|&a, &b| loops[a].area().total_cmp(&loops[b].area()))
        })
        .collect();

    (0..loops.len())
        .map(|i| {
            let holes: Vec<LoopShape> = (0..loops.len())
                .filter(|&j| parents[j] == Some(i))
                .map(|j| loops[j].clone())
                .collect();

            let mut area = loops[i].area() - holes.iter().map(LoopShape::area).sum::<f64>();
            for (a, first) in holes.iter().enumerate() {
                for second in &holes[a + 1..] {
                    if let (
                        LoopShape::Circle {
                            center: c1,
                            radius: r1,
                        },
                        LoopShape::Circle {
                            center: c2,
                            radius: r2,
                        },
                    ) = (first, second)
                    {
                        area += lens_area(*c1, *r1, *c2, *r2);
                    }
                }
            }

            Region {
                outer: loops[i].clone(),
                holes,
                area,
            }
        })
        .collect()
}

// ========== State ==========

#[derive(Debug, Clone)]
enum Entity {
    Component {
        name: String,
    },
    Plane {
        name: String,
        plane: Plane,
    },
    Sketch {
        name: String,
        plane: Plane,
        curves: Vec<EntityId>,
    },
    Curve {
        curve: SketchCurve,
    },
    Profile {
        region: Region,
        plane: Plane,
    },
    Feature {
        name: String,
    },
    Body {
        name: String,
        shape: BodyShape,
        edges: Vec<EdgeInfo>,
    },
}

impl Entity {
    fn kind(&self) -> EntityKind {
        match self {
            Entity::Component { .. } => EntityKind::Component,
            Entity::Plane { .. } => EntityKind::Plane,
            Entity::Sketch { .. } => EntityKind::Sketch,
            Entity::Curve { .. } => EntityKind::Curve,
            Entity::Profile { .. } => EntityKind::Profile,
            Entity::Feature { .. } => EntityKind::Feature,
            Entity::Body { .. } => EntityKind::Body,
        }
    }

    fn name(&self) -> Option<&str> {
        match self {
            Entity::Component { name }
            | Entity::Plane { name, .. }
            | Entity::Sketch { name, .. }
            | Entity::Feature { name }
            | Entity::Body { name, .. } => Some(name),
            Entity::Curve { .. } | Entity::Profile { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<EntityId>,
    seq: u64,
    entity: Entity,
}

#[derive(Debug, Default)]
struct SimState {
    nodes: HashMap<EntityId, Node>,
    next_seq: u64,
    bodies_created: usize,
    log: Vec<SimOperation>,
}

impl SimState {
    fn insert(&mut self, parent: Option<EntityId>, entity: Entity) -> EntityId {
        let id = EntityId::new();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.nodes.insert(id, Node { parent, seq, entity });
        id
    }

    fn get(&self, id: EntityId) -> CadResult<&Node> {
        self.nodes.get(&id).ok_or(CadError::EntityNotFound(id))
    }

    fn expect_kind(&self, id: EntityId, expected: EntityKind) -> CadResult<&Node> {
        let node = self.get(id)?;
        if node.entity.kind() != expected {
            return Err(CadError::WrongKind { id, expected });
        }
        Ok(node)
    }

    fn plane(&self, plane: PlaneRef) -> CadResult<Plane> {
        match plane {
            PlaneRef::Base(base) => Ok(base.plane()),
            PlaneRef::Construction(id) => match &self.get(id)?.entity {
                Entity::Plane { plane, .. } => Ok(*plane),
                _ => Err(CadError::WrongKind {
                    id,
                    expected: EntityKind::Plane,
                }),
            },
        }
    }

    fn sketch_plane(&self, sketch: EntityId) -> CadResult<Plane> {
        match &self.expect_kind(sketch, EntityKind::Sketch)?.entity {
            Entity::Sketch { plane, .. } => Ok(*plane),
            _ => Err(CadError::WrongKind {
                id: sketch,
                expected: EntityKind::Sketch,
            }),
        }
    }

    fn sketch_contents(&self, sketch: EntityId) -> CadResult<(Plane, Vec<EntityId>)> {
        match &self.get(sketch)?.entity {
            Entity::Sketch { plane, curves, .. } => Ok((*plane, curves.clone())),
            _ => Err(CadError::WrongKind {
                id: sketch,
                expected: EntityKind::Sketch,
            }),
        }
    }

    fn profile(&self, profile: EntityId) -> CadResult<(Region, Plane)> {
        match &self.get(profile)?.entity {
            Entity::Profile { region, plane } => Ok((region.clone(), *plane)),
            _ => Err(CadError::WrongKind {
                id: profile,
                expected: EntityKind::Profile,
            }),
        }
    }

    /// End points and owning sketch of a sketch line
    fn line(&self, line: EntityId) -> CadResult<(DVec2, DVec2, EntityId)> {
        let node = self.expect_kind(line, EntityKind::Curve)?;
        match (&node.entity, node.parent) {
            (
                Entity::Curve {
                    curve: SketchCurve::Line { start, end },
                },
                Some(sketch),
            ) => Ok((*start, *end, sketch)),
            _ => Err(CadError::OperationFailed(format!(
                "{} is not a sketch line",
                line
            ))),
        }
    }

    fn body(&self, body: EntityId) -> CadResult<(&str, &[EdgeInfo])> {
        match &self.get(body)?.entity {
            Entity::Body { name, edges, .. } => Ok((name, edges)),
            _ => Err(CadError::WrongKind {
                id: body,
                expected: EntityKind::Body,
            }),
        }
    }

    fn children(&self, parent: EntityId) -> Vec<EntityId> {
        let mut children: Vec<(u64, EntityId)> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.parent == Some(parent))
            .map(|(id, node)| (node.seq, *id))
            .collect();
        children.sort();
        children.into_iter().map(|(_, id)| id).collect()
    }

    fn remove_tree(&mut self, id: EntityId) {
        for child in self.children(id) {
            self.remove_tree(child);
        }
        self.nodes.remove(&id);
    }

    fn add_curve(&mut self, sketch: EntityId, curve: SketchCurve) -> CadResult<EntityId> {
        self.expect_kind(sketch, EntityKind::Sketch)?;
        let id = self.insert(
            Some(sketch),
            Entity::Curve {
                curve: curve.clone(),
            },
        );
        if let Some(Node {
            entity: Entity::Sketch { curves, .. },
            ..
        }) = self.nodes.get_mut(&sketch)
        {
            curves.push(id);
        }
        self.log.push(SimOperation::AddCurve { sketch, id, curve });
        Ok(id)
    }

    fn new_body(&mut self, component: EntityId, shape: BodyShape) -> EntityId {
        self.bodies_created += 1;
        let name = format!("Body{}", self.bodies_created);
        self.insert(
            Some(component),
            Entity::Body {
                name,
                shape,
                edges: Vec::new(),
            },
        )
    }
}

/// Edges of a region extruded between offsets `z0` and `z1` of its plane
fn prism_edges(body: EntityId, plane: &Plane, region: &Region, z0: f64, z1: f64) -> Vec<EdgeInfo> {
    let normal = plane.normal();
    let id = EdgeId::new(body, 0);
    let mut edges = Vec::new();

    for shape in std::iter::once(&region.outer).chain(region.holes.iter()) {
        match shape {
            LoopShape::Circle { center, radius } => {
                for z in [z0, z1] {
                    let c = plane.to_world(*center) + normal * z;
                    edges.push(EdgeInfo::circle(id, c, *radius, plane.x_axis));
                }
            }
            LoopShape::HalfDisc {
                center,
                radius,
                side,
            } => {
                let along = side.perp() * *radius;
                let (a, b) = (plane.to_world(*center - along), plane.to_world(*center + along));
                let (c, mid) = (plane.to_world(*center), plane.to_world(*center + *side * *radius));
                for z in [z0, z1] {
                    let offset = normal * z;
                    edges.push(EdgeInfo::half_circle(id, c + offset, *radius, a + offset, mid + offset));
                    edges.push(EdgeInfo::line(id, a + offset, b + offset));
                }
                for p in [a, b] {
                    edges.push(EdgeInfo::line(id, p + normal * z0, p + normal * z1));
                }
            }
            LoopShape::Polygon(points) => {
                let n = points.len();
                for z in [z0, z1] {
                    for i in 0..n {
                        let a = plane.to_world(points[i]) + normal * z;
                        let b = plane.to_world(points[(i + 1) % n]) + normal * z;
                        edges.push(EdgeInfo::line(id, a, b));
                    }
                }
                for p in points {
                    let w = plane.to_world(*p);
                    edges.push(EdgeInfo::line(id, w + normal * z0, w + normal * z1));
                }
            }
        }
    }

    for (index, edge) in edges.iter_mut().enumerate() {
        edge.id = EdgeId::new(body, index as u32);
    }
    edges
}

/// Deterministic in-memory [`CadKernel`]
#[derive(Debug, Default)]
pub struct SimKernel {
    state: Mutex<SimState>,
    area_error: f64,
    fail_on: Option<OperationKind>,
}

impl SimKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report low accuracy areas off by a relative `error`
    pub fn with_area_error(mut self, error: f64) -> Self {
        self.area_error = error;
        self
    }

    /// Make every operation of `kind` fail
    pub fn failing_on(mut self, kind: OperationKind) -> Self {
        self.fail_on = Some(kind);
        self
    }

    fn check(&self, kind: OperationKind) -> CadResult<()> {
        if self.fail_on == Some(kind) {
            return Err(CadError::OperationFailed(format!("{:?} rejected", kind)));
        }
        Ok(())
    }

    /// Every mutating operation so far
    pub fn log(&self) -> Vec<SimOperation> {
        self.state.lock().log.clone()
    }

    /// The operation log as pretty JSON
    pub fn log_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.state.lock().log)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.state.lock().nodes.contains_key(&id)
    }

    pub fn kind(&self, id: EntityId) -> Option<EntityKind> {
        self.state.lock().nodes.get(&id).map(|n| n.entity.kind())
    }

    /// Name of a named entity
    pub fn entity_name(&self, id: EntityId) -> Option<String> {
        let state = self.state.lock();
        state
            .nodes
            .get(&id)
            .and_then(|n| n.entity.name().map(str::to_string))
    }

    /// Number of live entities of a kind
    pub fn count(&self, kind: EntityKind) -> usize {
        self.state
            .lock()
            .nodes
            .values()
            .filter(|n| n.entity.kind() == kind)
            .count()
    }

    /// Names of the live entities of a kind, in creation order
    pub fn names(&self, kind: EntityKind) -> Vec<String> {
        let state = self.state.lock();
        let mut named: Vec<(u64, String)> = state
            .nodes
            .values()
            .filter(|n| n.entity.kind() == kind)
            .filter_map(|n| n.entity.name().map(|name| (n.seq, name.to_string())))
            .collect();
        named.sort();
        named.into_iter().map(|(_, name)| name).collect()
    }

    /// Direct children of an entity, in creation order
    pub fn children(&self, parent: EntityId) -> Vec<EntityId> {
        self.state.lock().children(parent)
    }

    pub fn body_shape(&self, body: EntityId) -> Option<BodyShape> {
        match self.state.lock().nodes.get(&body).map(|n| &n.entity) {
            Some(Entity::Body { shape, .. }) => Some(*shape),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().nodes.is_empty()
    }
}

impl CadKernel for SimKernel {
    fn name(&self) -> &str {
        "sim"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn create_component(&self, name: &str) -> CadResult<EntityId> {
        self.check(OperationKind::CreateComponent)?;
        let mut state = self.state.lock();
        let id = state.insert(
            None,
            Entity::Component {
                name: name.to_string(),
            },
        );
        state.log.push(SimOperation::CreateComponent {
            id,
            name: name.to_string(),
        });
        Ok(id)
    }

    fn offset_plane(
        &self,
        component: EntityId,
        base: PlaneRef,
        offset: f64,
        name: &str,
    ) -> CadResult<EntityId> {
        self.check(OperationKind::OffsetPlane)?;
        let mut state = self.state.lock();
        state.expect_kind(component, EntityKind::Component)?;
        let plane = state.plane(base)?.offset(offset);
        let id = state.insert(
            Some(component),
            Entity::Plane {
                name: name.to_string(),
                plane,
            },
        );
        state.log.push(SimOperation::OffsetPlane {
            id,
            name: name.to_string(),
            offset,
        });
        Ok(id)
    }

    fn angled_plane(
        &self,
        component: EntityId,
        line: EntityId,
        angle: f64,
        name: &str,
    ) -> CadResult<EntityId> {
        self.check(OperationKind::AngledPlane)?;
        let mut state = self.state.lock();
        state.expect_kind(component, EntityKind::Component)?;
        let (start, end, sketch) = state.line(line)?;
        let base = state.sketch_plane(sketch)?;
        let plane = base
            .through_line(base.to_world(start), base.to_world(end), angle)
            .ok_or_else(|| CadError::OperationFailed("degenerate line".into()))?;
        let id = state.insert(
            Some(component),
            Entity::Plane {
                name: name.to_string(),
                plane,
            },
        );
        state.log.push(SimOperation::AngledPlane {
            id,
            name: name.to_string(),
            angle,
        });
        Ok(id)
    }

    fn plane(&self, plane: PlaneRef) -> CadResult<Plane> {
        self.state.lock().plane(plane)
    }

    fn create_sketch(
        &self,
        component: EntityId,
        plane: PlaneRef,
        name: &str,
    ) -> CadResult<EntityId> {
        self.check(OperationKind::CreateSketch)?;
        let mut state = self.state.lock();
        state.expect_kind(component, EntityKind::Component)?;
        let plane = state.plane(plane)?;
        let id = state.insert(
            Some(component),
            Entity::Sketch {
                name: name.to_string(),
                plane,
                curves: Vec::new(),
            },
        );
        state.log.push(SimOperation::CreateSketch {
            id,
            name: name.to_string(),
        });
        Ok(id)
    }

    fn add_line(&self, sketch: EntityId, start: DVec2, end: DVec2) -> CadResult<EntityId> {
        self.check(OperationKind::AddCurve)?;
        self.state
            .lock()
            .add_curve(sketch, SketchCurve::Line { start, end })
    }

    fn add_rectangle(&self, sketch: EntityId, a: DVec2, b: DVec2) -> CadResult<EntityId> {
        self.check(OperationKind::AddCurve)?;
        if (a.x - b.x).abs() <= POINT_TOLERANCE || (a.y - b.y).abs() <= POINT_TOLERANCE {
            return Err(CadError::InvalidProfile("degenerate rectangle".into()));
        }
        let points = vec![a, DVec2::new(b.x, a.y), b, DVec2::new(a.x, b.y)];
        self.state
            .lock()
            .add_curve(sketch, SketchCurve::Polygon { points })
    }

    fn add_circle(&self, sketch: EntityId, center: DVec2, radius: f64) -> CadResult<EntityId> {
        self.check(OperationKind::AddCurve)?;
        if !(radius.is_finite() && radius > 0.0) {
            return Err(CadError::InvalidProfile(format!(
                "circle radius {}",
                radius
            )));
        }
        self.state
            .lock()
            .add_curve(sketch, SketchCurve::Circle { center, radius })
    }

    fn add_polygon(&self, sketch: EntityId, points: &[DVec2]) -> CadResult<EntityId> {
        self.check(OperationKind::AddCurve)?;
        if points.len() < 3 {
            return Err(CadError::InvalidProfile(format!(
                "polygon with {} points",
                points.len()
            )));
        }
        self.state.lock().add_curve(
            sketch,
            SketchCurve::Polygon {
                points: points.to_vec(),
            },
        )
    }

    fn profiles(&self, sketch: EntityId, accuracy: Accuracy) -> CadResult<Vec<ProfileInfo>> {
        let mut state = self.state.lock();
        let (plane, curve_ids) = state.sketch_contents(sketch)?;

        for child in state.children(sketch) {
            if matches!(
                state.nodes.get(&child).map(|n| &n.entity),
                Some(Entity::Profile { .. })
            ) {
                state.nodes.remove(&child);
            }
        }

        let mut loops = Vec::new();
        let mut lines = Vec::new();
        for id in &curve_ids {
            match state.nodes.get(id).map(|n| &n.entity) {
                Some(Entity::Curve {
                    curve: SketchCurve::Line { start, end },
                }) => lines.push((*start, *end)),
                Some(Entity::Curve { curve }) => loops.extend(LoopShape::from_curve(curve)),
                _ => {}
            }
        }
        let loops = split_by_diameters(loops, &lines);

        let error = match accuracy {
            Accuracy::Low => self.area_error,
            Accuracy::Medium | Accuracy::High => 0.0,
        };

        Ok(regions(&loops)
            .into_iter()
            .map(|region| {
                let area = region.area * (1.0 + error);
                let loops = 1 + region.holes.len();
                let id = state.insert(Some(sketch), Entity::Profile { region, plane });
                ProfileInfo { id, area, loops }
            })
            .collect())
    }

    fn extrude(
        &self,
        component: EntityId,
        profile: EntityId,
        extent: ExtrudeExtent,
        operation: FeatureOperation,
    ) -> CadResult<FeatureOutput> {
        self.check(OperationKind::Extrude)?;
        let mut state = self.state.lock();
        state.expect_kind(component, EntityKind::Component)?;
        let (region, plane) = state.profile(profile)?;

        let (z0, z1) = match extent {
            ExtrudeExtent::Distance(d) => (0.0, d),
            ExtrudeExtent::Symmetric(d) => (-d, d),
        };
        if !(z1 - z0).is_finite() || (z1 - z0).abs() <= POINT_TOLERANCE {
            return Err(CadError::OperationFailed(format!(
                "zero extent {:?}",
                extent
            )));
        }

        let feature = state.insert(
            Some(component),
            Entity::Feature {
                name: "Extrude".into(),
            },
        );
        let mut bodies = Vec::new();
        if operation == FeatureOperation::NewBody {
            let body = state.new_body(
                component,
                BodyShape::Prism {
                    area: region.area,
                    height: (z1 - z0).abs(),
                },
            );
            let (lo, hi) = (z0.min(z1), z0.max(z1));
            let new_edges = prism_edges(body, &plane, &region, lo, hi);
            if let Some(Node {
                entity: Entity::Body { edges, .. },
                ..
            }) = state.nodes.get_mut(&body)
            {
                *edges = new_edges;
            }
            bodies.push(body);
        }

        state.log.push(SimOperation::Extrude {
            feature,
            profile,
            extent,
            operation,
            bodies: bodies.clone(),
        });
        Ok(FeatureOutput { feature, bodies })
    }

    fn revolve(
        &self,
        component: EntityId,
        profile: EntityId,
        axis: EntityId,
        angle: f64,
    ) -> CadResult<FeatureOutput> {
        self.check(OperationKind::Revolve)?;
        let mut state = self.state.lock();
        state.expect_kind(component, EntityKind::Component)?;
        let (region, plane) = state.profile(profile)?;
        let (start, end, _) = state.line(axis)?;

        let (center, radius, side) = match (&region.outer, region.holes.is_empty()) {
            (LoopShape::Circle { center, radius }, true) => (*center, *radius, None),
            (
                LoopShape::HalfDisc {
                    center,
                    radius,
                    side,
                },
                true,
            ) => (*center, *radius, Some(*side)),
            _ => {
                return Err(CadError::InvalidProfile(
                    "only solid discs and half discs can be revolved".into(),
                ));
            }
        };
        let direction = (end - start).try_normalize().ok_or_else(|| {
            CadError::OperationFailed("revolve axis has zero length".into())
        })?;
        if side.is_some_and(|side| side.dot(direction).abs() > 1e-9) {
            return Err(CadError::OperationFailed(
                "half disc does not rest on the revolve axis".into(),
            ));
        }
        let off_axis = (center - start).perp_dot(direction).abs();
        if off_axis > POINT_TOLERANCE.max(radius * 1e-9) {
            return Err(CadError::OperationFailed(format!(
                "axis misses the disc centre by {}",
                off_axis
            )));
        }
        if (angle - TAU).abs() > 1e-9 {
            return Err(CadError::OperationFailed(format!(
                "partial revolve of {} rad",
                angle
            )));
        }

        let feature = state.insert(
            Some(component),
            Entity::Feature {
                name: "Revolve".into(),
            },
        );
        let body = state.new_body(
            component,
            BodyShape::Sphere {
                center: plane.to_world(center),
                radius,
            },
        );
        state.log.push(SimOperation::Revolve {
            feature,
            profile,
            axis,
            angle,
            bodies: vec![body],
        });
        Ok(FeatureOutput {
            feature,
            bodies: vec![body],
        })
    }

    fn chamfer(
        &self,
        component: EntityId,
        edges: &[EdgeId],
        distance: f64,
        angle: f64,
    ) -> CadResult<EntityId> {
        self.check(OperationKind::Chamfer)?;
        let mut state = self.state.lock();
        state.expect_kind(component, EntityKind::Component)?;
        check_edges(&state, edges)?;
        if !(distance > 0.0 && angle > 0.0 && angle < PI / 2.0) {
            return Err(CadError::OperationFailed(format!(
                "chamfer {} at {} rad",
                distance, angle
            )));
        }
        let feature = state.insert(
            Some(component),
            Entity::Feature {
                name: "Chamfer".into(),
            },
        );
        state.log.push(SimOperation::Chamfer {
            feature,
            edges: edges.len(),
            distance,
            angle,
        });
        Ok(feature)
    }

    fn fillet(&self, component: EntityId, edges: &[EdgeId], radius: f64) -> CadResult<EntityId> {
        self.check(OperationKind::Fillet)?;
        let mut state = self.state.lock();
        state.expect_kind(component, EntityKind::Component)?;
        check_edges(&state, edges)?;
        if radius.is_nan() || radius <= 0.0 {
            return Err(CadError::OperationFailed(format!("fillet radius {}", radius)));
        }
        let feature = state.insert(
            Some(component),
            Entity::Feature {
                name: "Fillet".into(),
            },
        );
        state.log.push(SimOperation::Fillet {
            feature,
            edges: edges.len(),
            radius,
        });
        Ok(feature)
    }

    fn set_body_name(&self, body: EntityId, name: &str) -> CadResult<()> {
        self.check(OperationKind::RenameBody)?;
        let mut state = self.state.lock();
        state.body(body)?;
        if let Some(Node {
            entity: Entity::Body { name: current, .. },
            ..
        }) = state.nodes.get_mut(&body)
        {
            *current = name.to_string();
        }
        state.log.push(SimOperation::RenameBody {
            body,
            name: name.to_string(),
        });
        Ok(())
    }

    fn body_name(&self, body: EntityId) -> CadResult<String> {
        let state = self.state.lock();
        state.body(body).map(|(name, _)| name.to_string())
    }

    fn edges(&self, body: EntityId) -> CadResult<Vec<EdgeInfo>> {
        let state = self.state.lock();
        state.body(body).map(|(_, edges)| edges.to_vec())
    }

    fn delete(&self, entity: EntityId) -> CadResult<()> {
        self.check(OperationKind::Delete)?;
        let mut state = self.state.lock();
        let kind = state.get(entity)?.entity.kind();
        state.remove_tree(entity);
        state.log.push(SimOperation::Delete { id: entity, kind });
        Ok(())
    }
}

fn check_edges(state: &SimState, edges: &[EdgeId]) -> CadResult<()> {
    if edges.is_empty() {
        return Err(CadError::OperationFailed("no edges selected".into()));
    }
    for edge in edges {
        let count = state.body(edge.body)?.1.len();
        if edge.index as usize >= count {
            return Err(CadError::OperationFailed(format!(
                "edge {} out of range for body {}",
                edge.index, edge.body
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sketch_on(kernel: &SimKernel, base: BasePlane) -> (EntityId, EntityId) {
        let component = kernel.create_component("Test").unwrap();
        let sketch = kernel
            .create_sketch(component, PlaneRef::Base(base), "Sketch")
            .unwrap();
        (component, sketch)
    }

    #[test]
    fn test_rectangle_with_holes() {
        let kernel = SimKernel::new();
        let (_, sketch) = sketch_on(&kernel, BasePlane::XZ);
        kernel
            .add_rectangle(sketch, DVec2::ZERO, DVec2::new(10.0, -4.0))
            .unwrap();
        kernel.add_circle(sketch, DVec2::new(2.0, -2.0), 1.0).unwrap();
        kernel.add_circle(sketch, DVec2::new(8.0, -2.0), 1.0).unwrap();

        let profiles = kernel.profiles(sketch, Accuracy::High).unwrap();
        assert_eq!(profiles.len(), 3);
        assert_relative_eq!(profiles[0].area, 40.0 - 2.0 * PI, max_relative = 1e-12);
        assert_relative_eq!(profiles[1].area, PI, max_relative = 1e-12);
        let loops: Vec<usize> = profiles.iter().map(|p| p.loops).collect();
        assert_eq!(loops, vec![3, 1, 1]);
    }

    #[test]
    fn test_overlapping_holes_add_back_lens() {
        let kernel = SimKernel::new();
        let (_, sketch) = sketch_on(&kernel, BasePlane::XY);
        kernel
            .add_rectangle(sketch, DVec2::ZERO, DVec2::new(10.0, 10.0))
            .unwrap();
        kernel.add_circle(sketch, DVec2::new(4.5, 5.0), 1.0).unwrap();
        kernel.add_circle(sketch, DVec2::new(5.5, 5.0), 1.0).unwrap();

        let profiles = kernel.profiles(sketch, Accuracy::High).unwrap();
        assert!(profiles[0].area > 100.0 - 2.0 * PI + 1.0);
    }

    #[test]
    fn test_lens_area_limits() {
        assert_eq!(lens_area(DVec2::ZERO, 1.0, DVec2::new(3.0, 0.0), 1.0), 0.0);
        assert_relative_eq!(lens_area(DVec2::ZERO, 2.0, DVec2::ZERO, 1.0), PI);
    }

    #[test]
    fn test_low_accuracy_error() {
        let kernel = SimKernel::new().with_area_error(0.01);
        let (_, sketch) = sketch_on(&kernel, BasePlane::XY);
        kernel.add_circle(sketch, DVec2::ZERO, 1.0).unwrap();
        let low = kernel.profiles(sketch, Accuracy::Low).unwrap();
        let high = kernel.profiles(sketch, Accuracy::High).unwrap();
        assert_relative_eq!(low[0].area, high[0].area * 1.01, max_relative = 1e-12);
    }

    #[test]
    fn test_profiles_are_regenerated() {
        let kernel = SimKernel::new();
        let (_, sketch) = sketch_on(&kernel, BasePlane::XY);
        kernel.add_circle(sketch, DVec2::ZERO, 1.0).unwrap();
        let first = kernel.profiles(sketch, Accuracy::Low).unwrap();
        let second = kernel.profiles(sketch, Accuracy::Low).unwrap();
        assert!(!kernel.contains(first[0].id));
        assert!(kernel.contains(second[0].id));
        assert_eq!(kernel.count(EntityKind::Profile), 1);
    }

    #[test]
    fn test_extrude_edges() {
        let kernel = SimKernel::new();
        let (component, sketch) = sketch_on(&kernel, BasePlane::XZ);
        kernel
            .add_rectangle(sketch, DVec2::ZERO, DVec2::new(10.0, -4.0))
            .unwrap();
        kernel.add_circle(sketch, DVec2::new(2.0, -2.0), 1.0).unwrap();
        let profile = kernel.profiles(sketch, Accuracy::Low).unwrap()[0];

        let out = kernel
            .extrude(
                component,
                profile.id,
                ExtrudeExtent::Distance(1.5),
                FeatureOperation::NewBody,
            )
            .unwrap();
        assert_eq!(out.bodies.len(), 1);

        let edges = kernel.edges(out.bodies[0]).unwrap();
        // 8 cap lines, 4 verticals, 2 circles
        assert_eq!(edges.len(), 14);
        let verticals = edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Line && (e.length - 1.5).abs() < 1e-12)
            .count();
        assert_eq!(verticals, 4);

        let plane = BasePlane::XZ.plane();
        let circles: Vec<_> = edges.iter().filter(|e| e.kind == EdgeKind::Circle).collect();
        assert!(circles[0].start.y.abs() < 1e-12);
        assert!(plane.contains(circles[0].start, 1e-9));
        assert_relative_eq!(circles[1].start.y, 1.5);
    }

    #[test]
    fn test_cut_creates_no_body() {
        let kernel = SimKernel::new();
        let (component, sketch) = sketch_on(&kernel, BasePlane::XY);
        kernel.add_circle(sketch, DVec2::ZERO, 1.0).unwrap();
        let profile = kernel.profiles(sketch, Accuracy::Low).unwrap()[0];
        let out = kernel
            .extrude(
                component,
                profile.id,
                ExtrudeExtent::Distance(-2.0),
                FeatureOperation::Cut,
            )
            .unwrap();
        assert!(out.bodies.is_empty());
        assert_eq!(kernel.count(EntityKind::Body), 0);
    }

    #[test]
    fn test_diameter_splits_disc() {
        let kernel = SimKernel::new();
        let (_, sketch) = sketch_on(&kernel, BasePlane::XY);
        kernel.add_circle(sketch, DVec2::new(1.0, 1.0), 2.0).unwrap();
        kernel
            .add_line(sketch, DVec2::new(1.0, -1.0), DVec2::new(1.0, 3.0))
            .unwrap();

        let profiles = kernel.profiles(sketch, Accuracy::High).unwrap();
        assert_eq!(profiles.len(), 2);
        for profile in &profiles {
            assert_relative_eq!(profile.area, 2.0 * PI, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_chord_off_centre_keeps_disc() {
        let kernel = SimKernel::new();
        let (_, sketch) = sketch_on(&kernel, BasePlane::XY);
        kernel.add_circle(sketch, DVec2::ZERO, 1.0).unwrap();
        kernel
            .add_line(sketch, DVec2::new(0.5, -1.0), DVec2::new(0.5, 1.0))
            .unwrap();
        // a radius only reaches one side of the disc
        kernel.add_line(sketch, DVec2::ZERO, DVec2::new(0.0, 1.0)).unwrap();

        let profiles = kernel.profiles(sketch, Accuracy::High).unwrap();
        assert_eq!(profiles.len(), 1);
        assert_relative_eq!(profiles[0].area, PI, max_relative = 1e-12);
    }

    #[test]
    fn test_half_disc_edges() {
        let kernel = SimKernel::new();
        let (component, sketch) = sketch_on(&kernel, BasePlane::XY);
        kernel.add_circle(sketch, DVec2::ZERO, 1.0).unwrap();
        kernel
            .add_line(sketch, DVec2::new(0.0, -1.0), DVec2::new(0.0, 1.0))
            .unwrap();
        let profile = kernel.profiles(sketch, Accuracy::Low).unwrap()[0];
        let out = kernel
            .extrude(
                component,
                profile.id,
                ExtrudeExtent::Distance(1.0),
                FeatureOperation::NewBody,
            )
            .unwrap();

        let edges = kernel.edges(out.bodies[0]).unwrap();
        // 2 arcs, 2 diameters, 2 verticals
        assert_eq!(edges.len(), 6);
        let arcs: Vec<_> = edges.iter().filter(|e| e.kind == EdgeKind::Arc).collect();
        assert_eq!(arcs.len(), 2);
        assert_relative_eq!(arcs[0].length, PI);
        assert!(arcs[0].end.abs_diff_eq(-arcs[0].start, 1e-12));
    }

    #[test]
    fn test_revolve_half_disc_into_sphere() {
        let kernel = SimKernel::new();
        let component = kernel.create_component("Test").unwrap();
        let plane = kernel
            .offset_plane(component, PlaneRef::Base(BasePlane::XZ), 2.0, "Balls")
            .unwrap();
        let sketch = kernel
            .create_sketch(component, PlaneRef::Construction(plane), "Ball")
            .unwrap();
        let center = DVec2::new(3.0, -1.0);
        kernel.add_circle(sketch, center, 1.5).unwrap();
        let axis = kernel
            .add_line(sketch, center - DVec2::Y * 1.5, center + DVec2::Y * 1.5)
            .unwrap();
        let profiles = kernel.profiles(sketch, Accuracy::Low).unwrap();
        assert_eq!(profiles.len(), 2);
        assert_relative_eq!(profiles[0].area, PI * 1.5 * 1.5 / 2.0, max_relative = 1e-12);

        let out = kernel.revolve(component, profiles[0].id, axis, TAU).unwrap();
        match kernel.body_shape(out.bodies[0]) {
            Some(BodyShape::Sphere { center, radius }) => {
                assert!(center.abs_diff_eq(DVec3::new(3.0, 2.0, 1.0), 1e-12));
                assert_eq!(radius, 1.5);
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_revolve_rejects_offset_axis() {
        let kernel = SimKernel::new();
        let (component, sketch) = sketch_on(&kernel, BasePlane::XY);
        kernel.add_circle(sketch, DVec2::ZERO, 1.0).unwrap();
        let axis = kernel
            .add_line(sketch, DVec2::new(0.5, -1.0), DVec2::new(0.5, 1.0))
            .unwrap();
        let profile = kernel.profiles(sketch, Accuracy::Low).unwrap()[0];
        assert!(kernel.revolve(component, profile.id, axis, TAU).is_err());
    }

    #[test]
    fn test_angled_plane_through_line() {
        let kernel = SimKernel::new();
        let (component, sketch) = sketch_on(&kernel, BasePlane::XZ);
        let line = kernel
            .add_line(sketch, DVec2::new(1.0, -2.0), DVec2::new(1.0, 0.0))
            .unwrap();
        let plane = kernel
            .angled_plane(component, line, std::f64::consts::FRAC_PI_2, "Hole")
            .unwrap();
        let geometry = kernel.plane(PlaneRef::Construction(plane)).unwrap();
        assert!(geometry.normal().abs_diff_eq(DVec3::X, 1e-12));
        assert!(geometry.origin.abs_diff_eq(DVec3::new(1.0, 0.0, 1.0), 1e-12));
    }

    #[test]
    fn test_delete_cascades() {
        let kernel = SimKernel::new();
        let (component, sketch) = sketch_on(&kernel, BasePlane::XY);
        kernel.add_circle(sketch, DVec2::ZERO, 1.0).unwrap();
        kernel.profiles(sketch, Accuracy::Low).unwrap();
        assert!(!kernel.is_empty());

        kernel.delete(component).unwrap();
        assert!(kernel.is_empty());
        assert!(matches!(
            kernel.delete(component),
            Err(CadError::EntityNotFound(_))
        ));
        assert_eq!(
            kernel.log().last().map(SimOperation::kind),
            Some(OperationKind::Delete)
        );
    }

    #[test]
    fn test_failure_injection() {
        let kernel = SimKernel::new().failing_on(OperationKind::CreateSketch);
        let component = kernel.create_component("Test").unwrap();
        assert!(matches!(
            kernel.create_sketch(component, PlaneRef::Base(BasePlane::XY), "S"),
            Err(CadError::OperationFailed(_))
        ));
    }

    #[test]
    fn test_chamfer_validates_edges() {
        let kernel = SimKernel::new();
        let (component, _) = sketch_on(&kernel, BasePlane::XY);
        assert!(kernel.chamfer(component, &[], 0.5, 0.7).is_err());
        let bogus = EdgeId::new(EntityId::new(), 0);
        assert!(matches!(
            kernel.fillet(component, &[bogus], 1.0),
            Err(CadError::EntityNotFound(_))
        ));
    }

    #[test]
    fn test_body_names() {
        let kernel = SimKernel::new();
        let (component, sketch) = sketch_on(&kernel, BasePlane::XY);
        kernel.add_circle(sketch, DVec2::ZERO, 1.0).unwrap();
        let profile = kernel.profiles(sketch, Accuracy::Low).unwrap()[0];
        let out = kernel
            .extrude(
                component,
                profile.id,
                ExtrudeExtent::Symmetric(0.5),
                FeatureOperation::NewBody,
            )
            .unwrap();
        let body = out.bodies[0];
        assert_eq!(kernel.body_name(body).unwrap(), "Body1");
        kernel.set_body_name(body, "Nut").unwrap();
        assert_eq!(kernel.names(EntityKind::Body), vec!["Nut".to_string()]);
    }

    #[test]
    fn test_log_serializes() {
        let kernel = SimKernel::new();
        kernel.create_component("Joint").unwrap();
        let json = kernel.log_json().unwrap();
        assert!(json.contains("CreateComponent"));
        assert!(json.contains("Joint"));
    }
}
