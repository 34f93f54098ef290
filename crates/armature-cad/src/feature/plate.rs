//! Socket plates
//!
//! A plate is the rectangular slab with one socket circle per ball cell and
//! an optional centre bolt hole. The socket rims facing the balls are
//! chamfered and the vertical corners rounded.

use armature_core::JointType;
use armature_core::matching;
use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::{BuildContext, FeatureError, FeatureResult};
use crate::kernel::{EdgeId, EntityId, ExtrudeExtent, FeatureOperation, PlaneRef};

pub const PLATE_SKETCH_NAME: &str = "Joint Plate";
pub const PLATE_BODY_NAME: &str = "Plate";

/// Distance under which an edge point counts as lying on the sketch plane
const ON_PLANE_TOLERANCE: f64 = 1e-6;

/// What one plate produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateOutput {
    pub sketch: EntityId,
    pub body: EntityId,
    /// Socket rim edges that were chamfered
    pub chamfered_edges: usize,
    /// Corner edges that were rounded
    pub filleted_edges: usize,
}

/// Build one plate on `plane`
///
/// `top` selects which socket rims get the chamfer: the rims lying on the
/// sketch plane for the top plate, the opposite face for the bottom plate.
pub fn create_plate(
    ctx: &mut BuildContext<'_>,
    plane: PlaneRef,
    top: bool,
) -> FeatureResult<PlateOutput> {
    let geometry = ctx.geometry();
    let params = ctx.params;

    let sketch = ctx.sketch(plane, PLATE_SKETCH_NAME)?;
    ctx.kernel.add_rectangle(
        sketch,
        DVec2::ZERO,
        DVec2::new(params.length, -params.width),
    )?;
    if params.center_bolt_hole {
        ctx.circle(
            sketch,
            geometry.center_bolt_position(),
            geometry.bolt_hole_radius(),
        )?;
    }
    for (row, col) in params.positions() {
        if params.joint_type(row, col) == JointType::Ball {
            ctx.circle(sketch, geometry.cell_center(row, col), geometry.circle_radius())?;
        }
    }

    let profile = ctx.profile_by_area(sketch, PLATE_SKETCH_NAME, geometry.expected_area())?;
    let out = ctx.extrude(
        profile.id,
        ExtrudeExtent::Distance(params.plate_thickness),
        FeatureOperation::NewBody,
    )?;
    let body = match out.bodies.as_slice() {
        [body] => *body,
        bodies => {
            return Err(FeatureError::UnexpectedBodyCount {
                feature: "plate extrusion".into(),
                expected: 1,
                actual: bodies.len(),
            });
        }
    };
    ctx.kernel.set_body_name(body, PLATE_BODY_NAME)?;

    let sketch_plane = ctx.kernel.plane(plane)?;
    let edges = ctx.kernel.edges(body)?;

    let rims: Vec<EdgeId> = matching::select_all(&edges, geometry.circle_circumference(), |e| {
        e.length
    })
    .into_iter()
    .filter(|e| sketch_plane.contains(e.start, ON_PLANE_TOLERANCE) == top)
    .map(|e| e.id)
    .collect();
    if rims.is_empty() {
        tracing::debug!("No socket rims to chamfer on {} plate", side(top));
    } else {
        ctx.chamfer(&rims, geometry.chamfer_length(), geometry.chamfer_angle())?;
    }

    let corners: Vec<EdgeId> = matching::select_all(&edges, params.plate_thickness, |e| e.length)
        .into_iter()
        .map(|e| e.id)
        .collect();
    if !corners.is_empty() {
        ctx.fillet(&corners, geometry.ball_radius())?;
    }

    tracing::debug!(
        "Built {} plate: {} rims chamfered, {} corners filleted",
        side(top),
        rims.len(),
        corners.len()
    );

    Ok(PlateOutput {
        sketch,
        body,
        chamfered_edges: rims.len(),
        filleted_edges: corners.len(),
    })
}

fn side(top: bool) -> &'static str {
    if top { "top" } else { "bottom" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;
    use crate::feature::testing::{context, valid_params};
    use crate::kernel::{BasePlane, BodyShape, CadKernel, EntityKind, SimKernel};
    use approx::assert_relative_eq;

    #[test]
    fn test_bottom_plate() {
        let kernel = SimKernel::new();
        let params = valid_params();
        let mut ctx = context(&kernel, &params);

        let out = create_plate(&mut ctx, PlaneRef::Base(BasePlane::XZ), false).unwrap();
        assert_eq!(kernel.body_name(out.body).unwrap(), "Plate");
        // two sockets, one rim each on the face away from the sketch plane
        assert_eq!(out.chamfered_edges, 2);
        assert_eq!(out.filleted_edges, 4);

        match kernel.body_shape(out.body) {
            Some(BodyShape::Prism { area, height }) => {
                assert_relative_eq!(area, params.geometry().expected_area(), max_relative = 1e-9);
                assert_relative_eq!(height, params.plate_thickness);
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_top_plate_chamfers_sketch_face() {
        let kernel = SimKernel::new();
        let params = valid_params();
        let mut ctx = context(&kernel, &params);
        let z = params.geometry().top_plate_z();
        let plane = ctx
            .offset_plane(PlaneRef::Base(BasePlane::XZ), z, "Joint Top Offset")
            .unwrap();

        let out = create_plate(&mut ctx, PlaneRef::Construction(plane), true).unwrap();
        assert_eq!(out.chamfered_edges, 2);

        let plane = kernel.plane(PlaneRef::Construction(plane)).unwrap();
        let circumference = params.geometry().circle_circumference();
        let on_plane = kernel
            .edges(out.body)
            .unwrap()
            .into_iter()
            .filter(|e| (e.length - circumference).abs() < 1e-9)
            .filter(|e| plane.contains(e.start, 1e-6))
            .count();
        assert_eq!(on_plane, 2);
    }

    #[test]
    fn test_plate_without_balls_skips_chamfer() {
        let kernel = SimKernel::new();
        let mut params = valid_params();
        params.fill(JointType::None);
        params.center_bolt_hole = false;
        let mut ctx = context(&kernel, &params);

        let out = create_plate(&mut ctx, PlaneRef::Base(BasePlane::XZ), false).unwrap();
        assert_eq!(out.chamfered_edges, 0);
        assert_eq!(kernel.count(EntityKind::Body), 1);
        assert!(!ctx.history.features().any(|f| matches!(f, Feature::Chamfer { .. })));
    }

    #[test]
    fn test_area_mismatch_is_reported() {
        let kernel = SimKernel::new().with_area_error(0.01);
        let params = valid_params();
        let mut ctx = context(&kernel, &params);

        let err = create_plate(&mut ctx, PlaneRef::Base(BasePlane::XZ), false).unwrap_err();
        assert!(matches!(err, FeatureError::ProfileNotFound { .. }));
        assert_eq!(kernel.count(EntityKind::Body), 0);
    }

    #[test]
    fn test_sketch_is_recorded() {
        let kernel = SimKernel::new();
        let params = valid_params();
        let mut ctx = context(&kernel, &params);
        create_plate(&mut ctx, PlaneRef::Base(BasePlane::XZ), false).unwrap();

        let names: Vec<&str> = ctx.history.features().map(Feature::name).collect();
        assert_eq!(names, vec!["Joint", "Joint Plate", "Extrude", "Chamfer", "Fillet"]);
        assert_eq!(ctx.history.bodies().len(), 1);
    }
}
