//! Hexagonal nuts
//!
//! Nuts are sketched per column on a plane across the plate, at the column's
//! ball position. Each nut is a hexagon around a bolt circle, extruded the
//! same distance on both sides of the plane.

use armature_core::JointType;
use serde::{Deserialize, Serialize};

use super::{BuildContext, FeatureError, FeatureResult};
use crate::kernel::{
    Accuracy, BasePlane, EntityId, ExtrudeExtent, FeatureOperation, PlaneRef, ProfileInfo,
};

/// A nut body and the cell it sits in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedNut {
    pub row: u32,
    pub col: u32,
    pub body: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutOutput {
    pub nuts: Vec<PlacedNut>,
    /// Columns whose plane and sketch were removed for lack of nuts
    pub empty_columns: Vec<u32>,
}

pub fn plane_name(col: u32) -> String {
    format!("Joint Nuts {}", col)
}

pub fn sketch_name(col: u32) -> String {
    format!("Joint Nuts Sketch{}", col)
}

/// Build the nuts of every column
pub fn create_nuts(ctx: &mut BuildContext<'_>) -> FeatureResult<NutOutput> {
    let mut output = NutOutput::default();
    for col in 1..=ctx.params.cols {
        create_column(ctx, col, &mut output)?;
    }
    tracing::debug!(
        "Built {} nuts, {} columns without nuts",
        output.nuts.len(),
        output.empty_columns.len()
    );
    Ok(output)
}

fn create_column(ctx: &mut BuildContext<'_>, col: u32, output: &mut NutOutput) -> FeatureResult<()> {
    let geometry = ctx.geometry();
    let params = ctx.params;
    let mark = ctx.history.len();

    let plane = ctx.offset_plane(
        PlaneRef::Base(BasePlane::YZ),
        geometry.ball_x(col),
        &plane_name(col),
    )?;
    let name = sketch_name(col);
    let sketch = ctx.sketch(PlaneRef::Construction(plane), &name)?;

    let rows: Vec<u32> = (1..=params.rows)
        .filter(|&row| params.joint_type(row, col) == JointType::Nut)
        .collect();
    for &row in &rows {
        ctx.kernel.add_polygon(sketch, &geometry.nut_hexagon(row))?;
        ctx.circle(sketch, geometry.nut_center(row), geometry.bolt_hole_radius())?;
    }

    if rows.is_empty() {
        ctx.history.rollback_to(mark, ctx.kernel);
        output.empty_columns.push(col);
        return Ok(());
    }

    // the bolt circles are profiles too, a nut is the one holding a bolt hole
    let nuts: Vec<ProfileInfo> = armature_core::matching::select_all(
        ctx.kernel
            .profiles(sketch, Accuracy::Low)?
            .into_iter()
            .filter(|p| p.loops > 1),
        geometry.nut_profile_area(),
        |p: &ProfileInfo| p.area,
    );
    if nuts.len() != rows.len() {
        return Err(FeatureError::UnexpectedProfileCount {
            sketch: name,
            expected: rows.len(),
            actual: nuts.len(),
        });
    }

    for (row, profile) in rows.into_iter().zip(nuts) {
        let out = ctx.extrude(
            profile.id,
            ExtrudeExtent::Symmetric(geometry.nut_extent()),
            FeatureOperation::NewBody,
        )?;
        let name = format!("Nut_{}_{}", row, col);
        for body in out.bodies {
            ctx.kernel.set_body_name(body, &name)?;
            output.nuts.push(PlacedNut {
                row,
                col,
                body,
                name: name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::testing::{context, valid_params};
    use crate::kernel::{BodyShape, CadKernel, EntityKind, SimKernel};
    use armature_core::CellSpec;
    use approx::assert_relative_eq;

    #[test]
    fn test_columns_without_nuts_leave_nothing() {
        let kernel = SimKernel::new();
        let params = valid_params();
        let mut ctx = context(&kernel, &params);

        let out = create_nuts(&mut ctx).unwrap();
        assert!(out.nuts.is_empty());
        assert_eq!(out.empty_columns, vec![1]);
        assert_eq!(kernel.count(EntityKind::Plane), 0);
        assert_eq!(kernel.count(EntityKind::Sketch), 0);
        assert_eq!(ctx.history.len(), 1);
    }

    #[test]
    fn test_nut_cells() {
        let kernel = SimKernel::new();
        let mut params = valid_params().with_grid(2, 2);
        params.length = params.geometry().min_length().max(params.length);
        params.cells.set(2, 1, CellSpec::nut(0.0)).unwrap();
        params.cells.set(1, 2, CellSpec::nut(0.0)).unwrap();
        let mut ctx = context(&kernel, &params);

        let out = create_nuts(&mut ctx).unwrap();
        let names: Vec<&str> = out.nuts.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Nut_2_1", "Nut_1_2"]);
        assert!(out.empty_columns.is_empty());
        assert_eq!(
            kernel.names(EntityKind::Plane),
            vec!["Joint Nuts 1".to_string(), "Joint Nuts 2".to_string()]
        );

        let g = params.geometry();
        match kernel.body_shape(out.nuts[0].body) {
            Some(BodyShape::Prism { height, .. }) => {
                assert_relative_eq!(height, 2.0 * g.nut_extent());
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_nut_plane_position() {
        let kernel = SimKernel::new();
        let mut params = valid_params();
        params.fill(JointType::Nut);
        let mut ctx = context(&kernel, &params);
        create_nuts(&mut ctx).unwrap();

        let plane = ctx
            .history
            .features()
            .find(|f| f.name() == "Joint Nuts 1")
            .map(|f| f.id())
            .unwrap();
        let geometry = kernel.plane(PlaneRef::Construction(plane)).unwrap();
        assert_relative_eq!(geometry.origin.x, params.geometry().ball_x(1));
        assert_eq!(kernel.count(EntityKind::Body), 2);
    }

    #[test]
    fn test_bolt_circle_as_large_as_nut_profile() {
        let kernel = SimKernel::new();
        let mut params = valid_params();
        params.fill(JointType::Nut);
        let a = params.geometry().ball_offset();
        // hexagon minus bolt hole has the same area as the bolt hole
        params.bolt_hole_diameter = 2.0 * a * (3f64.sqrt() / std::f64::consts::PI).sqrt();
        let g = params.geometry();
        assert_relative_eq!(g.nut_profile_area(), g.bolt_circle_area(), max_relative = 1e-9);
        assert!(g.validate().is_ok());
        let mut ctx = context(&kernel, &params);

        let out = create_nuts(&mut ctx).unwrap();
        let names: Vec<&str> = out.nuts.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Nut_1_1", "Nut_2_1"]);
        for nut in &out.nuts {
            match kernel.body_shape(nut.body) {
                Some(BodyShape::Prism { area, .. }) => {
                    assert_relative_eq!(area, g.nut_profile_area(), max_relative = 1e-9)
                }
                other => panic!("unexpected shape {:?}", other),
            }
        }
    }

    #[test]
    fn test_profile_count_mismatch() {
        // every profile reads 1% large, so no nut profile matches
        let kernel = SimKernel::new().with_area_error(0.01);
        let mut params = valid_params();
        params.fill(JointType::Nut);
        let mut ctx = context(&kernel, &params);

        let err = create_nuts(&mut ctx).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::UnexpectedProfileCount {
                expected: 2,
                actual: 0,
                ..
            }
        ));
    }
}
