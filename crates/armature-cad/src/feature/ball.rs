//! Balls and their screw holes

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use armature_core::JointType;
use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::{BuildContext, FeatureError, FeatureResult};
use crate::kernel::{BasePlane, EntityId, ExtrudeExtent, FeatureOperation, PlaneRef};

pub const BALL_PLANE_NAME: &str = "Joint Balls";
pub const BALL_SKETCH_NAME: &str = "Ball Circles";
pub const SCREW_HOLE_NAME: &str = "Ball Screw Hole";

/// A ball body and the cell it sits in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedBall {
    pub row: u32,
    pub col: u32,
    pub body: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BallOutput {
    /// Plane through the ball centres, absent when no cell holds a ball
    pub plane: Option<EntityId>,
    pub balls: Vec<PlacedBall>,
    /// Number of screw holes cut
    pub screw_holes: usize,
}

/// Revolve one ball per ball cell and cut its screw hole
pub fn create_balls(ctx: &mut BuildContext<'_>) -> FeatureResult<BallOutput> {
    let geometry = ctx.geometry();
    let params = ctx.params;

    let cells: Vec<(u32, u32)> = params
        .positions()
        .filter(|&(row, col)| params.joint_type(row, col) == JointType::Ball)
        .collect();
    if cells.is_empty() {
        tracing::debug!("No ball cells, skipping balls");
        return Ok(BallOutput::default());
    }

    let r = geometry.ball_radius();
    let plane = ctx.offset_plane(
        PlaneRef::Base(BasePlane::XZ),
        geometry.ball_z(),
        BALL_PLANE_NAME,
    )?;

    let mut output = BallOutput {
        plane: Some(plane),
        ..Default::default()
    };

    for (row, col) in cells {
        let center = geometry.cell_center(row, col);
        let sketch = ctx.sketch(PlaneRef::Construction(plane), BALL_SKETCH_NAME)?;
        ctx.circle(sketch, center, r)?;
        let axis = ctx.kernel.add_line(
            sketch,
            center - DVec2::new(0.0, r),
            center + DVec2::new(0.0, r),
        )?;

        // the axis splits the disc, either half revolves into the ball
        let profile = ctx.profile_by_area(sketch, BALL_SKETCH_NAME, PI * r * r / 2.0)?;
        let revolved = ctx.revolve(profile.id, axis, TAU)?;
        if revolved.bodies.is_empty() {
            return Err(FeatureError::EmptyResult(format!("ball {},{} revolve", row, col)));
        }
        for (i, body) in revolved.bodies.iter().enumerate() {
            let name = format!("Ball_{}_{}_{}", row, col, i);
            ctx.kernel.set_body_name(*body, &name)?;
            output.balls.push(PlacedBall {
                row,
                col,
                body: *body,
                name,
            });
        }

        let hole = geometry.hole_radius(row, col);
        if hole > 0.0 {
            let hole_plane = ctx.angled_plane(axis, FRAC_PI_2, SCREW_HOLE_NAME)?;
            let hole_sketch = ctx.sketch(PlaneRef::Construction(hole_plane), SCREW_HOLE_NAME)?;
            ctx.circle(hole_sketch, DVec2::ZERO, hole)?;
            let profile = ctx.profile_by_area(hole_sketch, SCREW_HOLE_NAME, PI * hole * hole)?;
            // towards the outer end of the plate
            let depth = if col % 2 == 1 { -r } else { r };
            ctx.extrude(profile.id, ExtrudeExtent::Distance(depth), FeatureOperation::Cut)?;
            output.screw_holes += 1;
        }
    }

    tracing::debug!(
        "Built {} balls with {} screw holes",
        output.balls.len(),
        output.screw_holes
    );
    Ok(output)
}
