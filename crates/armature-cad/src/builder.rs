//! Joint builder
//!
//! Turns a set of [`JointParameters`] into kernel geometry: one component
//! holding the bottom and top plates, the balls and the nuts. A build either
//! completes or leaves the kernel as it found it.

use armature_core::JointParameters;
use serde::{Deserialize, Serialize};

use crate::feature::{
    BallOutput, BuildContext, Feature, FeatureResult, NutOutput, PlateOutput, ball, nut, plate,
};
use crate::history::ConstructionHistory;
use crate::kernel::{BasePlane, CadKernel, EntityId, PlaneRef};

pub const TOP_PLANE_NAME: &str = "Joint Top Offset";

/// Everything a successful build created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub component: EntityId,
    pub name: String,
    pub bottom_plate: PlateOutput,
    pub top_plate: PlateOutput,
    pub balls: BallOutput,
    pub nuts: NutOutput,
    pub history: ConstructionHistory,
}

impl BuildReport {
    /// Names of every body, plates first
    pub fn body_names(&self) -> Vec<String> {
        let plates = [plate::PLATE_BODY_NAME, plate::PLATE_BODY_NAME].map(str::to_string);
        plates
            .into_iter()
            .chain(self.balls.balls.iter().map(|b| b.name.clone()))
            .chain(self.nuts.nuts.iter().map(|n| n.name.clone()))
            .collect()
    }

    pub fn body_count(&self) -> usize {
        2 + self.balls.balls.len() + self.nuts.nuts.len()
    }
}

/// Builds one joint against a kernel
pub struct JointBuilder<'a> {
    kernel: &'a dyn CadKernel,
    params: &'a JointParameters,
}

impl<'a> JointBuilder<'a> {
    pub fn new(kernel: &'a dyn CadKernel, params: &'a JointParameters) -> Self {
        Self { kernel, params }
    }

    /// Validate the parameters and build the joint
    ///
    /// Invalid parameters fail before the kernel is touched. Any later
    /// failure deletes everything the build created.
    pub fn build(&self) -> FeatureResult<BuildReport> {
        self.params.geometry().validate()?;
        tracing::info!(
            "Building joint '{}' ({}x{}) with the {} kernel",
            self.params.name,
            self.params.rows,
            self.params.cols,
            self.kernel.name()
        );

        let component = self.kernel.create_component(&self.params.name)?;
        let mut history = ConstructionHistory::new();
        history.add_feature(Feature::Component {
            id: component,
            name: self.params.name.clone(),
        });
        let mut ctx = BuildContext::new(self.kernel, self.params, component, history);

        match build_parts(&mut ctx) {
            Ok((bottom_plate, top_plate, balls, nuts)) => {
                tracing::info!(
                    "Built joint '{}': {} balls, {} nuts, {} history entries",
                    self.params.name,
                    balls.balls.len(),
                    nuts.nuts.len(),
                    ctx.history.len()
                );
                Ok(BuildReport {
                    component,
                    name: self.params.name.clone(),
                    bottom_plate,
                    top_plate,
                    balls,
                    nuts,
                    history: ctx.history,
                })
            }
            Err(e) => {
                tracing::warn!("Failed to build joint '{}': {}", self.params.name, e);
                ctx.history.rollback(self.kernel);
                Err(e)
            }
        }
    }
}

fn build_parts(
    ctx: &mut BuildContext<'_>,
) -> FeatureResult<(PlateOutput, PlateOutput, BallOutput, NutOutput)> {
    let geometry = ctx.geometry();
    let top_plane = ctx.offset_plane(
        PlaneRef::Base(BasePlane::XZ),
        geometry.top_plate_z(),
        TOP_PLANE_NAME,
    )?;

    let bottom = plate::create_plate(ctx, PlaneRef::Base(BasePlane::XZ), false)?;
    let top = plate::create_plate(ctx, PlaneRef::Construction(top_plane), true)?;
    let balls = ball::create_balls(ctx)?;
    let nuts = nut::create_nuts(ctx)?;
    Ok((bottom, top, balls, nuts))
}
