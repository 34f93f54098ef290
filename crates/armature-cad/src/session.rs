//! Command session
//!
//! One run of the create-joint command: the input widgets, the parameters
//! read back from them, the bounds pushed to the widgets, and the preview
//! component shown while the user edits.

use std::sync::Arc;

use armature_core::controller::{self, Adjustment, InputExtents};
use armature_core::inputs::{
    BALL_DIAMETER_INPUT_ID, BOLT_HOLE_DIAMETER_INPUT_ID, CENTER_BOLT_HOLE_INPUT_ID,
    COLS_INPUT_ID, LENGTH_INPUT_ID, NAME_INPUT_ID, PLATE_THICKNESS_INPUT_ID, ROWS_INPUT_ID,
    WIDTH_INPUT_ID, cell_hole_input_id, cell_type_input_id,
};
use armature_core::{CellSpec, InputMap, InputValue, JointParameters, LengthUnit};
use serde::{Deserialize, Serialize};

use crate::builder::{BuildReport, JointBuilder};
use crate::feature::FeatureResult;
use crate::kernel::{CadError, CadKernel, EntityId};

pub const COMMAND_ID: &str = "createArmatureJoint";

/// An edit made to one input widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputChange {
    Name(String),
    Length(f64),
    Width(f64),
    PlateThickness(f64),
    BallDiameter(f64),
    Rows(u32),
    Cols(u32),
    BoltHoleDiameter(f64),
    CenterBoltHole(bool),
    Cell { row: u32, col: u32, spec: CellSpec },
}

impl InputChange {
    /// Write the new value into its widget(s)
    pub fn apply(&self, inputs: &mut InputMap) {
        match self {
            InputChange::Name(name) => inputs.set(NAME_INPUT_ID, InputValue::Text(name.clone())),
            InputChange::Length(v) => inputs.set(LENGTH_INPUT_ID, InputValue::Real(*v)),
            InputChange::Width(v) => inputs.set(WIDTH_INPUT_ID, InputValue::Real(*v)),
            InputChange::PlateThickness(v) => {
                inputs.set(PLATE_THICKNESS_INPUT_ID, InputValue::Real(*v))
            }
            InputChange::BallDiameter(v) => inputs.set(BALL_DIAMETER_INPUT_ID, InputValue::Real(*v)),
            InputChange::Rows(v) => inputs.set(ROWS_INPUT_ID, InputValue::Integer(*v as i64)),
            InputChange::Cols(v) => inputs.set(COLS_INPUT_ID, InputValue::Integer(*v as i64)),
            InputChange::BoltHoleDiameter(v) => {
                inputs.set(BOLT_HOLE_DIAMETER_INPUT_ID, InputValue::Real(*v))
            }
            InputChange::CenterBoltHole(v) => {
                inputs.set(CENTER_BOLT_HOLE_INPUT_ID, InputValue::Bool(*v))
            }
            InputChange::Cell { row, col, spec } => {
                inputs.set(
                    cell_type_input_id(*row, *col),
                    InputValue::Text(spec.joint.label().to_string()),
                );
                inputs.set(
                    cell_hole_input_id(*row, *col),
                    InputValue::Real(spec.hole_diameter),
                );
            }
        }
    }
}

/// State of one create-joint command
pub struct CommandSession {
    kernel: Arc<dyn CadKernel>,
    unit: LengthUnit,
    inputs: InputMap,
    params: JointParameters,
    extents: InputExtents,
    preview: Option<EntityId>,
}

impl CommandSession {
    /// Start a session seeded with the default parameters in `unit`
    pub fn new(kernel: Arc<dyn CadKernel>, unit: LengthUnit) -> Self {
        Self::with_parameters(kernel, unit, JointParameters::defaults(unit))
    }

    /// Start a session from existing parameters, such as a loaded preset
    pub fn with_parameters(
        kernel: Arc<dyn CadKernel>,
        unit: LengthUnit,
        mut params: JointParameters,
    ) -> Self {
        let (extents, adjustment) = controller::apply(&mut params);
        if let Some(adjustment) = adjustment {
            tracing::debug!("Initial parameters adjusted: {:?}", adjustment);
        }
        Self {
            kernel,
            unit,
            inputs: InputMap::from_parameters(&params),
            params,
            extents,
            preview: None,
        }
    }

    pub fn unit(&self) -> LengthUnit {
        self.unit
    }

    pub fn params(&self) -> &JointParameters {
        &self.params
    }

    pub fn inputs(&self) -> &InputMap {
        &self.inputs
    }

    pub fn extents(&self) -> &InputExtents {
        &self.extents
    }

    /// Component currently shown as the preview
    pub fn preview_component(&self) -> Option<EntityId> {
        self.preview
    }

    /// React to an edited widget
    ///
    /// Re-reads every parameter from the widgets and recomputes the bounds.
    /// Returns the adjustment made when a value fell outside its bounds.
    pub fn input_changed(&mut self, change: InputChange) -> FeatureResult<Option<Adjustment>> {
        change.apply(&mut self.inputs);
        let mut params = JointParameters::read(&self.inputs, &self.params)?;
        let (extents, adjustment) = controller::apply(&mut params);
        if let Some(Adjustment::WidthRaised { from, to }) = adjustment {
            tracing::info!("Width raised from {} to {}", from, to);
        }

        // resized grids and clamped values flow back into the widgets
        self.inputs = InputMap::from_parameters(&params);
        self.params = params;
        self.extents = extents;
        Ok(adjustment)
    }

    /// Rebuild the preview component, replacing the previous one
    pub fn preview(&mut self) -> FeatureResult<BuildReport> {
        self.clear_preview();
        let report = JointBuilder::new(self.kernel.as_ref(), &self.params).build()?;
        self.preview = Some(report.component);
        Ok(report)
    }

    /// Build the final joint
    pub fn execute(&mut self) -> FeatureResult<BuildReport> {
        self.clear_preview();
        let report = JointBuilder::new(self.kernel.as_ref(), &self.params).build()?;
        tracing::info!("{} created '{}'", COMMAND_ID, report.name);
        Ok(report)
    }

    /// Abandon the command, removing any preview
    pub fn cancel(&mut self) {
        self.clear_preview();
    }

    fn clear_preview(&mut self) {
        if let Some(component) = self.preview.take() {
            match self.kernel.delete(component) {
                Ok(()) | Err(CadError::EntityNotFound(_)) => {}
                Err(e) => tracing::warn!("Failed to remove preview {}: {}", component, e),
            }
        }
    }
}
