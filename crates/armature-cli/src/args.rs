//! Joint parameter arguments shared by every subcommand

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use armature_core::{CellSpec, JointParameters, JointType, LengthUnit, Preset, controller};
use clap::Args;

#[derive(Args, Debug, Default)]
pub struct JointArgs {
    /// Preset file to start from instead of the defaults
    #[arg(short, long)]
    pub preset: Option<PathBuf>,

    /// Unit of every length on the command line and in the output
    ///
    /// The 0.05 socket clearance is applied in this unit, so cm gives ten
    /// times the physical clearance of mm.
    #[arg(short, long, default_value = "mm")]
    pub unit: LengthUnit,

    /// Component name
    #[arg(long)]
    pub name: Option<String>,

    #[arg(short, long)]
    pub length: Option<f64>,

    #[arg(short, long)]
    pub width: Option<f64>,

    #[arg(short, long)]
    pub thickness: Option<f64>,

    #[arg(short = 'd', long)]
    pub ball_diameter: Option<f64>,

    #[arg(long)]
    pub rows: Option<u32>,

    #[arg(long)]
    pub cols: Option<u32>,

    #[arg(long)]
    pub bolt_hole_diameter: Option<f64>,

    /// Whether the plates get a centre bolt hole
    #[arg(long)]
    pub center_bolt_hole: Option<bool>,

    /// Screw hole diameter for cells without their own
    #[arg(long)]
    pub hole_diameter: Option<f64>,

    /// Cell override as ROW,COL=TYPE[:HOLE], e.g. 2,1=nut or 1,2=ball:2.5
    #[arg(long = "cell", value_name = "SPEC")]
    pub cells: Vec<String>,

    /// Raise the width to its minimum the way the command dialog does
    #[arg(long)]
    pub fit: bool,
}

impl JointArgs {
    /// Parameters from the preset or defaults with every override applied
    pub fn resolve(&self) -> Result<JointParameters> {
        let mut params = match &self.preset {
            Some(path) => Preset::load(path)
                .with_context(|| format!("Failed to load preset {}", path.display()))?
                .parameters_in(self.unit),
            None => JointParameters::defaults(self.unit),
        };

        if let Some(name) = &self.name {
            params.name = name.clone();
        }
        let lengths = [
            (self.length, &mut params.length),
            (self.width, &mut params.width),
            (self.thickness, &mut params.plate_thickness),
            (self.ball_diameter, &mut params.ball_diameter),
            (self.bolt_hole_diameter, &mut params.bolt_hole_diameter),
        ];
        for (value, field) in lengths {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(center) = self.center_bolt_hole {
            params.center_bolt_hole = center;
        }
        if let Some(hole) = self.hole_diameter {
            params.hole_diameter = hole;
            for (row, col) in params.positions() {
                if let Some(cell) = params.cells.get_mut(row, col) {
                    cell.hole_diameter = hole;
                }
            }
        }
        if self.rows.is_some() || self.cols.is_some() {
            let rows = self.rows.unwrap_or(params.rows);
            let cols = self.cols.unwrap_or(params.cols);
            params.set_grid(rows, cols);
        }

        for spec in &self.cells {
            let (row, col, cell) = parse_cell(spec, params.hole_diameter)?;
            params
                .cells
                .set(row, col, cell)
                .with_context(|| format!("Invalid cell '{}'", spec))?;
        }

        if self.fit {
            if let (_, Some(adjustment)) = controller::apply(&mut params) {
                tracing::info!("Adjusted: {:?}", adjustment);
            }
        }
        Ok(params)
    }
}

/// Parse `ROW,COL=TYPE[:HOLE]`
pub fn parse_cell(spec: &str, default_hole: f64) -> Result<(u32, u32, CellSpec)> {
    let Some((position, value)) = spec.split_once('=') else {
        bail!("Cell '{}' is not ROW,COL=TYPE[:HOLE]", spec);
    };
    let Some((row, col)) = position.split_once(',') else {
        bail!("Cell position '{}' is not ROW,COL", position);
    };
    let row: u32 = row.trim().parse().context("Invalid cell row")?;
    let col: u32 = col.trim().parse().context("Invalid cell column")?;

    let (joint, hole) = match value.split_once(':') {
        Some((joint, hole)) => (joint, hole.trim().parse().context("Invalid hole diameter")?),
        None => (value, default_hole),
    };
    let joint: JointType = joint.parse().map_err(anyhow::Error::msg)?;
    Ok((
        row,
        col,
        CellSpec {
            joint,
            hole_diameter: hole,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell() {
        let (row, col, cell) = parse_cell("2,1=nut", 3.0).unwrap();
        assert_eq!((row, col), (2, 1));
        assert_eq!(cell, CellSpec::nut(3.0));

        let (_, _, cell) = parse_cell("1,2=Ball:2.5", 3.0).unwrap();
        assert_eq!(cell, CellSpec::ball(2.5));
    }

    #[test]
    fn test_parse_cell_rejects_garbage() {
        assert!(parse_cell("2,1", 3.0).is_err());
        assert!(parse_cell("2=nut", 3.0).is_err());
        assert!(parse_cell("2,1=bolt", 3.0).is_err());
    }

    #[test]
    fn test_overrides() {
        let args = JointArgs {
            length: Some(20.0),
            rows: Some(3),
            cells: vec!["3,1=none".into()],
            ..Default::default()
        };
        let params = args.resolve().unwrap();
        assert_eq!(params.length, 20.0);
        assert_eq!(params.cells.rows(), 3);
        assert_eq!(params.joint_type(3, 1), JointType::None);
    }

    #[test]
    fn test_fit_raises_width() {
        let args = JointArgs {
            fit: true,
            ..Default::default()
        };
        let params = args.resolve().unwrap();
        assert!(params.geometry().is_valid());
    }

    #[test]
    fn test_cell_outside_grid() {
        let args = JointArgs {
            cells: vec!["5,1=nut".into()],
            ..Default::default()
        };
        assert!(args.resolve().is_err());
    }
}
