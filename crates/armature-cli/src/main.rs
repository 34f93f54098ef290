//! armature CLI - derive, check and build armature ball joints

use std::path::PathBuf;

use anyhow::{Context, Result};
use armature_cad::{CadKernel, JointBuilder, SimKernel};
use armature_core::{InputExtents, JointParameters, LengthUnit, Preset};
use clap::{Parser, Subcommand};
use serde::Serialize;

mod args;

use args::JointArgs;

#[derive(Parser)]
#[command(name = "armature")]
#[command(about = "Parametric stop-motion armature ball joints", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every derived dimension of a joint
    Derive {
        #[command(flatten)]
        joint: JointArgs,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Validate a joint, failing on the first violated rule
    Check {
        #[command(flatten)]
        joint: JointArgs,
    },
    /// Print input bounds and manipulator placement
    Extents {
        #[command(flatten)]
        joint: JointArgs,
        #[arg(long)]
        json: bool,
    },
    /// Build a joint against the in-memory kernel
    Build {
        #[command(flatten)]
        joint: JointArgs,
        #[arg(long)]
        json: bool,
        /// Also print the kernel operation log
        #[arg(long)]
        log: bool,
    },
    /// Write a preset file
    Preset {
        /// Output preset file
        output: PathBuf,
        #[command(flatten)]
        joint: JointArgs,
    },
}

fn main() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "armature_cli=info,armature_cad=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Derive { joint, json } => {
            let params = joint.resolve()?;
            print_derived(&params, joint.unit, json)?;
        }
        Commands::Check { joint } => {
            let params = joint.resolve()?;
            params
                .geometry()
                .validate()
                .with_context(|| format!("Joint '{}' is not buildable", params.name))?;
            println!("Joint '{}' is valid", params.name);
        }
        Commands::Extents { joint, json } => {
            let params = joint.resolve()?;
            print_extents(&params, joint.unit, json)?;
        }
        Commands::Build { joint, json, log } => {
            let params = joint.resolve()?;
            build(&params, json, log)?;
        }
        Commands::Preset { output, joint } => {
            let params = joint.resolve()?;
            Preset::new(joint.unit, params)
                .save(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Wrote preset to {}", output.display());
        }
    }

    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_derived(params: &JointParameters, unit: LengthUnit, json: bool) -> Result<()> {
    let derived = params.geometry().derived();
    if json {
        return print_json(&derived);
    }

    let u = unit.symbol();
    println!("Joint '{}' ({} x {})", params.name, params.rows, params.cols);
    println!("  ball radius        {:.4} {}", derived.ball_radius, u);
    println!("  ball offset        {:.4} {}", derived.ball_offset, u);
    println!("  socket radius      {:.4} {}", derived.circle_radius, u);
    println!("  socket area        {:.4} {}²", derived.circle_area, u);
    println!("  ball elevation     {:.4} {}", derived.ball_z, u);
    println!("  top plate          {:.4} {}", derived.top_plate_z, u);
    println!(
        "  chamfer            {:.4} {} at {:.1}°",
        derived.chamfer_length,
        u,
        derived.chamfer_angle.to_degrees()
    );
    println!("  plate area         {:.4} {}²", derived.expected_area, u);
    println!("  min width          {:.4} {}", derived.min_width, u);
    println!("  min length         {:.4} {}", derived.min_length, u);
    println!("  max ball diameter  {:.4} {}", derived.max_ball_diameter, u);
    for cell in &derived.cells {
        println!(
            "  cell {},{} {:<4} at ({:.4}, {:.4}) hole r {:.4}",
            cell.row, cell.col, cell.joint.label(), cell.center.x, cell.center.y, cell.hole_radius
        );
    }
    println!("  valid              {}", derived.valid);
    Ok(())
}

fn print_extents(params: &JointParameters, unit: LengthUnit, json: bool) -> Result<()> {
    let extents = InputExtents::compute(params);
    if json {
        return print_json(&extents);
    }

    let u = unit.symbol();
    println!("length            >= {:.4} {}", extents.length_min, u);
    println!("width             >= {:.4} {}", extents.width_min, u);
    println!("ball diameter     <= {:.4} {}", extents.ball_diameter_max, u);
    for (name, m) in [
        ("length", &extents.length),
        ("width", &extents.width),
        ("plate thickness", &extents.plate_thickness),
        ("ball diameter", &extents.ball_diameter),
    ] {
        println!(
            "{:<17} handle at {:?} along {:?}",
            name,
            m.origin.to_array(),
            m.direction.to_array()
        );
    }
    Ok(())
}

fn build(params: &JointParameters, json: bool, log: bool) -> Result<()> {
    let kernel = SimKernel::new();
    let report = JointBuilder::new(&kernel, params)
        .build()
        .with_context(|| format!("Failed to build joint '{}'", params.name))?;

    if json {
        print_json(&report)?;
    } else {
        println!(
            "Built '{}' with the {} kernel: {} bodies",
            report.name,
            kernel.name(),
            report.body_count()
        );
        for name in report.body_names() {
            println!("  {}", name);
        }
    }
    if log {
        println!("{}", kernel.log_json()?);
    }
    Ok(())
}
