use clap::Args;
use log::debug;
use serde_json::Value;

use underwriting_core::grading::evaluation::{self, DealInput};
use underwriting_core::metrics;
use underwriting_core::projection::ProjectionInput;

use crate::input;

/// Arguments for a full deal evaluation
#[derive(Args)]
pub struct EvaluateArgs {
    /// Path to JSON deal file (acquisition, operating, optional overrides)
    #[arg(long)]
    pub input: Option<String>,

    /// Model configuration (JSON or YAML) replacing the one in the input
    #[arg(long)]
    pub config: Option<String>,
}

/// Arguments for a projection with metrics
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to JSON projection file (acquisition, operating)
    #[arg(long)]
    pub input: Option<String>,

    /// Model configuration (JSON or YAML) replacing the one in the input
    #[arg(long)]
    pub config: Option<String>,
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut deal: DealInput = input::load(args.input.as_deref(), "deal evaluation")?;
    if let Some(ref path) = args.config {
        debug!("loading model config from {path}");
        deal.config = input::file::read_config(path)?;
    }
    let result = evaluation::evaluate_deal(&deal)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut projection: ProjectionInput = input::load(args.input.as_deref(), "cash-flow projection")?;
    if let Some(ref path) = args.config {
        debug!("loading model config from {path}");
        projection.config = input::file::read_config(path)?;
    }
    let result = metrics::calculate_metrics(&projection)?;
    Ok(serde_json::to_value(result)?)
}
