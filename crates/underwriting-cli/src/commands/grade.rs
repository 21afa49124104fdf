use clap::Args;
use serde_json::Value;

use underwriting_core::grading::scorecard::{self, GradeInput};

use crate::input;

/// Arguments for grading a metrics set
#[derive(Args)]
pub struct GradeArgs {
    /// Path to JSON input file (metrics, optional classification and benchmark)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_grade(args: GradeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let grade_input: GradeInput = input::load(args.input.as_deref(), "deal grading")?;
    let result = scorecard::grade_metrics(&grade_input)?;
    Ok(serde_json::to_value(result)?)
}
