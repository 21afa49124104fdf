use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use underwriting_core::grading::classification::{self, PropertyCharacteristics};

use crate::input;

/// Arguments for property classification
#[derive(Args)]
pub struct ClassifyArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price
    #[arg(long)]
    pub purchase_price: Option<Decimal>,

    /// Number of units
    #[arg(long, alias = "units")]
    pub unit_count: Option<u32>,

    /// Average monthly rent per unit
    #[arg(long, alias = "rent")]
    pub avg_monthly_rent_per_unit: Option<Decimal>,

    /// Year-1 cap rate (%)
    #[arg(long)]
    pub cap_rate: Option<Decimal>,

    /// Year-1 expense ratio (%)
    #[arg(long)]
    pub expense_ratio: Option<Decimal>,
}

pub fn run_classify(args: ClassifyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let chars: PropertyCharacteristics = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(parsed) = input::stdin::read_stdin()? {
        parsed
    } else {
        PropertyCharacteristics {
            purchase_price: args
                .purchase_price
                .ok_or("--purchase-price is required (or provide --input)")?,
            unit_count: args
                .unit_count
                .ok_or("--unit-count is required (or provide --input)")?,
            avg_monthly_rent_per_unit: args
                .avg_monthly_rent_per_unit
                .ok_or("--avg-monthly-rent-per-unit is required (or provide --input)")?,
            cap_rate: args.cap_rate,
            expense_ratio: args.expense_ratio,
        }
    };

    let result = classification::classify_property(&chars);
    Ok(serde_json::to_value(result)?)
}
