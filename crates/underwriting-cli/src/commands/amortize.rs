use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use underwriting_core::amortization::{self, LoanScheduleInput, LoanStructure};

use crate::input;

/// Arguments for a loan amortization schedule
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Annual interest rate as a percentage (7 = 7%)
    #[arg(long, alias = "rate")]
    pub interest_rate_pct: Option<Decimal>,

    /// Amortization term in years
    #[arg(long, alias = "term")]
    pub amortization_years: Option<u32>,

    /// Interest-only instead of amortizing
    #[arg(long)]
    pub interest_only: bool,

    /// Years to schedule (defaults to the full term)
    #[arg(long)]
    pub years: Option<u32>,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: LoanScheduleInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(parsed) = input::stdin::read_stdin()? {
        parsed
    } else {
        LoanScheduleInput {
            loan_amount: args
                .loan_amount
                .ok_or("--loan-amount is required (or provide --input)")?,
            interest_rate_pct: args
                .interest_rate_pct
                .ok_or("--interest-rate-pct is required (or provide --input)")?,
            amortization_years: args
                .amortization_years
                .ok_or("--amortization-years is required (or provide --input)")?,
            loan_structure: if args.interest_only {
                LoanStructure::InterestOnly
            } else {
                LoanStructure::Amortizing
            },
            years: args.years,
        }
    };

    let result = amortization::build_loan_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}
