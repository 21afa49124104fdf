use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::UnderwritingError;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Internal use only.
pub type Rate = Decimal;

/// Whole-number percentages (7.0 = 7%). Every percentage crossing the
/// public boundary, in or out, uses this form.
pub type Percent = Decimal;

/// Multiples (e.g., 1.25x DSCR)
pub type Multiple = Decimal;

/// Largest dollar amount accepted on any input. Keeps every intermediate
/// product of a ten-year projection inside `Decimal` range.
pub const MAX_AMOUNT: Money = dec!(1_000_000_000_000_000);

/// Convert a whole-number percentage to a decimal rate.
pub fn pct_to_rate(pct: Percent) -> Rate {
    pct / dec!(100)
}

/// Convert a decimal rate to a whole-number percentage.
pub fn rate_to_pct(rate: Rate) -> Percent {
    rate * dec!(100)
}

/// Report an arithmetic overflow on `field` as invalid input.
pub(crate) fn overflow(field: &str) -> UnderwritingError {
    UnderwritingError::invalid(field, "Value is too large to compute")
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
