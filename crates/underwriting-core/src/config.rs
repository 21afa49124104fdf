use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::UnderwritingError;
use crate::types::{pct_to_rate, Percent, Rate};
use crate::UnderwritingResult;

/// Marginal tax rates applied to positive taxable income.
///
/// The combined rate is the plain sum of the three components; there are
/// no brackets and no phase-ins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxRates {
    /// Federal marginal rate
    pub federal_pct: Percent,
    /// State / local marginal rate
    pub state_local_pct: Percent,
    /// Net investment income surtax
    pub surtax_pct: Percent,
}

impl Default for TaxRates {
    fn default() -> Self {
        Self {
            federal_pct: dec!(24),
            state_local_pct: dec!(6),
            surtax_pct: dec!(3.8),
        }
    }
}

impl TaxRates {
    pub fn combined_pct(&self) -> Percent {
        self.federal_pct + self.state_local_pct + self.surtax_pct
    }

    pub fn combined_rate(&self) -> Rate {
        pct_to_rate(self.combined_pct())
    }
}

/// Model-wide constants that are not deal assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub tax: TaxRates,
    /// Straight-line recovery period for the building (residential rental)
    pub depreciation_life_years: Decimal,
    /// Annual appreciation used to project the exit value
    pub appreciation_pct: Percent,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            tax: TaxRates::default(),
            depreciation_life_years: dec!(27.5),
            appreciation_pct: dec!(3),
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> UnderwritingResult<()> {
        let tax = &self.tax;
        for (field, value) in [
            ("tax.federal_pct", tax.federal_pct),
            ("tax.state_local_pct", tax.state_local_pct),
            ("tax.surtax_pct", tax.surtax_pct),
        ] {
            if value < Decimal::ZERO {
                return Err(UnderwritingError::invalid(
                    field,
                    "Tax rate cannot be negative",
                ));
            }
        }
        if tax.combined_pct() > dec!(100) {
            return Err(UnderwritingError::invalid(
                "tax",
                "Combined marginal tax rate cannot exceed 100%",
            ));
        }
        if self.depreciation_life_years < Decimal::ONE {
            return Err(UnderwritingError::invalid(
                "depreciation_life_years",
                "Depreciation life must be at least 1 year",
            ));
        }
        if self.appreciation_pct <= dec!(-100) || self.appreciation_pct > dec!(100) {
            return Err(UnderwritingError::invalid(
                "appreciation_pct",
                "Appreciation must be above -100% and at most 100%",
            ));
        }
        Ok(())
    }
}
