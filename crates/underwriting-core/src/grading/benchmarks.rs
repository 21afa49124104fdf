use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::classification::{AssetClass, Classification, MarketTier};
use crate::error::UnderwritingError;
use crate::types::{Multiple, Percent};
use crate::UnderwritingResult;

/// Weight of the asset-class table in a blended benchmark.
pub const ASSET_CLASS_WEIGHT: Decimal = dec!(0.6);
/// Weight of the market-tier table in a blended benchmark.
pub const MARKET_TIER_WEIGHT: Decimal = dec!(0.4);

/// Expected market performance for a peer group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    /// Expected annualized return (%)
    pub avg_irr: Percent,
    pub avg_cash_on_cash: Percent,
    pub avg_dscr: Multiple,
    pub avg_cap_rate: Percent,
    pub avg_expense_ratio: Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkSource {
    /// Caller-supplied benchmark used verbatim
    Custom,
    /// 60/40 blend of the asset-class and market-tier tables
    Blended,
}

impl Benchmark {
    const fn new(
        avg_irr: Percent,
        avg_cash_on_cash: Percent,
        avg_dscr: Multiple,
        avg_cap_rate: Percent,
        avg_expense_ratio: Percent,
    ) -> Self {
        Self {
            avg_irr,
            avg_cash_on_cash,
            avg_dscr,
            avg_cap_rate,
            avg_expense_ratio,
        }
    }

    /// Reject negative figures in a caller-supplied benchmark. Zero is
    /// allowed and scores the affected factor at its floor.
    pub fn validate(&self) -> UnderwritingResult<()> {
        for (field, value) in [
            ("benchmark.avg_irr", self.avg_irr),
            ("benchmark.avg_cash_on_cash", self.avg_cash_on_cash),
            ("benchmark.avg_dscr", self.avg_dscr),
            ("benchmark.avg_cap_rate", self.avg_cap_rate),
            ("benchmark.avg_expense_ratio", self.avg_expense_ratio),
        ] {
            if value < Decimal::ZERO {
                return Err(UnderwritingError::invalid(
                    field,
                    "Benchmark figures cannot be negative",
                ));
            }
        }
        Ok(())
    }
}

pub fn asset_class_benchmark(class: AssetClass) -> Benchmark {
    match class {
        AssetClass::AClass => Benchmark::new(dec!(8.5), dec!(3.5), dec!(1.20), dec!(4.7), dec!(35)),
        AssetClass::BClass => Benchmark::new(dec!(10.0), dec!(4.5), dec!(1.25), dec!(4.9), dec!(40)),
        AssetClass::CClass => Benchmark::new(dec!(12.0), dec!(6.0), dec!(1.30), dec!(5.4), dec!(45)),
        AssetClass::ValueAdd => Benchmark::new(dec!(14.0), dec!(5.5), dec!(1.15), dec!(5.2), dec!(50)),
    }
}

pub fn market_tier_benchmark(tier: MarketTier) -> Benchmark {
    match tier {
        MarketTier::Tier1 => Benchmark::new(dec!(8.0), dec!(3.0), dec!(1.20), dec!(4.2), dec!(38)),
        MarketTier::Tier2 => Benchmark::new(dec!(10.0), dec!(4.5), dec!(1.25), dec!(4.8), dec!(42)),
        MarketTier::Tier3 => Benchmark::new(dec!(12.0), dec!(5.5), dec!(1.30), dec!(5.5), dec!(45)),
        MarketTier::Emerging => Benchmark::new(dec!(14.0), dec!(7.0), dec!(1.35), dec!(6.2), dec!(48)),
    }
}

/// Field-wise 60/40 blend of the two peer-group tables.
pub fn blend(asset: &Benchmark, tier: &Benchmark) -> Benchmark {
    let mix = |a: Decimal, t: Decimal| a * ASSET_CLASS_WEIGHT + t * MARKET_TIER_WEIGHT;
    Benchmark {
        avg_irr: mix(asset.avg_irr, tier.avg_irr),
        avg_cash_on_cash: mix(asset.avg_cash_on_cash, tier.avg_cash_on_cash),
        avg_dscr: mix(asset.avg_dscr, tier.avg_dscr),
        avg_cap_rate: mix(asset.avg_cap_rate, tier.avg_cap_rate),
        avg_expense_ratio: mix(asset.avg_expense_ratio, tier.avg_expense_ratio),
    }
}

/// The benchmark a deal is graded against: the override verbatim if one
/// is supplied, otherwise the blend for its classification.
pub fn resolve_benchmark(
    classification: &Classification,
    custom: Option<&Benchmark>,
) -> (Benchmark, BenchmarkSource) {
    match custom {
        Some(b) => (b.clone(), BenchmarkSource::Custom),
        None => (
            blend(
                &asset_class_benchmark(classification.asset_class),
                &market_tier_benchmark(classification.market_tier),
            ),
            BenchmarkSource::Blended,
        ),
    }
}
