use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::Staircase;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AssetClass {
    #[serde(rename = "a-class")]
    AClass,
    #[default]
    #[serde(rename = "b-class")]
    BClass,
    #[serde(rename = "c-class")]
    CClass,
    #[serde(rename = "value-add")]
    ValueAdd,
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AClass => "a-class",
            Self::BClass => "b-class",
            Self::CClass => "c-class",
            Self::ValueAdd => "value-add",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MarketTier {
    #[serde(rename = "tier-1")]
    Tier1,
    #[default]
    #[serde(rename = "tier-2")]
    Tier2,
    #[serde(rename = "tier-3")]
    Tier3,
    #[serde(rename = "emerging")]
    Emerging,
}

impl std::fmt::Display for MarketTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Tier1 => "tier-1",
            Self::Tier2 => "tier-2",
            Self::Tier3 => "tier-3",
            Self::Emerging => "emerging",
        };
        write!(f, "{s}")
    }
}

/// The property's position in the market. Defaults to `b-class` / `tier-2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Classification {
    pub asset_class: AssetClass,
    pub market_tier: MarketTier,
}

/// Observable characteristics the heuristic scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyCharacteristics {
    pub purchase_price: Money,
    pub unit_count: u32,
    pub avg_monthly_rent_per_unit: Money,
    /// Year-1 cap rate; asset class cannot be scored without it
    #[serde(default)]
    pub cap_rate: Option<Percent>,
    /// Year-1 expense ratio; asset class cannot be scored without it
    #[serde(default)]
    pub expense_ratio: Option<Percent>,
}

/// Caller-supplied classification, bypassing the heuristic per dimension.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ClassificationOverride {
    #[serde(default)]
    pub asset_class: Option<AssetClass>,
    #[serde(default)]
    pub market_tier: Option<MarketTier>,
}

impl ClassificationOverride {
    pub fn apply(&self, detected: Classification) -> Classification {
        Classification {
            asset_class: self.asset_class.unwrap_or(detected.asset_class),
            market_tier: self.market_tier.unwrap_or(detected.market_tier),
        }
    }
}

/// Classification with the heuristic scores that produced it. A `None`
/// score means the dimension fell back to its default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationOutput {
    pub classification: Classification,
    pub price_per_unit: Option<Money>,
    pub asset_class_score: Option<u32>,
    pub market_tier_score: Option<u32>,
}

// ---------------------------------------------------------------------------
// Scoring table
// ---------------------------------------------------------------------------

/// Every classification breakpoint, in one place.
pub mod thresholds {
    use super::*;

    pub(crate) const ASSET_PRICE_PER_UNIT: Staircase = Staircase {
        bands: &[(dec!(300_000), 40), (dec!(200_000), 30), (dec!(100_000), 20)],
        floor: 10,
    };
    pub(crate) const ASSET_RENT: Staircase = Staircase {
        bands: &[(dec!(2500), 30), (dec!(1800), 25), (dec!(1200), 20)],
        floor: 10,
    };
    /// Lower cap rates indicate higher-quality assets.
    pub(crate) const ASSET_CAP_RATE: Staircase = Staircase {
        bands: &[(dec!(4.5), 20), (dec!(5.5), 15), (dec!(6.5), 10)],
        floor: 5,
    };
    /// Lower expense ratios indicate higher-quality assets.
    pub(crate) const ASSET_EXPENSE_RATIO: Staircase = Staircase {
        bands: &[(dec!(35), 10), (dec!(45), 8), (dec!(55), 6)],
        floor: 3,
    };
    pub const ASSET_CLASS_CUTOFFS: [(u32, AssetClass); 3] = [
        (85, AssetClass::AClass),
        (65, AssetClass::BClass),
        (45, AssetClass::CClass),
    ];

    pub(crate) const TIER_PRICE_PER_UNIT: Staircase = Staircase {
        bands: &[(dec!(400_000), 40), (dec!(250_000), 30), (dec!(150_000), 20)],
        floor: 10,
    };
    pub(crate) const TIER_RENT: Staircase = Staircase {
        bands: &[(dec!(3000), 30), (dec!(2000), 25), (dec!(1400), 20)],
        floor: 10,
    };
    pub const MARKET_TIER_CUTOFFS: [(u32, MarketTier); 3] = [
        (60, MarketTier::Tier1),
        (45, MarketTier::Tier2),
        (30, MarketTier::Tier3),
    ];
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Classify a property, reporting the heuristic scores and any fallback.
pub fn classify_property(chars: &PropertyCharacteristics) -> ComputationOutput<ClassificationOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = classify_with_scores(chars, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;

    with_metadata(
        "Heuristic Asset Class / Market Tier Classification",
        chars,
        warnings,
        elapsed,
        output,
    )
}

/// Pure classification. Never fails: an unscoreable dimension takes its
/// default (`b-class` / `tier-2`).
pub fn classify(chars: &PropertyCharacteristics) -> Classification {
    classify_with_scores(chars, &mut Vec::new()).classification
}

pub(crate) fn classify_with_scores(
    chars: &PropertyCharacteristics,
    warnings: &mut Vec<String>,
) -> ClassificationOutput {
    let price_per_unit = price_per_unit(chars);
    let asset_class_score = asset_class_score(chars);
    let market_tier_score = market_tier_score(chars);

    let asset_class = match asset_class_score {
        Some(score) => asset_class_for(score),
        None => {
            debug!("asset class unscoreable, falling back to {}", AssetClass::default());
            warnings.push(format!(
                "Insufficient data to classify asset class; defaulting to {}",
                AssetClass::default()
            ));
            AssetClass::default()
        }
    };
    let market_tier = match market_tier_score {
        Some(score) => market_tier_for(score),
        None => {
            debug!("market tier unscoreable, falling back to {}", MarketTier::default());
            warnings.push(format!(
                "Insufficient data to classify market tier; defaulting to {}",
                MarketTier::default()
            ));
            MarketTier::default()
        }
    };

    ClassificationOutput {
        classification: Classification {
            asset_class,
            market_tier,
        },
        price_per_unit,
        asset_class_score,
        market_tier_score,
    }
}

/// Weighted asset-class score (10..=100), or `None` when unscoreable.
pub fn asset_class_score(chars: &PropertyCharacteristics) -> Option<u32> {
    use thresholds::*;
    let ppu = price_per_unit(chars)?;
    let rent = scoreable_rent(chars)?;
    let cap_rate = chars.cap_rate?;
    let expense_ratio = chars.expense_ratio?;

    Some(
        ASSET_PRICE_PER_UNIT.at_least(ppu)
            + ASSET_RENT.at_least(rent)
            + ASSET_CAP_RATE.at_most(cap_rate)
            + ASSET_EXPENSE_RATIO.at_most(expense_ratio),
    )
}

/// Market-tier score (20..=70), or `None` when unscoreable.
pub fn market_tier_score(chars: &PropertyCharacteristics) -> Option<u32> {
    use thresholds::*;
    let ppu = price_per_unit(chars)?;
    let rent = scoreable_rent(chars)?;
    Some(TIER_PRICE_PER_UNIT.at_least(ppu) + TIER_RENT.at_least(rent))
}

pub fn asset_class_for(score: u32) -> AssetClass {
    thresholds::ASSET_CLASS_CUTOFFS
        .iter()
        .find(|(cutoff, _)| score >= *cutoff)
        .map_or(AssetClass::ValueAdd, |(_, class)| *class)
}

pub fn market_tier_for(score: u32) -> MarketTier {
    thresholds::MARKET_TIER_CUTOFFS
        .iter()
        .find(|(cutoff, _)| score >= *cutoff)
        .map_or(MarketTier::Emerging, |(_, tier)| *tier)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn price_per_unit(chars: &PropertyCharacteristics) -> Option<Money> {
    if chars.unit_count == 0 || chars.purchase_price <= Decimal::ZERO {
        return None;
    }
    Some(chars.purchase_price / Decimal::from(chars.unit_count))
}

fn scoreable_rent(chars: &PropertyCharacteristics) -> Option<Money> {
    (chars.avg_monthly_rent_per_unit > Decimal::ZERO).then_some(chars.avg_monthly_rent_per_unit)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn luxury() -> PropertyCharacteristics {
        PropertyCharacteristics {
            purchase_price: dec!(12_000_000),
            unit_count: 30,
            avg_monthly_rent_per_unit: dec!(3200),
            cap_rate: Some(dec!(4.2)),
            expense_ratio: Some(dec!(33)),
        }
    }

    #[test]
    fn test_luxury_is_a_class_tier_1() {
        let out = classify_property(&luxury());
        assert_eq!(out.result.asset_class_score, Some(100));
        assert_eq!(out.result.market_tier_score, Some(70));
        assert_eq!(
            out.result.classification,
            Classification {
                asset_class: AssetClass::AClass,
                market_tier: MarketTier::Tier1,
            }
        );
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_workforce_housing() {
        // $100k/unit, $1,500 rent, 10% cap, 38% expenses
        let chars = PropertyCharacteristics {
            purchase_price: dec!(2_000_000),
            unit_count: 20,
            avg_monthly_rent_per_unit: dec!(1500),
            cap_rate: Some(dec!(10)),
            expense_ratio: Some(dec!(38)),
        };
        // 20 + 20 + 5 + 8 = 53 -> c-class; 10 + 20 = 30 -> tier-3
        assert_eq!(asset_class_score(&chars), Some(53));
        assert_eq!(market_tier_score(&chars), Some(30));
        assert_eq!(
            classify(&chars),
            Classification {
                asset_class: AssetClass::CClass,
                market_tier: MarketTier::Tier3,
            }
        );
    }

    #[test]
    fn test_cutoffs_inclusive() {
        assert_eq!(asset_class_for(85), AssetClass::AClass);
        assert_eq!(asset_class_for(84), AssetClass::BClass);
        assert_eq!(asset_class_for(45), AssetClass::CClass);
        assert_eq!(asset_class_for(44), AssetClass::ValueAdd);
        assert_eq!(market_tier_for(60), MarketTier::Tier1);
        assert_eq!(market_tier_for(45), MarketTier::Tier2);
        assert_eq!(market_tier_for(30), MarketTier::Tier3);
        assert_eq!(market_tier_for(29), MarketTier::Emerging);
    }

    #[test]
    fn test_inverted_bands() {
        use thresholds::*;
        assert_eq!(ASSET_CAP_RATE.at_most(dec!(4.5)), 20);
        assert_eq!(ASSET_CAP_RATE.at_most(dec!(4.51)), 15);
        assert_eq!(ASSET_CAP_RATE.at_most(dec!(7)), 5);
        assert_eq!(ASSET_EXPENSE_RATIO.at_most(dec!(55)), 6);
        assert_eq!(ASSET_EXPENSE_RATIO.at_most(dec!(60)), 3);
    }

    #[test]
    fn test_missing_ratios_fall_back_asset_class_only() {
        let mut chars = luxury();
        chars.cap_rate = None;
        let out = classify_property(&chars);
        assert_eq!(out.result.classification.asset_class, AssetClass::BClass);
        assert_eq!(out.result.classification.market_tier, MarketTier::Tier1);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_zero_units_falls_back_both() {
        let mut chars = luxury();
        chars.unit_count = 0;
        let out = classify_property(&chars);
        assert_eq!(out.result.classification, Classification::default());
        assert_eq!(out.result.price_per_unit, None);
        assert_eq!(out.warnings.len(), 2);
    }

    #[test]
    fn test_override_per_dimension() {
        let ov = ClassificationOverride {
            asset_class: Some(AssetClass::ValueAdd),
            market_tier: None,
        };
        let applied = ov.apply(classify(&luxury()));
        assert_eq!(applied.asset_class, AssetClass::ValueAdd);
        assert_eq!(applied.market_tier, MarketTier::Tier1);
    }

    #[test]
    fn test_serde_labels() {
        let json = serde_json::to_string(&Classification::default()).unwrap();
        assert_eq!(json, r#"{"asset_class":"b-class","market_tier":"tier-2"}"#);
        let tier: MarketTier = serde_json::from_str(r#""emerging""#).unwrap();
        assert_eq!(tier, MarketTier::Emerging);
    }
}
