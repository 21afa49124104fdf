use log::debug;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use super::benchmarks::{self, Benchmark, BenchmarkSource};
use super::classification::{Classification, ClassificationOverride};
use super::Staircase;
use crate::metrics::MetricsBundle;
use crate::types::{with_metadata, ComputationOutput, Multiple, Percent};
use crate::UnderwritingResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The seven graded factors, in weight order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GradeFactor {
    /// Annualized return against the benchmark. Labelled "IRR" for
    /// continuity with the benchmark tables; the metric is the
    /// compound-growth approximation, not a solved IRR.
    #[serde(rename = "irr_vs_market")]
    IrrVsMarket,
    #[serde(rename = "cash_on_cash_vs_market")]
    CashOnCashVsMarket,
    #[serde(rename = "dscr_vs_market")]
    DscrVsMarket,
    #[serde(rename = "cap_rate_vs_market")]
    CapRateVsMarket,
    #[serde(rename = "expense_efficiency")]
    ExpenseEfficiency,
    #[serde(rename = "break_even_speed")]
    BreakEvenSpeed,
    #[serde(rename = "roi_at_horizon")]
    RoiAtHorizon,
}

impl GradeFactor {
    pub const ALL: [GradeFactor; 7] = [
        Self::IrrVsMarket,
        Self::CashOnCashVsMarket,
        Self::DscrVsMarket,
        Self::CapRateVsMarket,
        Self::ExpenseEfficiency,
        Self::BreakEvenSpeed,
        Self::RoiAtHorizon,
    ];

    /// Composite weight; the seven weights sum to 1.
    pub fn weight(&self) -> Decimal {
        match self {
            Self::IrrVsMarket => dec!(0.35),
            Self::CashOnCashVsMarket => dec!(0.25),
            Self::DscrVsMarket => dec!(0.20),
            Self::CapRateVsMarket => dec!(0.08),
            Self::ExpenseEfficiency => dec!(0.07),
            Self::BreakEvenSpeed => dec!(0.03),
            Self::RoiAtHorizon => dec!(0.02),
        }
    }
}

impl std::fmt::Display for GradeFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::IrrVsMarket => "IRR vs Market",
            Self::CashOnCashVsMarket => "Cash-on-Cash vs Market",
            Self::DscrVsMarket => "DSCR vs Market",
            Self::CapRateVsMarket => "Cap Rate vs Market",
            Self::ExpenseEfficiency => "Expense Efficiency",
            Self::BreakEvenSpeed => "Break-Even Speed",
            Self::RoiAtHorizon => "ROI at Horizon",
        };
        write!(f, "{s}")
    }
}

/// Letter grades, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LetterGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    C,
    #[serde(rename = "C-")]
    CMinus,
    D,
    F,
}

impl LetterGrade {
    /// Best first. F is the catch-all below the last threshold.
    pub const LADDER: [LetterGrade; 11] = [
        Self::APlus,
        Self::A,
        Self::AMinus,
        Self::BPlus,
        Self::B,
        Self::BMinus,
        Self::CPlus,
        Self::C,
        Self::CMinus,
        Self::D,
        Self::F,
    ];

    /// Minimum composite score for the grade.
    pub fn threshold(&self) -> Decimal {
        match self {
            Self::APlus => dec!(92),
            Self::A => dec!(85),
            Self::AMinus => dec!(78),
            Self::BPlus => dec!(70),
            Self::B => dec!(62),
            Self::BMinus => dec!(54),
            Self::CPlus => dec!(46),
            Self::C => dec!(38),
            Self::CMinus => dec!(30),
            Self::D => dec!(22),
            Self::F => Decimal::ZERO,
        }
    }

    pub fn from_score(score: Decimal) -> Self {
        Self::LADDER
            .into_iter()
            .find(|g| score >= g.threshold())
            .unwrap_or(Self::F)
    }
}

impl std::fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::AMinus => "A-",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::BMinus => "B-",
            Self::CPlus => "C+",
            Self::C => "C",
            Self::CMinus => "C-",
            Self::D => "D",
            Self::F => "F",
        };
        write!(f, "{s}")
    }
}

/// The metrics the scorecard reads. `None` is an undefined metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeMetrics {
    pub annualized_return: Option<Percent>,
    pub cash_on_cash: Option<Percent>,
    pub dscr: Option<Multiple>,
    pub cap_rate: Option<Percent>,
    pub expense_ratio: Option<Percent>,
    pub break_even_year: Option<u32>,
    pub total_roi: Option<Percent>,
}

impl From<&MetricsBundle> for GradeMetrics {
    fn from(m: &MetricsBundle) -> Self {
        Self {
            annualized_return: m.annualized_return,
            cash_on_cash: m.cash_on_cash,
            dscr: m.dscr,
            cap_rate: Some(m.cap_rate),
            expense_ratio: m.expense_ratio,
            break_even_year: m.break_even_year,
            total_roi: m.total_roi,
        }
    }
}

/// A graded deal. Produced once per evaluation and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeResult {
    pub grade: LetterGrade,
    /// Composite score, 0–100, one decimal
    pub score: Decimal,
    pub breakdown: BTreeMap<GradeFactor, Decimal>,
    pub classification: Classification,
}

/// Input for grading a pre-computed metrics set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeInput {
    pub metrics: GradeMetrics,
    /// Classification used to pick the benchmark; unspecified dimensions
    /// default to `b-class` / `tier-2`
    #[serde(default)]
    pub classification: ClassificationOverride,
    #[serde(default)]
    pub benchmark_override: Option<Benchmark>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeOutput {
    pub grade: GradeResult,
    pub benchmark: Benchmark,
    pub benchmark_source: BenchmarkSource,
}

// ---------------------------------------------------------------------------
// Breakpoints
// ---------------------------------------------------------------------------

/// Return ratios (annualized return, cash-on-cash) as actual / benchmark.
const RETURN_RATIO: Staircase = Staircase {
    bands: &[
        (dec!(1.5), 100),
        (dec!(1.25), 85),
        (dec!(1.1), 70),
        (dec!(0.9), 55),
        (dec!(0.75), 40),
        (dec!(0.5), 25),
    ],
    floor: 10,
};

const DSCR_RATIO: Staircase = Staircase {
    bands: &[
        (dec!(1.4), 100),
        (dec!(1.2), 85),
        (dec!(1.1), 70),
        (dec!(1.0), 55),
        (dec!(0.9), 40),
        (dec!(0.8), 25),
    ],
    floor: 10,
};

const CAP_RATE_RATIO: Staircase = Staircase {
    bands: &[
        (dec!(1.3), 100),
        (dec!(1.15), 85),
        (dec!(1.05), 70),
        (dec!(0.95), 55),
        (dec!(0.85), 40),
        (dec!(0.7), 25),
    ],
    floor: 10,
};

/// Benchmark expense ratio / actual expense ratio.
const EXPENSE_EFFICIENCY: Staircase = Staircase {
    bands: &[
        (dec!(1.2), 100),
        (dec!(1.1), 85),
        (dec!(1.05), 70),
        (dec!(0.95), 55),
        (dec!(0.85), 40),
        (dec!(0.7), 25),
    ],
    floor: 10,
};

/// Years to break even; `at_most`.
const BREAK_EVEN_YEARS: Staircase = Staircase {
    bands: &[
        (dec!(1), 100),
        (dec!(2), 80),
        (dec!(3), 60),
        (dec!(5), 40),
    ],
    floor: 20,
};

/// Absolute total ROI (%) at the hold horizon.
const ROI_AT_HORIZON: Staircase = Staircase {
    bands: &[
        (dec!(150), 100),
        (dec!(100), 85),
        (dec!(75), 70),
        (dec!(50), 55),
        (dec!(25), 40),
        (dec!(0), 25),
    ],
    floor: 10,
};

/// Score for an undefined metric or a zero benchmark denominator.
pub const UNDEFINED_FACTOR_SCORE: u32 = 10;

/// Expense ratio assumed when none was computed.
const DEFAULT_EXPENSE_RATIO: Percent = dec!(40);

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Grade a metrics set against an explicit or blended benchmark.
pub fn grade_metrics(input: &GradeInput) -> UnderwritingResult<ComputationOutput<GradeOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if let Some(custom) = &input.benchmark_override {
        custom.validate()?;
    }

    let classification = input.classification.apply(Classification::default());
    let (benchmark, benchmark_source) =
        benchmarks::resolve_benchmark(&classification, input.benchmark_override.as_ref());
    let grade = grade_deal(&input.metrics, classification, &benchmark);
    collect_undefined_warnings(&input.metrics, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Seven-Factor Weighted Deal Scorecard",
        input,
        warnings,
        elapsed,
        GradeOutput {
            grade,
            benchmark,
            benchmark_source,
        },
    ))
}

/// Score every factor and map the composite to a letter grade.
pub fn grade_deal(
    metrics: &GradeMetrics,
    classification: Classification,
    benchmark: &Benchmark,
) -> GradeResult {
    let breakdown = score_factors(metrics, benchmark);
    let composite = composite_score(&breakdown);
    let grade = LetterGrade::from_score(composite);
    debug!("composite score {composite} -> {grade}");

    GradeResult {
        grade,
        score: composite.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero),
        breakdown,
        classification,
    }
}

/// Per-factor sub-scores (0–100).
pub fn score_factors(metrics: &GradeMetrics, benchmark: &Benchmark) -> BTreeMap<GradeFactor, Decimal> {
    let vs = |actual: Option<Decimal>, bench: Decimal, steps: &Staircase| match actual {
        Some(a) if !bench.is_zero() => steps.at_least(a / bench),
        _ => UNDEFINED_FACTOR_SCORE,
    };

    let expense_ratio = match metrics.expense_ratio {
        Some(r) if !r.is_zero() => r,
        _ => DEFAULT_EXPENSE_RATIO,
    };
    let expense_efficiency = benchmark.avg_expense_ratio / expense_ratio.max(Decimal::ONE);

    let scores = [
        (
            GradeFactor::IrrVsMarket,
            vs(metrics.annualized_return, benchmark.avg_irr, &RETURN_RATIO),
        ),
        (
            GradeFactor::CashOnCashVsMarket,
            vs(metrics.cash_on_cash, benchmark.avg_cash_on_cash, &RETURN_RATIO),
        ),
        (
            GradeFactor::DscrVsMarket,
            vs(metrics.dscr, benchmark.avg_dscr, &DSCR_RATIO),
        ),
        (
            GradeFactor::CapRateVsMarket,
            vs(metrics.cap_rate, benchmark.avg_cap_rate, &CAP_RATE_RATIO),
        ),
        (
            GradeFactor::ExpenseEfficiency,
            EXPENSE_EFFICIENCY.at_least(expense_efficiency),
        ),
        (
            GradeFactor::BreakEvenSpeed,
            metrics
                .break_even_year
                .map_or(UNDEFINED_FACTOR_SCORE, |y| {
                    BREAK_EVEN_YEARS.at_most(Decimal::from(y))
                }),
        ),
        (
            GradeFactor::RoiAtHorizon,
            metrics
                .total_roi
                .map_or(UNDEFINED_FACTOR_SCORE, |roi| ROI_AT_HORIZON.at_least(roi)),
        ),
    ];

    scores
        .into_iter()
        .map(|(factor, points)| (factor, Decimal::from(points)))
        .collect()
}

/// Weighted sum of sub-scores, unrounded. A factor absent from the
/// breakdown contributes nothing.
pub fn composite_score(breakdown: &BTreeMap<GradeFactor, Decimal>) -> Decimal {
    breakdown
        .iter()
        .map(|(factor, score)| *score * factor.weight())
        .sum()
}

pub(crate) fn collect_undefined_warnings(metrics: &GradeMetrics, warnings: &mut Vec<String>) {
    for (label, value) in [
        ("annualized return", metrics.annualized_return),
        ("cash-on-cash", metrics.cash_on_cash),
        ("DSCR", metrics.dscr),
        ("cap rate", metrics.cap_rate),
        ("total ROI", metrics.total_roi),
    ] {
        if value.is_none() {
            warnings.push(format!(
                "{label} is undefined; factor scored at the floor of {UNDEFINED_FACTOR_SCORE}"
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
