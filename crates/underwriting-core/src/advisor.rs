//! Ranks a graded deal's factors and attaches improvement strategies.
//!
//! Presentational only: reads a [`GradeResult`] and never alters it.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::grading::scorecard::{GradeFactor, GradeResult, LetterGrade};
use crate::types::{with_metadata, ComputationOutput};

/// Factors scoring below this get improvement strategies.
pub const IMPROVEMENT_THRESHOLD: Decimal = dec!(60);

/// Factors that carry a strength / concern insight, in reporting order.
const INSIGHT_FACTORS: [GradeFactor; 5] = [
    GradeFactor::IrrVsMarket,
    GradeFactor::CashOnCashVsMarket,
    GradeFactor::DscrVsMarket,
    GradeFactor::CapRateVsMarket,
    GradeFactor::ExpenseEfficiency,
];

const STRENGTH_INSIGHT: Decimal = dec!(70);
const CONCERN_INSIGHT: Decimal = dec!(40);
const POINTS_PER_STRATEGY: Decimal = dec!(3);
const MAX_IMPROVEMENT_POINTS: Decimal = dec!(15);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PerformanceCategory {
    Exceptional,
    Strong,
    Good,
    MarketLevel,
    BelowMarket,
    Poor,
}

impl PerformanceCategory {
    pub fn from_score(score: Decimal) -> Self {
        if score >= dec!(85) {
            Self::Exceptional
        } else if score >= dec!(78) {
            Self::Strong
        } else if score >= dec!(70) {
            Self::Good
        } else if score >= dec!(55) {
            Self::MarketLevel
        } else if score >= dec!(40) {
            Self::BelowMarket
        } else {
            Self::Poor
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Exceptional => "significantly outperforming market benchmarks",
            Self::Strong => "consistently above market expectations",
            Self::Good => "performing above market averages",
            Self::MarketLevel => "meeting typical market performance",
            Self::BelowMarket => "underperforming market expectations",
            Self::Poor => "significantly underperforming market standards",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightTone {
    Strength,
    Concern,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub factor: GradeFactor,
    pub score: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub factor: GradeFactor,
    pub tone: InsightTone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementStrategy {
    pub factor: GradeFactor,
    pub category: String,
    pub suggestions: Vec<String>,
}

/// What the composite might reach if the weak factors were addressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementPotential {
    pub points: Decimal,
    pub potential_score: Decimal,
    pub potential_grade: LetterGrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outlook {
    /// Score ≥ 70: proceed to due diligence
    Proceed,
    /// Score ≥ 55: weigh risk-adjusted returns
    MarketLevel,
    /// Below 55: pass unless pricing reflects the risks
    Challenged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub performance: PerformanceCategory,
    pub strongest: Vec<FactorScore>,
    pub weakest: Vec<FactorScore>,
    pub insights: Vec<Insight>,
    pub improvements: Vec<ImprovementStrategy>,
    pub improvement_potential: Option<ImprovementPotential>,
    pub outlook: Outlook,
    /// The factor the outlook turns on: top strength when proceeding,
    /// weakest area otherwise
    pub outlook_focus: Option<GradeFactor>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn generate_advice(grade: &GradeResult) -> ComputationOutput<Advice> {
    let start = Instant::now();
    let advice = advise(grade);
    let elapsed = start.elapsed().as_micros() as u64;

    with_metadata(
        "Factor Ranking and Improvement Strategies",
        grade,
        Vec::new(),
        elapsed,
        advice,
    )
}

pub fn advise(grade: &GradeResult) -> Advice {
    let strongest: Vec<FactorScore> = ranked_factors(grade).into_iter().take(2).collect();
    let weakest: Vec<FactorScore> = weakest_factors(grade).into_iter().take(2).collect();

    let insights = INSIGHT_FACTORS
        .iter()
        .filter_map(|f| {
            let score = *grade.breakdown.get(f)?;
            let tone = if score >= STRENGTH_INSIGHT {
                InsightTone::Strength
            } else if score <= CONCERN_INSIGHT {
                InsightTone::Concern
            } else {
                return None;
            };
            Some(Insight { factor: *f, tone })
        })
        .collect();

    let improvements: Vec<ImprovementStrategy> = GradeFactor::ALL
        .iter()
        .filter(|f| {
            grade
                .breakdown
                .get(*f)
                .is_some_and(|s| *s < IMPROVEMENT_THRESHOLD)
        })
        .map(|f| strategy_for(*f))
        .collect();

    let improvement_potential = potential(grade, improvements.len());

    let score = grade.score;
    let (outlook, outlook_focus) = if score >= dec!(70) {
        (Outlook::Proceed, strongest.first().map(|fs| fs.factor))
    } else if score >= dec!(55) {
        (Outlook::MarketLevel, weakest.first().map(|fs| fs.factor))
    } else {
        (Outlook::Challenged, weakest.first().map(|fs| fs.factor))
    };

    Advice {
        performance: PerformanceCategory::from_score(score),
        strongest,
        weakest,
        insights,
        improvements,
        improvement_potential,
        outlook,
        outlook_focus,
    }
}

/// Factors by descending sub-score; ties keep weight order.
pub fn ranked_factors(grade: &GradeResult) -> Vec<FactorScore> {
    let mut ranked = factor_scores(grade);
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

/// Factors by ascending sub-score; ties keep weight order, so the
/// heaviest of several equally weak factors comes first.
pub fn weakest_factors(grade: &GradeResult) -> Vec<FactorScore> {
    let mut ranked = factor_scores(grade);
    ranked.sort_by(|a, b| a.score.cmp(&b.score));
    ranked
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn factor_scores(grade: &GradeResult) -> Vec<FactorScore> {
    GradeFactor::ALL
        .iter()
        .filter_map(|f| {
            grade.breakdown.get(f).map(|s| FactorScore {
                factor: *f,
                score: *s,
            })
        })
        .collect()
}

fn potential(grade: &GradeResult, strategies: usize) -> Option<ImprovementPotential> {
    if strategies == 0 {
        return None;
    }
    let points = (POINTS_PER_STRATEGY * Decimal::from(strategies)).min(MAX_IMPROVEMENT_POINTS);
    let potential_score = (grade.score + points).min(dec!(100));
    // Not worth reporting when the cap leaves less than two points of headroom
    if potential_score <= grade.score + dec!(2) {
        return None;
    }
    Some(ImprovementPotential {
        points,
        potential_score,
        potential_grade: LetterGrade::from_score(potential_score),
    })
}

fn strategy_for(factor: GradeFactor) -> ImprovementStrategy {
    let (category, suggestions): (&str, &[&str]) = match factor {
        GradeFactor::IrrVsMarket => (
            "Return Enhancement",
            &[
                "Negotiate purchase price down by 5-10% to improve returns",
                "Explore value-add opportunities (unit upgrades, amenity improvements)",
                "Consider alternative financing with better terms",
                "Implement rent growth strategies (market-rate adjustments, lease renewals)",
            ],
        ),
        GradeFactor::CashOnCashVsMarket => (
            "Cash Flow Optimization",
            &[
                "Increase down payment to reduce debt service and improve cash flow",
                "Negotiate seller financing or assumable loans at better rates",
                "Implement immediate rent increases where market allows",
                "Add revenue streams (parking fees, storage, laundry, pet fees)",
            ],
        ),
        GradeFactor::DscrVsMarket => (
            "Financing Risk Reduction",
            &[
                "Increase NOI through rent optimization and expense reduction",
                "Refinance to lower interest rate or extend amortization",
                "Consider interest-only period to improve initial DSCR",
                "Negotiate purchase price reduction to lower debt service",
            ],
        ),
        GradeFactor::CapRateVsMarket => (
            "Acquisition Pricing",
            &[
                "Negotiate purchase price down - currently paying premium to market",
                "Wait for better market conditions if this is discretionary",
                "Look for similar properties with better cap rates in the market",
                "Consider properties requiring light renovation for better basis",
            ],
        ),
        GradeFactor::ExpenseEfficiency => (
            "Operational Efficiency",
            &[
                "Audit property management fees - shop for competitive rates",
                "Implement energy efficiency improvements to reduce utilities",
                "Negotiate better insurance rates or increase deductibles",
                "Review maintenance contracts and vendor pricing",
                "Consider self-management for smaller properties",
                "Install smart home technology to reduce maintenance calls",
            ],
        ),
        GradeFactor::BreakEvenSpeed => (
            "Cash Flow Acceleration",
            &[
                "Focus on immediate revenue increases (rent to market, add fees)",
                "Reduce initial capital expenditures to essential items only",
                "Negotiate seller credits for deferred maintenance",
                "Consider graduated rent increases in early years",
            ],
        ),
        GradeFactor::RoiAtHorizon => (
            "Long-Term Value Creation",
            &[
                "Develop comprehensive value-add business plan",
                "Consider unit mix optimization (convert to higher-rent layouts)",
                "Explore highest and best use alternatives",
                "Plan strategic capital improvements to drive rent premiums",
            ],
        ),
    };
    ImprovementStrategy {
        factor,
        category: category.to_string(),
        suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
