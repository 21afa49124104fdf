use log::warn;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::ModelConfig;
use crate::projection::{
    self, AcquisitionAssumptions, FinancingSummary, ProjectionInput, ProjectionOutput,
    YearlyProjection,
};
use crate::types::{overflow, pct_to_rate, rate_to_pct, with_metadata, ComputationOutput, Money, Multiple, Percent};
use crate::UnderwritingResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Point-in-time and horizon return metrics derived from a projection.
///
/// Ratios are whole-number percentages; DSCR is a multiple. `None` means the
/// metric is undefined (zero denominator or no real root), which is distinct
/// from a computed zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsBundle {
    /// Year-1 operating expenses / effective gross income
    pub expense_ratio: Option<Percent>,
    /// Year-1 NOI / purchase price
    pub cap_rate: Percent,
    /// Year-1 NOI / year-1 debt service
    pub dscr: Option<Multiple>,
    /// Year-1 after-tax cash flow / initial investment
    pub cash_on_cash: Option<Percent>,
    /// Compound-growth approximation `(total_return / investment)^(1/hold) − 1`.
    /// This is not an internal rate of return; benchmark tables labelled
    /// "IRR" are compared against this figure.
    pub annualized_return: Option<Percent>,
    /// (total_return − investment) / investment
    pub total_roi: Option<Percent>,
    pub projected_value_at_exit: Money,
    pub remaining_loan_balance_at_exit: Money,
    pub projected_equity_at_exit: Money,
    /// After-tax cash flow over the hold plus projected equity at exit
    pub total_return: Money,
    /// First hold year in which cumulative pre-tax cash flow after reserves
    /// recovers the initial investment
    pub break_even_year: Option<u32>,
    pub year1_net_operating_income: Money,
    pub hold_period_years: u32,
}

/// Projection plus its metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowAnalysis {
    pub financing: FinancingSummary,
    pub projections: Vec<YearlyProjection>,
    pub metrics: MetricsBundle,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project cash flows and derive the return metrics for the hold period.
pub fn calculate_metrics(
    input: &ProjectionInput,
) -> UnderwritingResult<ComputationOutput<CashFlowAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let projection = projection::project_years(
        &input.acquisition,
        &input.operating,
        &input.config,
        &mut warnings,
    )?;
    let metrics = compute_metrics(&projection, &input.acquisition, &input.config, &mut warnings)?;

    let output = CashFlowAnalysis {
        financing: projection.financing,
        projections: projection.projections,
        metrics,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "10-Year Cash Flow Projection with Return Metrics",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Derive the metrics bundle from an already-computed projection.
pub fn compute_metrics(
    projection: &ProjectionOutput,
    acquisition: &AcquisitionAssumptions,
    config: &ModelConfig,
    warnings: &mut Vec<String>,
) -> UnderwritingResult<MetricsBundle> {
    let financing = &projection.financing;
    let hold = acquisition.hold_period_years as usize;
    let held = &projection.projections[..hold.min(projection.projections.len())];
    let initial_investment = financing.initial_investment;

    // --- Year-1 point-in-time metrics ---
    let (year1_noi, expense_ratio, dscr, year1_cfat) = match projection.projections.first() {
        Some(y1) => (
            y1.net_operating_income,
            ratio_pct(y1.total_operating_expenses, y1.effective_gross_income),
            ratio(y1.net_operating_income, y1.debt_service),
            y1.cash_flow_after_tax,
        ),
        None => (Decimal::ZERO, None, None, Decimal::ZERO),
    };
    let cap_rate = rate_to_pct(year1_noi / financing.purchase_price);
    let cash_on_cash = ratio_pct(year1_cfat, initial_investment);

    // --- Exit ---
    let appreciation = Decimal::ONE + pct_to_rate(config.appreciation_pct);
    let projected_value_at_exit = appreciation
        .checked_powu(hold as u64)
        .and_then(|growth| financing.purchase_price.checked_mul(growth))
        .ok_or_else(|| overflow("appreciation_pct"))?;
    let principal_retired: Money = held.iter().map(|p| p.principal_paid).sum();
    let remaining_loan_balance_at_exit =
        (financing.loan_amount - principal_retired).max(Decimal::ZERO);
    let projected_equity_at_exit = projected_value_at_exit - remaining_loan_balance_at_exit;

    // --- Horizon returns ---
    let cumulative_cfat: Money = held.iter().map(|p| p.cash_flow_after_tax).sum();
    let total_return = cumulative_cfat + projected_equity_at_exit;
    let annualized_return = annualized(total_return, initial_investment, hold as u32);
    let total_roi = ratio_pct(total_return - initial_investment, initial_investment);

    let break_even_year = break_even(held, initial_investment);

    // --- Warnings ---
    if initial_investment.is_zero() {
        warn!("initial investment is zero; investment-relative metrics undefined");
        warnings.push(
            "Initial investment is zero — cash-on-cash, annualized return and ROI are undefined"
                .into(),
        );
    } else if annualized_return.is_none() {
        warnings.push(
            "Total return is not positive — annualized return is undefined".into(),
        );
    }
    match dscr {
        Some(d) if d < dec!(1.2) => warnings.push(format!(
            "DSCR of {d:.2} is below 1.20x — lender covenant risk"
        )),
        None => warnings.push("No debt service in year 1 — DSCR is undefined".into()),
        _ => {}
    }

    Ok(MetricsBundle {
        expense_ratio,
        cap_rate,
        dscr,
        cash_on_cash,
        annualized_return,
        total_roi,
        projected_value_at_exit,
        remaining_loan_balance_at_exit,
        projected_equity_at_exit,
        total_return,
        break_even_year,
        year1_net_operating_income: year1_noi,
        hold_period_years: acquisition.hold_period_years,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        None
    } else {
        Some(numerator / denominator)
    }
}

fn ratio_pct(numerator: Decimal, denominator: Decimal) -> Option<Percent> {
    ratio(numerator, denominator).map(rate_to_pct)
}

fn annualized(total_return: Money, initial_investment: Money, hold_years: u32) -> Option<Percent> {
    let multiple = ratio(total_return, initial_investment)?;
    if multiple <= Decimal::ZERO || hold_years == 0 {
        return None;
    }
    let root = multiple.checked_powd(Decimal::ONE / Decimal::from(hold_years))?;
    Some(rate_to_pct(root - Decimal::ONE))
}

fn break_even(held: &[YearlyProjection], initial_investment: Money) -> Option<u32> {
    let mut cumulative = -initial_investment;
    for p in held {
        cumulative += p.cash_flow_before_tax - p.capital_reserve;
        if cumulative >= Decimal::ZERO {
            return Some(p.year);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
