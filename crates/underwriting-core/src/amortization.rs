use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::UnderwritingError;
use crate::types::{
    overflow, pct_to_rate, with_metadata, ComputationOutput, Money, Percent, Rate, MAX_AMOUNT,
};
use crate::UnderwritingResult;

const MONTHS_PER_YEAR: u32 = 12;

/// Longest amortization term accepted.
pub const MAX_AMORTIZATION_YEARS: u32 = 50;

/// Highest annual interest rate accepted (100%).
pub const MAX_ANNUAL_RATE: Rate = dec!(1);

/// Residual balance below this is cleared with the final payment.
const PAYOFF_TOLERANCE: Decimal = dec!(0.000001);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Repayment profile of the acquisition loan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoanStructure {
    /// Level monthly payment retiring principal over the amortization term
    #[default]
    Amortizing,
    /// Interest only; the balance never moves
    InterestOnly,
}

/// Interest / principal split for one 12-month period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSplit {
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
    /// Monthly payments actually made (fewer than 12 in the payoff year)
    pub payments_made: u32,
}

/// Input for a standalone loan schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanScheduleInput {
    pub loan_amount: Money,
    pub interest_rate_pct: Percent,
    pub amortization_years: u32,
    #[serde(default)]
    pub loan_structure: LoanStructure,
    /// Number of years to schedule; defaults to the full amortization term
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years: Option<u32>,
}

/// One row of a loan schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanYear {
    pub year: u32,
    pub opening_balance: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanScheduleOutput {
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
    pub schedule: Vec<LoanYear>,
    pub total_interest: Money,
    pub total_principal: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Fixed monthly payment for a loan.
///
/// Amortizing loans use the annuity formula `L·r·(1+r)^n / ((1+r)^n − 1)`
/// over the full term in months, falling back to straight-line `L / n` at a
/// zero rate. Interest-only loans pay `L·r` each month.
pub fn monthly_payment(
    loan_amount: Money,
    annual_rate: Rate,
    amortization_years: u32,
    structure: LoanStructure,
) -> UnderwritingResult<Money> {
    validate_terms(loan_amount, annual_rate, amortization_years)?;

    let monthly_rate = annual_rate / Decimal::from(MONTHS_PER_YEAR);
    match structure {
        LoanStructure::InterestOnly => loan_amount
            .checked_mul(annual_rate)
            .map(|annual| annual / Decimal::from(MONTHS_PER_YEAR))
            .ok_or_else(|| overflow("loan_amount")),
        LoanStructure::Amortizing => {
            let total_months = amortization_years
                .checked_mul(MONTHS_PER_YEAR)
                .ok_or_else(|| overflow("amortization_years"))?;
            annuity_payment(loan_amount, monthly_rate, total_months)
        }
    }
}

/// Walk one year of the loan from `balance`.
///
/// Interest-only loans accrue `balance × annual_rate` and leave the balance
/// untouched. Amortizing loans walk twelve monthly periods; the walk stops
/// early once the balance is retired, and the final principal payment
/// clears exactly what is owed.
pub fn amortize_year(
    balance: Money,
    annual_rate: Rate,
    structure: LoanStructure,
    monthly_payment: Money,
) -> UnderwritingResult<YearSplit> {
    if balance < Decimal::ZERO {
        return Err(UnderwritingError::invalid(
            "outstanding_balance",
            "Outstanding balance cannot be negative",
        ));
    }
    if annual_rate < Decimal::ZERO {
        return Err(UnderwritingError::invalid(
            "interest_rate",
            "Interest rate cannot be negative",
        ));
    }

    if structure == LoanStructure::InterestOnly {
        let payments_made = if balance.is_zero() { 0 } else { MONTHS_PER_YEAR };
        return Ok(YearSplit {
            interest: balance * annual_rate,
            principal: Decimal::ZERO,
            closing_balance: balance,
            payments_made,
        });
    }

    let monthly_rate = annual_rate / Decimal::from(MONTHS_PER_YEAR);
    let mut remaining = balance;
    let mut interest = Decimal::ZERO;
    let mut principal = Decimal::ZERO;
    let mut payments_made = 0;

    for _ in 0..MONTHS_PER_YEAR {
        if remaining <= Decimal::ZERO {
            break;
        }
        let month_interest = remaining * monthly_rate;
        let due = monthly_payment - month_interest;
        if due <= Decimal::ZERO {
            return Err(UnderwritingError::invalid(
                "monthly_payment",
                "Monthly payment does not cover interest on an amortizing loan",
            ));
        }
        let month_principal = if remaining - due < PAYOFF_TOLERANCE {
            remaining
        } else {
            due
        };

        interest += month_interest;
        principal += month_principal;
        remaining -= month_principal;
        payments_made += 1;
    }

    Ok(YearSplit {
        interest,
        principal,
        closing_balance: remaining,
        payments_made,
    })
}

/// Build a year-by-year schedule for a single loan.
pub fn build_loan_schedule(
    input: &LoanScheduleInput,
) -> UnderwritingResult<ComputationOutput<LoanScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let annual_rate = pct_to_rate(input.interest_rate_pct);
    let payment = monthly_payment(
        input.loan_amount,
        annual_rate,
        input.amortization_years,
        input.loan_structure,
    )?;

    let years = input.years.unwrap_or(input.amortization_years);
    if years == 0 {
        return Err(UnderwritingError::invalid(
            "years",
            "Schedule must cover at least one year",
        ));
    }

    let mut schedule = Vec::with_capacity(years as usize);
    let mut balance = input.loan_amount;
    let mut total_interest = Decimal::ZERO;
    let mut total_principal = Decimal::ZERO;

    for year in 1..=years {
        let split = amortize_year(balance, annual_rate, input.loan_structure, payment)?;
        total_interest += split.interest;
        total_principal += split.principal;
        schedule.push(LoanYear {
            year,
            opening_balance: balance,
            interest: split.interest,
            principal: split.principal,
            closing_balance: split.closing_balance,
        });
        balance = split.closing_balance;
    }

    if input.loan_structure == LoanStructure::InterestOnly && !input.loan_amount.is_zero() {
        warnings.push(format!(
            "Interest-only loan: full balance of {} remains outstanding after year {years}",
            input.loan_amount.round_dp(2)
        ));
    }

    let output = LoanScheduleOutput {
        monthly_payment: payment,
        annual_debt_service: payment * Decimal::from(MONTHS_PER_YEAR),
        schedule,
        total_interest,
        total_principal,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Loan Amortization Schedule (monthly compounding)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_terms(
    loan_amount: Money,
    annual_rate: Rate,
    amortization_years: u32,
) -> UnderwritingResult<()> {
    if loan_amount < Decimal::ZERO || loan_amount > MAX_AMOUNT {
        return Err(UnderwritingError::invalid(
            "loan_amount",
            format!("Loan amount must be between 0 and {MAX_AMOUNT}"),
        ));
    }
    if annual_rate < Decimal::ZERO {
        return Err(UnderwritingError::invalid(
            "interest_rate",
            "Interest rate cannot be negative",
        ));
    }
    if annual_rate > MAX_ANNUAL_RATE {
        return Err(UnderwritingError::invalid(
            "interest_rate",
            "Interest rate cannot exceed 100%",
        ));
    }
    if amortization_years == 0 || amortization_years > MAX_AMORTIZATION_YEARS {
        return Err(UnderwritingError::invalid(
            "amortization_years",
            format!("Amortization period must be between 1 and {MAX_AMORTIZATION_YEARS} years"),
        ));
    }
    Ok(())
}

/// Standard fixed-rate mortgage payment: P * r(1+r)^n / ((1+r)^n - 1)
fn annuity_payment(principal: Money, monthly_rate: Rate, total_months: u32) -> UnderwritingResult<Money> {
    if monthly_rate.is_zero() {
        // Interest-free: straight-line amortisation
        return Ok(principal / Decimal::from(total_months));
    }

    // (1 + r)^n via iterative multiplication
    let mut compound = Decimal::ONE;
    for _ in 0..total_months {
        compound = compound
            .checked_mul(Decimal::ONE + monthly_rate)
            .ok_or_else(|| overflow("amortization_years"))?;
    }

    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        return Err(UnderwritingError::DivisionByZero {
            context: "mortgage payment denominator".into(),
        });
    }

    // Payment factor first so a large principal never meets (1+r)^n
    let factor = monthly_rate
        .checked_mul(compound)
        .and_then(|scaled| scaled.checked_div(denominator))
        .ok_or_else(|| overflow("interest_rate"))?;
    principal
        .checked_mul(factor)
        .ok_or_else(|| overflow("loan_amount"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
