use log::debug;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{self, LoanStructure, MAX_AMORTIZATION_YEARS};
use crate::config::ModelConfig;
use crate::error::UnderwritingError;
use crate::types::{overflow, pct_to_rate, with_metadata, ComputationOutput, Money, Percent, MAX_AMOUNT};
use crate::UnderwritingResult;

/// The engine always projects this many years, whatever the hold period,
/// so exit-year figures are available for any hold of up to ten years.
pub const PROJECTION_YEARS: u32 = 10;

/// Largest property accepted, in units.
pub const MAX_UNIT_COUNT: u32 = 1_000_000;

/// Highest interest rate, and highest annual growth rate, accepted.
const MAX_RATE_PCT: Percent = dec!(100);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Purchase and financing assumptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionAssumptions {
    pub purchase_price: Money,
    pub down_payment_pct: Percent,
    pub closing_cost_pct: Percent,
    pub interest_rate_pct: Percent,
    pub amortization_years: u32,
    #[serde(default)]
    pub loan_structure: LoanStructure,
    /// Accepted for compatibility with upstream data; an interest-only loan
    /// is projected interest-only for the whole window regardless.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_only_period_years: Option<u32>,
    pub hold_period_years: u32,
}

/// Annual operating expense line items (year-1 amounts).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatingExpenses {
    pub property_taxes: Money,
    pub insurance: Money,
    /// Property management fee as a percentage of effective gross income
    pub management_fee_pct: Percent,
    pub maintenance_repairs: Money,
    pub utilities: Money,
    pub contract_services: Money,
    pub payroll: Money,
    pub marketing: Money,
    pub general_admin: Money,
    pub other: Money,
}

/// Income and expense assumptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingAssumptions {
    pub unit_count: u32,
    pub avg_monthly_rent_per_unit: Money,
    pub vacancy_rate_pct: Percent,
    pub rent_growth_pct: Percent,
    #[serde(default)]
    pub other_income: Money,
    #[serde(default)]
    pub income_reductions: Money,
    pub expenses: OperatingExpenses,
    pub expense_growth_pct: Percent,
    #[serde(default)]
    pub capital_reserve_per_unit: Money,
}

/// Input for a standalone cash-flow projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub acquisition: AcquisitionAssumptions,
    pub operating: OperatingAssumptions,
    #[serde(default)]
    pub config: ModelConfig,
}

/// Expense lines for a single projection year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseLines {
    pub property_taxes: Money,
    pub insurance: Money,
    pub management_fee: Money,
    pub maintenance_repairs: Money,
    pub utilities: Money,
    pub contract_services: Money,
    pub payroll: Money,
    pub marketing: Money,
    pub general_admin: Money,
    pub other_expenses: Money,
}

impl ExpenseLines {
    pub fn total(&self) -> Money {
        self.property_taxes
            + self.insurance
            + self.management_fee
            + self.maintenance_repairs
            + self.utilities
            + self.contract_services
            + self.payroll
            + self.marketing
            + self.general_admin
            + self.other_expenses
    }
}

/// One year of the projection. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyProjection {
    pub year: u32,
    pub gross_rental_income: Money,
    pub vacancy_loss: Money,
    /// Other income net of income reductions
    pub other_income: Money,
    pub effective_gross_income: Money,
    #[serde(flatten)]
    pub expenses: ExpenseLines,
    pub total_operating_expenses: Money,
    pub net_operating_income: Money,
    pub debt_service: Money,
    pub cash_flow_before_tax: Money,
    /// Replacement reserve for the year (informational; not deducted from
    /// cash flow before tax)
    pub capital_reserve: Money,
    pub depreciation: Money,
    pub interest_deduction: Money,
    pub principal_paid: Money,
    /// Loan balance at the end of the year
    pub loan_balance: Money,
    pub taxable_income: Money,
    pub tax_liability: Money,
    pub cash_flow_after_tax: Money,
}

/// Sources and uses at acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingSummary {
    pub purchase_price: Money,
    pub down_payment: Money,
    pub closing_costs: Money,
    /// Down payment plus closing costs
    pub initial_investment: Money,
    pub loan_amount: Money,
    pub loan_to_value: Decimal,
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
}

/// A complete ten-year projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionOutput {
    pub financing: FinancingSummary,
    pub projections: Vec<YearlyProjection>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project ten years of income, expenses, debt service and taxes.
pub fn project_cash_flows(
    input: &ProjectionInput,
) -> UnderwritingResult<ComputationOutput<ProjectionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = project_years(
        &input.acquisition,
        &input.operating,
        &input.config,
        &mut warnings,
    )?;

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "10-Year After-Tax Cash Flow Projection",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Pure projection core shared by every entry point.
///
/// Always returns exactly [`PROJECTION_YEARS`] records, years 1..=10 in
/// order. Nothing is retained between calls.
pub fn project_years(
    acquisition: &AcquisitionAssumptions,
    operating: &OperatingAssumptions,
    config: &ModelConfig,
    warnings: &mut Vec<String>,
) -> UnderwritingResult<ProjectionOutput> {
    validate_assumptions(acquisition, operating, warnings)?;
    config.validate()?;

    let financing = summarize_financing(acquisition)?;
    let annual_rate = pct_to_rate(acquisition.interest_rate_pct);
    let structure = acquisition.loan_structure;

    let rent_growth = Decimal::ONE + pct_to_rate(operating.rent_growth_pct);
    let expense_growth = Decimal::ONE + pct_to_rate(operating.expense_growth_pct);
    let vacancy_rate = pct_to_rate(operating.vacancy_rate_pct);
    let management_rate = pct_to_rate(operating.expenses.management_fee_pct);
    let tax_rate = config.tax.combined_rate();

    let units = Decimal::from(operating.unit_count);
    let base_gross_rent = units * operating.avg_monthly_rent_per_unit * dec!(12);
    let base_other_income = operating.other_income - operating.income_reductions;
    let capital_reserve = units * operating.capital_reserve_per_unit;
    let depreciation = acquisition.purchase_price / config.depreciation_life_years;

    debug!(
        "projecting {} units at {} over {PROJECTION_YEARS} years, loan {} ({structure:?})",
        operating.unit_count, acquisition.purchase_price, financing.loan_amount
    );

    let mut balance = financing.loan_amount;
    let mut projections = Vec::with_capacity(PROJECTION_YEARS as usize);

    for year in 1..=PROJECTION_YEARS {
        let exponent = u64::from(year - 1);
        let growth_factor = rent_growth
            .checked_powu(exponent)
            .ok_or_else(|| overflow("rent_growth_pct"))?;
        let expense_factor = expense_growth
            .checked_powu(exponent)
            .ok_or_else(|| overflow("expense_growth_pct"))?;

        // --- Income ---
        let gross_rental_income = base_gross_rent * growth_factor;
        let vacancy_loss = gross_rental_income * vacancy_rate;
        let other_income = base_other_income * growth_factor;
        let effective_gross_income = gross_rental_income - vacancy_loss + other_income;

        // --- Expenses ---
        let base = &operating.expenses;
        let expenses = ExpenseLines {
            property_taxes: base.property_taxes * expense_factor,
            insurance: base.insurance * expense_factor,
            management_fee: effective_gross_income * management_rate,
            maintenance_repairs: base.maintenance_repairs * expense_factor,
            utilities: base.utilities * expense_factor,
            contract_services: base.contract_services * expense_factor,
            payroll: base.payroll * expense_factor,
            marketing: base.marketing * expense_factor,
            general_admin: base.general_admin * expense_factor,
            other_expenses: base.other * expense_factor,
        };
        let total_operating_expenses = expenses.total();
        let net_operating_income = effective_gross_income - total_operating_expenses;

        // --- Debt ---
        let split =
            amortization::amortize_year(balance, annual_rate, structure, financing.monthly_payment)?;
        let debt_service = if split.payments_made == 12 {
            financing.annual_debt_service
        } else {
            split.interest + split.principal
        };
        if balance > Decimal::ZERO && split.closing_balance.is_zero() {
            warnings.push(format!("Loan is fully retired during year {year}"));
        }
        balance = split.closing_balance;

        let cash_flow_before_tax = net_operating_income - debt_service;

        // --- Taxes ---
        let taxable_income =
            (net_operating_income - split.interest - depreciation).max(Decimal::ZERO);
        let tax_liability = taxable_income * tax_rate;
        let cash_flow_after_tax = cash_flow_before_tax - tax_liability;

        projections.push(YearlyProjection {
            year,
            gross_rental_income,
            vacancy_loss,
            other_income,
            effective_gross_income,
            expenses,
            total_operating_expenses,
            net_operating_income,
            debt_service,
            cash_flow_before_tax,
            capital_reserve,
            depreciation,
            interest_deduction: split.interest,
            principal_paid: split.principal,
            loan_balance: balance,
            taxable_income,
            tax_liability,
            cash_flow_after_tax,
        });
    }

    if let Some(first) = projections.first() {
        if first.cash_flow_before_tax < Decimal::ZERO {
            warnings.push(format!(
                "Year 1 cash flow before tax is negative ({:.2})",
                first.cash_flow_before_tax
            ));
        }
    }

    Ok(ProjectionOutput {
        financing,
        projections,
    })
}

/// Down payment, closing costs, loan amount and the level payment.
pub fn summarize_financing(
    acquisition: &AcquisitionAssumptions,
) -> UnderwritingResult<FinancingSummary> {
    let price = acquisition.purchase_price;
    let down_payment = price * pct_to_rate(acquisition.down_payment_pct);
    let closing_costs = price * pct_to_rate(acquisition.closing_cost_pct);
    let loan_amount = price - down_payment;

    if price.is_zero() {
        return Err(UnderwritingError::DivisionByZero {
            context: "LTV calculation (loan / purchase_price)".into(),
        });
    }

    let monthly_payment = amortization::monthly_payment(
        loan_amount,
        pct_to_rate(acquisition.interest_rate_pct),
        acquisition.amortization_years,
        acquisition.loan_structure,
    )?;

    Ok(FinancingSummary {
        purchase_price: price,
        down_payment,
        closing_costs,
        initial_investment: down_payment + closing_costs,
        loan_amount,
        loan_to_value: loan_amount / price,
        monthly_payment,
        annual_debt_service: monthly_payment * dec!(12),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_assumptions(
    acquisition: &AcquisitionAssumptions,
    operating: &OperatingAssumptions,
    warnings: &mut Vec<String>,
) -> UnderwritingResult<()> {
    if acquisition.purchase_price <= Decimal::ZERO {
        return Err(UnderwritingError::invalid(
            "purchase_price",
            "Purchase price must be positive",
        ));
    }
    require_amount("purchase_price", acquisition.purchase_price)?;
    require_percent_range("down_payment_pct", acquisition.down_payment_pct)?;
    require_percent_range("closing_cost_pct", acquisition.closing_cost_pct)?;
    if acquisition.interest_rate_pct < Decimal::ZERO {
        return Err(UnderwritingError::invalid(
            "interest_rate_pct",
            "Interest rate cannot be negative",
        ));
    }
    if acquisition.interest_rate_pct > MAX_RATE_PCT {
        return Err(UnderwritingError::invalid(
            "interest_rate_pct",
            format!("Interest rate cannot exceed {MAX_RATE_PCT}%"),
        ));
    }
    if acquisition.amortization_years == 0
        || acquisition.amortization_years > MAX_AMORTIZATION_YEARS
    {
        return Err(UnderwritingError::invalid(
            "amortization_years",
            format!("Amortization period must be between 1 and {MAX_AMORTIZATION_YEARS} years"),
        ));
    }
    if acquisition.hold_period_years == 0 || acquisition.hold_period_years > PROJECTION_YEARS {
        return Err(UnderwritingError::invalid(
            "hold_period_years",
            format!("Hold period must be between 1 and {PROJECTION_YEARS} years"),
        ));
    }

    if operating.unit_count == 0 || operating.unit_count > MAX_UNIT_COUNT {
        return Err(UnderwritingError::invalid(
            "unit_count",
            format!("Unit count must be between 1 and {MAX_UNIT_COUNT}"),
        ));
    }
    require_amount("avg_monthly_rent_per_unit", operating.avg_monthly_rent_per_unit)?;
    require_percent_range("vacancy_rate_pct", operating.vacancy_rate_pct)?;
    require_growth("rent_growth_pct", operating.rent_growth_pct)?;
    require_growth("expense_growth_pct", operating.expense_growth_pct)?;
    require_amount("other_income", operating.other_income)?;
    require_amount("income_reductions", operating.income_reductions)?;
    require_amount("capital_reserve_per_unit", operating.capital_reserve_per_unit)?;

    let e = &operating.expenses;
    require_percent_range("expenses.management_fee_pct", e.management_fee_pct)?;
    for (field, value) in [
        ("expenses.property_taxes", e.property_taxes),
        ("expenses.insurance", e.insurance),
        ("expenses.maintenance_repairs", e.maintenance_repairs),
        ("expenses.utilities", e.utilities),
        ("expenses.contract_services", e.contract_services),
        ("expenses.payroll", e.payroll),
        ("expenses.marketing", e.marketing),
        ("expenses.general_admin", e.general_admin),
        ("expenses.other", e.other),
    ] {
        require_amount(field, value)?;
    }

    // --- Warnings for unusual assumptions ---
    if acquisition.loan_structure == LoanStructure::InterestOnly {
        if let Some(io_years) = acquisition.interest_only_period_years {
            warnings.push(format!(
                "Interest-only period of {io_years} years is not modelled; \
                 the loan is projected interest-only for all {PROJECTION_YEARS} years"
            ));
        }
    }

    if operating.vacancy_rate_pct > dec!(15) {
        warnings.push(format!(
            "Vacancy rate {:.1}% exceeds 15% — above typical market norms",
            operating.vacancy_rate_pct
        ));
    }

    Ok(())
}

fn require_amount(field: &str, value: Money) -> UnderwritingResult<()> {
    if value < Decimal::ZERO {
        return Err(UnderwritingError::invalid(field, "Value cannot be negative"));
    }
    if value > MAX_AMOUNT {
        return Err(UnderwritingError::invalid(
            field,
            format!("Value cannot exceed {MAX_AMOUNT}"),
        ));
    }
    Ok(())
}

fn require_percent_range(field: &str, value: Percent) -> UnderwritingResult<()> {
    if value < Decimal::ZERO || value > dec!(100) {
        return Err(UnderwritingError::invalid(
            field,
            "Percentage must be between 0 and 100",
        ));
    }
    Ok(())
}

fn require_growth(field: &str, value: Percent) -> UnderwritingResult<()> {
    if value <= dec!(-100) || value > MAX_RATE_PCT {
        return Err(UnderwritingError::invalid(
            field,
            format!("Growth rate must be above -100% and at most {MAX_RATE_PCT}%"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
