use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use underwriting_core::amortization::{self, LoanScheduleInput, LoanStructure};
use underwriting_core::metrics;
use underwriting_core::projection::{
    self, AcquisitionAssumptions, OperatingAssumptions, OperatingExpenses, ProjectionInput,
};
use underwriting_core::UnderwritingError;

// ===========================================================================
// Fixtures
// ===========================================================================

fn reference_deal() -> ProjectionInput {
    // 20 units at $1,500, $2M purchase, 25% down at 7% over 30 years.
    // Fixed expenses of $280,560 plus a 6% management fee on $324,000 EGI
    // bring year-1 operating expenses to exactly $300,000.
    ProjectionInput {
        acquisition: AcquisitionAssumptions {
            purchase_price: dec!(2_000_000),
            down_payment_pct: dec!(25),
            closing_cost_pct: dec!(3),
            interest_rate_pct: dec!(7),
            amortization_years: 30,
            loan_structure: LoanStructure::Amortizing,
            interest_only_period_years: None,
            hold_period_years: 10,
        },
        operating: OperatingAssumptions {
            unit_count: 20,
            avg_monthly_rent_per_unit: dec!(1500),
            vacancy_rate_pct: dec!(10),
            rent_growth_pct: dec!(2),
            other_income: dec!(0),
            income_reductions: dec!(0),
            expenses: OperatingExpenses {
                property_taxes: dec!(120_000),
                insurance: dec!(40_000),
                management_fee_pct: dec!(6),
                maintenance_repairs: dec!(60_000),
                utilities: dec!(36_000),
                contract_services: dec!(10_000),
                payroll: dec!(8_000),
                marketing: dec!(2_000),
                general_admin: dec!(3_000),
                other: dec!(1_560),
            },
            expense_growth_pct: dec!(3),
            capital_reserve_per_unit: dec!(300),
        },
        config: Default::default(),
    }
}

fn with_structure(structure: LoanStructure, rate_pct: Decimal, term: u32) -> ProjectionInput {
    let mut input = reference_deal();
    input.acquisition.loan_structure = structure;
    input.acquisition.interest_rate_pct = rate_pct;
    input.acquisition.amortization_years = term;
    input
}

// ===========================================================================
// Reference scenario
// ===========================================================================

#[test]
fn test_reference_deal_year_one() {
    let out = metrics::calculate_metrics(&reference_deal()).unwrap();
    let y1 = &out.result.projections[0];
    let m = &out.result.metrics;

    assert_eq!(y1.gross_rental_income, dec!(360_000));
    assert_eq!(y1.vacancy_loss, dec!(36_000));
    assert_eq!(y1.effective_gross_income, dec!(324_000));
    assert_eq!(y1.expenses.management_fee, dec!(19_440));
    assert_eq!(y1.total_operating_expenses, dec!(300_000));
    assert_eq!(y1.net_operating_income, dec!(24_000));
    assert_eq!(y1.capital_reserve, dec!(6_000));

    // 24,000 / 2,000,000
    assert_eq!(m.cap_rate, dec!(1.2));
    let expected_dscr = dec!(24_000) / out.result.financing.annual_debt_service;
    assert_eq!(m.dscr, Some(expected_dscr));
    assert_eq!(
        m.dscr.unwrap().round_dp(2),
        dec!(0.20),
        "debt service is ~$119,755 a year"
    );

    // Negative cash flow and the weak coverage are both flagged
    assert!(out.warnings.iter().any(|w| w.contains("negative")));
    assert!(out.warnings.iter().any(|w| w.contains("DSCR")));
}

#[test]
fn test_reference_deal_financing() {
    let out = projection::project_cash_flows(&reference_deal()).unwrap();
    let f = &out.result.financing;
    assert_eq!(f.down_payment, dec!(500_000));
    assert_eq!(f.closing_costs, dec!(60_000));
    assert_eq!(f.initial_investment, dec!(560_000));
    assert_eq!(f.loan_amount, dec!(1_500_000));
    assert_eq!(f.loan_to_value, dec!(0.75));
    assert_eq!(f.monthly_payment.round_dp(2), dec!(9979.54));
    assert_eq!(f.annual_debt_service, f.monthly_payment * dec!(12));
}

#[test]
fn test_reference_deal_reproducible() {
    let a = metrics::calculate_metrics(&reference_deal()).unwrap();
    let b = metrics::calculate_metrics(&reference_deal()).unwrap();
    assert_eq!(a.result.projections, b.result.projections);
    assert_eq!(a.result.metrics, b.result.metrics);
}

// ===========================================================================
// Invariants
// ===========================================================================

#[test]
fn test_amortization_conservation_across_terms() {
    let tolerance = dec!(0.000001);
    for (rate, term) in [(dec!(7), 30), (dec!(4.25), 15), (dec!(0), 25), (dec!(9), 5)] {
        let out =
            projection::project_cash_flows(&with_structure(LoanStructure::Amortizing, rate, term))
                .unwrap();
        let mut previous = out.result.financing.loan_amount;
        for p in &out.result.projections {
            assert!(p.loan_balance >= Decimal::ZERO, "year {} went negative", p.year);
            assert!(p.loan_balance <= previous, "year {} balance rose", p.year);
            let drift = (p.principal_paid + p.loan_balance - previous).abs();
            assert!(drift <= tolerance, "year {}: drift {drift}", p.year);
            previous = p.loan_balance;
        }
    }
}

#[test]
fn test_income_and_noi_identities_hold_exactly() {
    let mut input = reference_deal();
    input.operating.other_income = dec!(14_400);
    input.operating.income_reductions = dec!(2_400);
    let out = projection::project_cash_flows(&input).unwrap();
    for p in &out.result.projections {
        assert_eq!(
            p.effective_gross_income,
            p.gross_rental_income - p.vacancy_loss + p.other_income
        );
        assert_eq!(
            p.net_operating_income,
            p.effective_gross_income - p.total_operating_expenses
        );
        assert_eq!(p.total_operating_expenses, p.expenses.total());
    }
}

#[test]
fn test_interest_only_balance_never_moves() {
    let out = projection::project_cash_flows(&with_structure(
        LoanStructure::InterestOnly,
        dec!(6.5),
        30,
    ))
    .unwrap();
    let loan = out.result.financing.loan_amount;
    for p in &out.result.projections {
        assert_eq!(p.principal_paid, Decimal::ZERO);
        assert_eq!(p.loan_balance, loan);
        assert_eq!(p.interest_deduction, loan * dec!(0.065));
        assert!((p.debt_service - p.interest_deduction).abs() < dec!(0.000001));
    }
}

#[test]
fn test_zero_rate_payment_is_straight_line() {
    let out = projection::project_cash_flows(&with_structure(
        LoanStructure::Amortizing,
        dec!(0),
        30,
    ))
    .unwrap();
    let f = &out.result.financing;
    assert_eq!(f.monthly_payment, dec!(1_500_000) / dec!(360));
    for p in &out.result.projections {
        assert_eq!(p.interest_deduction, Decimal::ZERO);
        assert!((p.principal_paid - dec!(50_000)).abs() < dec!(0.000001));
    }
}

#[test]
fn test_loan_retired_inside_window() {
    let input = with_structure(LoanStructure::Amortizing, dec!(6), 4);
    let out = projection::project_cash_flows(&input).unwrap();
    let rows = &out.result.projections;
    assert_eq!(rows[3].loan_balance, Decimal::ZERO);
    for p in &rows[4..] {
        assert_eq!(p.debt_service, Decimal::ZERO);
        assert_eq!(p.cash_flow_before_tax, p.net_operating_income);
    }
    assert!(out.warnings.iter().any(|w| w.contains("retired")));
}

// ===========================================================================
// Degenerate metrics and validation
// ===========================================================================

#[test]
fn test_zero_investment_reports_undefined() {
    let mut input = reference_deal();
    input.acquisition.down_payment_pct = dec!(0);
    input.acquisition.closing_cost_pct = dec!(0);
    let out = metrics::calculate_metrics(&input).unwrap();
    let m = &out.result.metrics;
    assert_eq!(out.result.financing.initial_investment, Decimal::ZERO);
    assert_eq!(m.cash_on_cash, None);
    assert_eq!(m.total_roi, None);
    assert_eq!(m.annualized_return, None);
    // Still computed: they don't depend on the investment
    assert!(m.dscr.is_some());
    assert_eq!(m.cap_rate, dec!(1.2));

    let json = serde_json::to_value(m).unwrap();
    assert!(json["cash_on_cash"].is_null());
}

#[test]
fn test_validation_rejects_before_computing() {
    let mut input = reference_deal();
    input.operating.unit_count = 0;
    match projection::project_cash_flows(&input).unwrap_err() {
        UnderwritingError::InvalidInput { field, .. } => assert_eq!(field, "unit_count"),
        other => panic!("Expected InvalidInput, got {other:?}"),
    }

    let mut input = reference_deal();
    input.acquisition.interest_rate_pct = dec!(-0.5);
    assert!(metrics::calculate_metrics(&input).is_err());

    let mut input = reference_deal();
    input.acquisition.amortization_years = 0;
    assert!(projection::project_cash_flows(&input).is_err());
}

#[test]
fn test_loan_schedule_matches_projection_split() {
    let projection = projection::project_cash_flows(&reference_deal()).unwrap();
    let schedule = amortization::build_loan_schedule(&LoanScheduleInput {
        loan_amount: projection.result.financing.loan_amount,
        interest_rate_pct: dec!(7),
        amortization_years: 30,
        loan_structure: LoanStructure::Amortizing,
        years: Some(10),
    })
    .unwrap();

    assert_eq!(schedule.result.schedule.len(), 10);
    for (row, p) in schedule.result.schedule.iter().zip(&projection.result.projections) {
        assert_eq!(row.interest, p.interest_deduction);
        assert_eq!(row.principal, p.principal_paid);
        assert_eq!(row.closing_balance, p.loan_balance);
    }
}

#[test]
fn test_loan_schedule_rejects_unrepresentable_terms() {
    let result = std::panic::catch_unwind(|| {
        amortization::build_loan_schedule(&LoanScheduleInput {
            loan_amount: dec!(1_000_000),
            interest_rate_pct: dec!(300),
            amortization_years: 30,
            loan_structure: LoanStructure::Amortizing,
            years: None,
        })
    });
    match result {
        Ok(Err(UnderwritingError::InvalidInput { field, .. })) => {
            assert_eq!(field, "interest_rate")
        }
        Ok(other) => panic!("Expected InvalidInput, got {other:?}"),
        Err(_) => panic!("schedule panicked"),
    }
}
