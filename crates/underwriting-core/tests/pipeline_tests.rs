use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use underwriting_core::advisor::{self, Outlook};
use underwriting_core::amortization::LoanStructure;
use underwriting_core::config::{ModelConfig, TaxRates};
use underwriting_core::grading::benchmarks::{Benchmark, BenchmarkSource};
use underwriting_core::grading::classification::{AssetClass, ClassificationOverride, MarketTier};
use underwriting_core::grading::evaluation::{self, DealInput};
use underwriting_core::grading::scorecard::{GradeFactor, LetterGrade};
use underwriting_core::projection::{AcquisitionAssumptions, OperatingAssumptions, OperatingExpenses};
use underwriting_core::UnderwritingError;

// ===========================================================================
// Fixtures
// ===========================================================================

fn deal(expenses: OperatingExpenses) -> DealInput {
    DealInput {
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
            expenses,
            expense_growth_pct: dec!(3),
            capital_reserve_per_unit: dec!(300),
        },
        config: ModelConfig::default(),
        benchmark_override: None,
        classification_override: None,
    }
}

/// Year-1 operating expenses of exactly $300,000 (NOI $24,000).
fn heavy_expense_deal() -> DealInput {
    deal(OperatingExpenses {
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
    })
}

/// Year-1 operating expenses of $123,440 (NOI $200,560).
fn lean_expense_deal() -> DealInput {
    deal(OperatingExpenses {
        property_taxes: dec!(40_000),
        insurance: dec!(12_000),
        management_fee_pct: dec!(6),
        maintenance_repairs: dec!(24_000),
        utilities: dec!(18_000),
        contract_services: dec!(4_000),
        payroll: dec!(0),
        marketing: dec!(1_000),
        general_admin: dec!(3_000),
        other: dec!(2_000),
    })
}

// ===========================================================================
// End-to-end
// ===========================================================================

#[test]
fn test_heavy_expense_deal_fails_every_factor() {
    let out = evaluation::evaluate_deal(&heavy_expense_deal()).unwrap();
    let eval = &out.result;

    assert_eq!(eval.metrics.year1_net_operating_income, dec!(24_000));
    assert_eq!(eval.metrics.cap_rate, dec!(1.2));
    assert_eq!(eval.metrics.break_even_year, None);

    // $100k/unit, $1,500 rent, 1.2% cap, 92.6% expenses: 20 + 20 + 20 + 3
    assert_eq!(eval.grade.classification.asset_class, AssetClass::CClass);
    assert_eq!(eval.grade.classification.market_tier, MarketTier::Tier3);
    assert_eq!(eval.benchmark_source, BenchmarkSource::Blended);

    for (factor, score) in &eval.grade.breakdown {
        assert_eq!(*score, dec!(10), "{factor}");
    }
    assert_eq!(eval.grade.score, dec!(10.0));
    assert_eq!(eval.grade.grade, LetterGrade::F);

    assert_eq!(eval.advice.outlook, Outlook::Challenged);
    assert_eq!(eval.advice.improvements.len(), 7);
}

#[test]
fn test_lean_expense_deal_grades_well() {
    let out = evaluation::evaluate_deal(&lean_expense_deal()).unwrap();
    let eval = &out.result;
    let g = &eval.grade;

    assert_eq!(eval.metrics.year1_net_operating_income, dec!(200_560));
    assert_eq!(g.breakdown[&GradeFactor::CapRateVsMarket], dec!(100));
    assert_eq!(g.breakdown[&GradeFactor::CashOnCashVsMarket], dec!(100));
    assert_eq!(g.breakdown[&GradeFactor::DscrVsMarket], dec!(85));
    assert_eq!(g.breakdown[&GradeFactor::RoiAtHorizon], dec!(100));
    assert!(g.score >= dec!(78) && g.score < dec!(92), "score {}", g.score);
    assert!(g.grade <= LetterGrade::AMinus);
    assert_eq!(eval.advice.outlook, Outlook::Proceed);
}

#[test]
fn test_pipeline_is_bit_identical_across_runs() {
    let input = lean_expense_deal();
    let a = evaluation::evaluate_deal(&input).unwrap();
    let b = evaluation::evaluate_deal(&input).unwrap();
    assert_eq!(a.result.grade, b.result.grade);
    assert_eq!(a.result.advice, b.result.advice);
    assert_eq!(
        serde_json::to_string(&a.result.grade).unwrap(),
        serde_json::to_string(&b.result.grade).unwrap()
    );
}

#[test]
fn test_benchmark_override_used_verbatim() {
    let custom = Benchmark {
        avg_irr: dec!(30),
        avg_cash_on_cash: dec!(20),
        avg_dscr: dec!(2.5),
        avg_cap_rate: dec!(15),
        avg_expense_ratio: dec!(25),
    };
    let mut input = lean_expense_deal();
    input.benchmark_override = Some(custom.clone());

    let baseline = evaluation::evaluate_deal(&lean_expense_deal()).unwrap();
    let out = evaluation::evaluate_deal(&input).unwrap();
    assert_eq!(out.result.benchmark, custom);
    assert_eq!(out.result.benchmark_source, BenchmarkSource::Custom);
    // Same projection, harder yardstick
    assert_eq!(out.result.metrics, baseline.result.metrics);
    assert!(out.result.grade.score < baseline.result.grade.score);
}

#[test]
fn test_classification_override_bypasses_heuristic() {
    let mut input = lean_expense_deal();
    input.classification_override = Some(ClassificationOverride {
        asset_class: Some(AssetClass::AClass),
        market_tier: Some(MarketTier::Tier1),
    });
    let out = evaluation::evaluate_deal(&input).unwrap();
    assert_eq!(out.result.grade.classification.asset_class, AssetClass::AClass);
    assert_eq!(out.result.grade.classification.market_tier, MarketTier::Tier1);
    // a-class / tier-1 blend: 0.6 × 8.5 + 0.4 × 8.0
    assert_eq!(out.result.benchmark.avg_irr, dec!(8.3));
}

#[test]
fn test_advice_leaves_grade_untouched() {
    let out = evaluation::evaluate_deal(&heavy_expense_deal()).unwrap();
    let grade = out.result.grade.clone();
    let advice = advisor::advise(&grade);
    assert_eq!(grade, out.result.grade);
    assert_eq!(advice, out.result.advice);
}

#[test]
fn test_zero_investment_still_grades() {
    let mut input = lean_expense_deal();
    input.acquisition.down_payment_pct = dec!(0);
    input.acquisition.closing_cost_pct = dec!(0);
    let out = evaluation::evaluate_deal(&input).unwrap();
    let eval = &out.result;
    assert_eq!(eval.metrics.cash_on_cash, None);
    assert_eq!(eval.metrics.total_roi, None);
    assert_eq!(eval.grade.breakdown[&GradeFactor::CashOnCashVsMarket], dec!(10));
    assert_eq!(eval.grade.breakdown[&GradeFactor::RoiAtHorizon], dec!(10));
    assert!(out.warnings.iter().any(|w| w.contains("Initial investment is zero")));
}

#[test]
fn test_tax_config_changes_after_tax_only() {
    let mut untaxed = lean_expense_deal();
    untaxed.config.tax = TaxRates {
        federal_pct: Decimal::ZERO,
        state_local_pct: Decimal::ZERO,
        surtax_pct: Decimal::ZERO,
    };
    let taxed = evaluation::evaluate_deal(&lean_expense_deal()).unwrap();
    let untaxed = evaluation::evaluate_deal(&untaxed).unwrap();

    let (t1, u1) = (&taxed.result.projections[0], &untaxed.result.projections[0]);
    assert_eq!(t1.net_operating_income, u1.net_operating_income);
    assert_eq!(t1.cash_flow_before_tax, u1.cash_flow_before_tax);
    assert_eq!(u1.tax_liability, Decimal::ZERO);
    assert!(u1.cash_flow_after_tax > t1.cash_flow_after_tax);
}

#[test]
fn test_invalid_input_returns_no_partial_result() {
    let mut input = lean_expense_deal();
    input.operating.vacancy_rate_pct = dec!(120);
    match evaluation::evaluate_deal(&input) {
        Err(UnderwritingError::InvalidInput { field, .. }) => {
            assert_eq!(field, "vacancy_rate_pct")
        }
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn test_extreme_financing_terms_are_rejected() {
    let mut input = lean_expense_deal();
    input.acquisition.interest_rate_pct = dec!(300);
    let result = std::panic::catch_unwind(|| evaluation::evaluate_deal(&input));
    match result {
        Ok(Err(UnderwritingError::InvalidInput { field, .. })) => {
            assert_eq!(field, "interest_rate_pct")
        }
        Ok(other) => panic!("Expected InvalidInput, got {other:?}"),
        Err(_) => panic!("evaluation panicked"),
    }

    let mut input = lean_expense_deal();
    input.config.appreciation_pct = dec!(1_000_000);
    assert!(evaluation::evaluate_deal(&input).is_err());
}

#[test]
fn test_deal_input_from_json_with_defaults() {
    let json = r#"{
        "acquisition": {
            "purchase_price": "2000000",
            "down_payment_pct": "25",
            "closing_cost_pct": "3",
            "interest_rate_pct": "7",
            "amortization_years": 30,
            "hold_period_years": 10
        },
        "operating": {
            "unit_count": 20,
            "avg_monthly_rent_per_unit": "1500",
            "vacancy_rate_pct": "10",
            "rent_growth_pct": "2",
            "expenses": { "property_taxes": "40000", "management_fee_pct": "6" },
            "expense_growth_pct": "3"
        }
    }"#;
    let input: DealInput = serde_json::from_str(json).unwrap();
    assert_eq!(input.acquisition.loan_structure, LoanStructure::Amortizing);
    assert_eq!(input.config, ModelConfig::default());
    assert!(input.benchmark_override.is_none());
    assert!(evaluation::evaluate_deal(&input).is_ok());
}
