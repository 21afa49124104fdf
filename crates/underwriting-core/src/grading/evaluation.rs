use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::benchmarks::{self, Benchmark, BenchmarkSource};
use super::classification::{self, ClassificationOverride, PropertyCharacteristics};
use super::scorecard::{self, GradeMetrics, GradeResult};
use crate::config::ModelConfig;
use crate::metrics::{self, MetricsBundle};
use crate::projection::{
    self, AcquisitionAssumptions, FinancingSummary, OperatingAssumptions, YearlyProjection,
};
use crate::types::{with_metadata, ComputationOutput};
use crate::UnderwritingResult;

#[cfg(feature = "advisor")]
use crate::advisor::{self, Advice};

/// Everything needed to underwrite and grade a deal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealInput {
    pub acquisition: AcquisitionAssumptions,
    pub operating: OperatingAssumptions,
    #[serde(default)]
    pub config: ModelConfig,
    /// Grade against this benchmark instead of the blended tables
    #[serde(default)]
    pub benchmark_override: Option<Benchmark>,
    /// Bypass the classification heuristic per dimension
    #[serde(default)]
    pub classification_override: Option<ClassificationOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealEvaluation {
    pub financing: FinancingSummary,
    pub projections: Vec<YearlyProjection>,
    pub metrics: MetricsBundle,
    pub benchmark: Benchmark,
    pub benchmark_source: BenchmarkSource,
    pub grade: GradeResult,
    #[cfg(feature = "advisor")]
    pub advice: Advice,
}

/// Run the full pipeline: projection, metrics, classification, benchmark,
/// grade and (with the `advisor` feature) advice.
pub fn evaluate_deal(input: &DealInput) -> UnderwritingResult<ComputationOutput<DealEvaluation>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let evaluation = evaluate(input, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "10-Year Projection with Benchmark-Relative Seven-Factor Grade",
        input,
        warnings,
        elapsed,
        evaluation,
    ))
}

/// Pipeline core without the envelope. Each stage is a pure function of
/// the previous stage's output.
pub fn evaluate(input: &DealInput, warnings: &mut Vec<String>) -> UnderwritingResult<DealEvaluation> {
    if let Some(custom) = &input.benchmark_override {
        custom.validate()?;
    }

    let projection = projection::project_years(
        &input.acquisition,
        &input.operating,
        &input.config,
        warnings,
    )?;
    let metrics =
        metrics::compute_metrics(&projection, &input.acquisition, &input.config, warnings)?;

    let characteristics = PropertyCharacteristics {
        purchase_price: input.acquisition.purchase_price,
        unit_count: input.operating.unit_count,
        avg_monthly_rent_per_unit: input.operating.avg_monthly_rent_per_unit,
        cap_rate: Some(metrics.cap_rate),
        expense_ratio: metrics.expense_ratio,
    };
    let overrides = input.classification_override.unwrap_or_default();
    let detected = if overrides.asset_class.is_some() && overrides.market_tier.is_some() {
        Default::default()
    } else {
        classification::classify_with_scores(&characteristics, warnings).classification
    };
    let classification = overrides.apply(detected);
    debug!(
        "classified as {} / {}",
        classification.asset_class, classification.market_tier
    );

    let (benchmark, benchmark_source) =
        benchmarks::resolve_benchmark(&classification, input.benchmark_override.as_ref());
    let grade = scorecard::grade_deal(&GradeMetrics::from(&metrics), classification, &benchmark);

    #[cfg(feature = "advisor")]
    let advice = advisor::advise(&grade);

    Ok(DealEvaluation {
        financing: projection.financing,
        projections: projection.projections,
        metrics,
        benchmark,
        benchmark_source,
        grade,
        #[cfg(feature = "advisor")]
        advice,
    })
}
