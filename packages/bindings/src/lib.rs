use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;

use underwriting_core::{advisor, amortization, grading, metrics, projection};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse<T: DeserializeOwned>(input_json: &str) -> NapiResult<T> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

#[napi]
pub fn project_cash_flows(input_json: String) -> NapiResult<String> {
    let input: projection::ProjectionInput = parse(&input_json)?;
    let output = projection::project_cash_flows(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_metrics(input_json: String) -> NapiResult<String> {
    let input: projection::ProjectionInput = parse(&input_json)?;
    let output = metrics::calculate_metrics(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn loan_schedule(input_json: String) -> NapiResult<String> {
    let input: amortization::LoanScheduleInput = parse(&input_json)?;
    let output = amortization::build_loan_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Grading
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate_deal(input_json: String) -> NapiResult<String> {
    let input: grading::evaluation::DealInput = parse(&input_json)?;
    let output = grading::evaluation::evaluate_deal(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn classify_property(input_json: String) -> NapiResult<String> {
    let input: grading::classification::PropertyCharacteristics = parse(&input_json)?;
    let output = grading::classification::classify_property(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn grade_deal(input_json: String) -> NapiResult<String> {
    let input: grading::scorecard::GradeInput = parse(&input_json)?;
    let output = grading::scorecard::grade_metrics(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn advise_deal(grade_json: String) -> NapiResult<String> {
    let grade: grading::scorecard::GradeResult = parse(&grade_json)?;
    let output = advisor::generate_advice(&grade);
    serde_json::to_string(&output).map_err(to_napi_error)
}
