use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

use evsolar_core::ProjectAssumptions;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_assumptions(input_json: &str) -> NapiResult<ProjectAssumptions> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

fn parse_decimal(name: &str, raw: &str) -> NapiResult<Decimal> {
    Decimal::from_str(raw.trim())
        .map_err(|e| napi::Error::from_reason(format!("{name}: {e}")))
}

#[derive(Serialize)]
struct PaymentOutput {
    monthly_payment: Decimal,
    annual_payment: Decimal,
}

#[derive(Serialize)]
struct ValidationOutput {
    valid: bool,
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_project(input_json: String) -> NapiResult<String> {
    let input = parse_assumptions(&input_json)?;
    let output = evsolar_core::analyze_project(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compute_cash_flows(input_json: String) -> NapiResult<String> {
    let input = parse_assumptions(&input_json)?;
    evsolar_core::validate_assumptions(&input).map_err(to_napi_error)?;
    let schedule = evsolar_core::metrics::cash_flow_schedule(&input);
    serde_json::to_string(&schedule).map_err(to_napi_error)
}

/// Reports validation failures as data rather than throwing.
#[napi]
pub fn validate_assumptions(input_json: String) -> NapiResult<String> {
    let input = parse_assumptions(&input_json)?;
    let output = match evsolar_core::validate_assumptions(&input) {
        Ok(()) => ValidationOutput {
            valid: true,
            error: None,
        },
        Err(e) => ValidationOutput {
            valid: false,
            error: Some(e.to_string()),
        },
    };
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

/// Decimal arguments are passed as strings to keep full precision.
#[napi]
pub fn monthly_payment(
    principal: String,
    annual_rate_pct: String,
    term_years: u32,
) -> NapiResult<String> {
    let principal = parse_decimal("principal", &principal)?;
    let rate = parse_decimal("annual_rate_pct", &annual_rate_pct)?;
    if principal < Decimal::ZERO || rate < Decimal::ZERO {
        return Err(napi::Error::from_reason(
            "principal and annual_rate_pct cannot be negative",
        ));
    }
    let output = PaymentOutput {
        monthly_payment: evsolar_core::amortization::monthly_payment(principal, rate, term_years),
        annual_payment: evsolar_core::amortization::annual_payment(principal, rate, term_years),
    };
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Sensitivity
// ---------------------------------------------------------------------------

#[napi]
pub fn run_sensitivity(input_json: String) -> NapiResult<String> {
    let input: evsolar_core::sensitivity::SensitivityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = evsolar_core::sensitivity::run_sensitivity(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
