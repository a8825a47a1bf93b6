use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, instrument};

use crate::assumptions::{validate_assumptions, Financing, ProjectAssumptions};
use crate::error::EvSolarError;
use crate::metrics::{compute_metrics, FinancialMetrics};
use crate::types::{with_metadata, ComputationOutput};
use crate::EvSolarResult;

/// Upper bound on sweep points per axis.
const MAX_SWEEP_POINTS: usize = 200;

/// Assumption fields the grid can override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Driver {
    PricePerKwh,
    SessionsPerDay,
    CostPerStation,
    CostPerWatt,
    GridRate,
    BaseTaxCredit,
    PriceEscalation,
    UtilityEscalation,
    /// Loan APR in whole percent; loan-financed projects only
    LoanRatePct,
}

/// Metric recorded in each grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityMetric {
    Npv,
    IrrPct,
    PaybackYears,
    RoiPct,
}

/// One axis of the grid, swept inclusively from `min` to `max`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub driver: Driver,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

/// Input for 2-way sensitivity analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    /// Base case assumptions; each cell overrides two fields
    pub base: ProjectAssumptions,
    pub variable_1: SensitivityVariable,
    pub variable_2: SensitivityVariable,
    pub metric: SensitivityMetric,
}

/// Output of 2-way sensitivity analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub variable_1: Driver,
    pub variable_2: Driver,
    pub variable_1_values: Vec<Decimal>,
    pub variable_2_values: Vec<Decimal>,
    pub metric: SensitivityMetric,
    /// matrix[i][j] = metric when variable_1 = values_1[i], variable_2 = values_2[j].
    /// `None` where the metric is unavailable (no IRR, payback not reached).
    pub matrix: Vec<Vec<Option<Decimal>>>,
    pub base_case_value: Option<Decimal>,
    /// Position of the base case in the matrix (row, col)
    pub base_case_position: (usize, usize),
}

/// Generate the sweep values for a sensitivity variable from min to max with step.
fn generate_sweep_values(var: &SensitivityVariable) -> EvSolarResult<Vec<Decimal>> {
    let field = format!("variable:{:?}", var.driver);
    if var.step <= Decimal::ZERO {
        return Err(EvSolarError::InvalidInput {
            field,
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(EvSolarError::InvalidInput {
            field,
            reason: "Min must be <= max".into(),
        });
    }
    if var.min < Decimal::ZERO {
        return Err(EvSolarError::InvalidInput {
            field,
            reason: "Sweep values cannot be negative".into(),
        });
    }
    let points = (var.max - var.min).checked_div(var.step);
    if points.map_or(true, |n| n > Decimal::from(MAX_SWEEP_POINTS)) {
        return Err(EvSolarError::InvalidInput {
            field,
            reason: format!("Sweep exceeds {MAX_SWEEP_POINTS} points"),
        });
    }

    let mut values = Vec::new();
    let mut current = Some(var.min);
    while let Some(value) = current.filter(|v| *v <= var.max) {
        values.push(value);
        current = value.checked_add(var.step);
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }

    Ok(values)
}

/// Find the closest index to a target value in a sorted list.
fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Overwrite one driver on a copy of the base assumptions.
fn apply_driver(
    input: &mut ProjectAssumptions,
    driver: Driver,
    value: Decimal,
) -> EvSolarResult<()> {
    match driver {
        Driver::PricePerKwh => input.ev.price_per_kwh = value,
        Driver::SessionsPerDay => input.ev.sessions_per_day = value,
        Driver::CostPerStation => input.ev.cost_per_station = value,
        Driver::CostPerWatt => input.solar.cost_per_watt = value,
        Driver::GridRate => input.operating.grid_rate_per_kwh = value,
        Driver::BaseTaxCredit => input.incentives.base_tax_credit = value,
        Driver::PriceEscalation => input.ev.price_escalation = value,
        Driver::UtilityEscalation => input.operating.utility_escalation = value,
        Driver::LoanRatePct => match &mut input.financing {
            Financing::Loan {
                annual_rate_pct, ..
            } => *annual_rate_pct = value,
            Financing::Cash => {
                return Err(EvSolarError::InvalidInput {
                    field: "variable:LoanRatePct".into(),
                    reason: "Loan rate sweep requires loan financing".into(),
                })
            }
        },
    }
    Ok(())
}

fn midpoint(var: &SensitivityVariable) -> Decimal {
    var.min + (var.max - var.min) / dec!(2)
}

fn read_metric(metrics: &FinancialMetrics, metric: SensitivityMetric) -> Option<Decimal> {
    match metric {
        SensitivityMetric::Npv => metrics.npv,
        SensitivityMetric::IrrPct => metrics.irr_pct,
        SensitivityMetric::PaybackYears => metrics.payback_period_years,
        SensitivityMetric::RoiPct => Some(metrics.roi_pct),
    }
}

/// Evaluate a 2-way sensitivity grid by recomputing the full metrics bundle
/// for every combination of the two drivers.
#[instrument(level = "debug", skip_all, fields(metric = ?input.metric))]
pub fn run_sensitivity(
    input: &SensitivityInput,
) -> EvSolarResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_assumptions(&input.base)?;
    if input.variable_1.driver == input.variable_2.driver {
        return Err(EvSolarError::InvalidInput {
            field: "variable_2".into(),
            reason: "Both axes sweep the same driver".into(),
        });
    }

    let v1_values = generate_sweep_values(&input.variable_1)?;
    let v2_values = generate_sweep_values(&input.variable_2)?;

    let mut matrix = Vec::with_capacity(v1_values.len());
    let mut unavailable = 0usize;

    for v1 in &v1_values {
        let mut row = Vec::with_capacity(v2_values.len());
        for v2 in &v2_values {
            let mut scenario = input.base.clone();
            apply_driver(&mut scenario, input.variable_1.driver, *v1)?;
            apply_driver(&mut scenario, input.variable_2.driver, *v2)?;

            let value = read_metric(&compute_metrics(&scenario), input.metric);
            if value.is_none() {
                unavailable += 1;
            }
            row.push(value);
        }
        matrix.push(row);
    }

    debug!(
        rows = v1_values.len(),
        cols = v2_values.len(),
        unavailable,
        "Evaluated sensitivity grid"
    );
    if unavailable > 0 {
        warnings.push(format!(
            "{unavailable} cell(s) have no {:?} value",
            input.metric
        ));
    }

    let mid1 = midpoint(&input.variable_1);
    let mid2 = midpoint(&input.variable_2);
    let base_row = closest_index(&v1_values, mid1);
    let base_col = closest_index(&v2_values, mid2);
    let base_case_value = matrix[base_row][base_col];

    let output = SensitivityOutput {
        variable_1: input.variable_1.driver,
        variable_2: input.variable_2.driver,
        variable_1_values: v1_values,
        variable_2_values: v2_values,
        metric: input.metric,
        matrix,
        base_case_value,
        base_case_position: (base_row, base_col),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "2-Way Sensitivity Analysis (EV + Solar Project Model)",
        &serde_json::json!({
            "variable_1": input.variable_1.driver,
            "variable_2": input.variable_2.driver,
            "metric": input.metric,
        }),
        warnings,
        elapsed,
        output,
    ))
}
