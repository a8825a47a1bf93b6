use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, instrument};

use crate::amortization::monthly_payment;
use crate::assumptions::{validate_assumptions, Financing, ProjectAssumptions};
use crate::depreciation::depreciable_basis;
use crate::projection::{
    energy_balance, is_saturated, net_cash_flows, project_cash_flows, CashFlowYear,
};
use crate::time_value::{irr, npv, payback_period};
use crate::types::{with_metadata, ComputationOutput, Kwh, Money, Rate, Years};
use crate::EvSolarResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Upfront cost, incentive and financing figures derived from the assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTotals {
    pub ev_capital_cost: Money,
    pub solar_capital_cost: Money,
    /// Zero when no battery is configured
    pub battery_capital_cost: Money,
    pub total_project_cost: Money,
    pub base_tax_credit_amount: Money,
    pub additional_tax_credit_amount: Money,
    pub utility_rebate_amount: Money,
    pub total_incentives: Money,
    /// Total cost less all incentives; the upfront investment
    pub net_project_cost: Money,
    /// Total cost less half of the base tax credit
    pub depreciable_basis: Money,
    /// Total cost less down payment (zero for cash projects)
    pub loan_principal: Money,
    pub monthly_loan_payment: Money,
    pub discount_rate: Rate,
    pub annual_ev_demand_kwh: Kwh,
    pub annual_solar_used_kwh: Kwh,
    pub annual_grid_energy_kwh: Kwh,
    /// Units x capacity x depth of discharge
    pub battery_usable_capacity_kwh: Kwh,
}

/// Horizon totals of the schedule's line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifetimeSummary {
    pub total_revenue: Money,
    pub total_grid_cost: Money,
    pub total_maintenance_cost: Money,
    pub total_loan_payments: Money,
    pub total_taxes: Money,
    pub total_net_cash_flow: Money,
    pub total_discounted_cash_flow: Money,
}

/// Investment metrics for one assumption snapshot.
///
/// `irr_pct`, `roi_pct` and `annualized_roi_pct` are percentages (12.5 =
/// 12.5%); every other rate in the crate is a decimal fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub total_project_cost: Money,
    pub total_incentives: Money,
    pub net_project_cost: Money,
    /// `None` when Newton-Raphson could not settle on a rate
    pub irr_pct: Option<Decimal>,
    /// `None` when the discount rate cannot discount the flows
    pub npv: Option<Money>,
    /// `None` when the investment is not recovered within the horizon
    pub payback_period_years: Option<Years>,
    pub roi_pct: Decimal,
    pub annualized_roi_pct: Decimal,
    pub totals: ProjectTotals,
    pub summary: LifetimeSummary,
    pub cash_flows: Vec<CashFlowYear>,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Capital cost, incentives, depreciable basis, loan sizing and energy split.
pub fn project_totals(input: &ProjectAssumptions) -> ProjectTotals {
    let ev = &input.ev;
    let stations = Decimal::from(ev.num_stations);

    let ev_capital_cost = stations.saturating_mul(ev.cost_per_station);
    let solar_capital_cost = input
        .solar
        .system_size_kw
        .saturating_mul(dec!(1000))
        .saturating_mul(input.solar.cost_per_watt);
    let (battery_capital_cost, battery_usable_capacity_kwh) =
        input.battery.as_ref().map_or((Decimal::ZERO, Decimal::ZERO), |b| {
            let units = Decimal::from(b.num_units);
            (
                units.saturating_mul(b.unit_cost),
                units
                    .saturating_mul(b.capacity_kwh)
                    .saturating_mul(b.depth_of_discharge),
            )
        });
    let total_project_cost = ev_capital_cost
        .saturating_add(solar_capital_cost)
        .saturating_add(battery_capital_cost);

    let inc = &input.incentives;
    let base_tax_credit_amount = total_project_cost.saturating_mul(inc.base_tax_credit);
    let additional_tax_credit_amount = total_project_cost
        .saturating_mul(inc.additional_tax_credit.unwrap_or(Decimal::ZERO));
    let utility_rebate_amount = stations.saturating_mul(inc.utility_rebate_per_station);
    let total_incentives = base_tax_credit_amount
        .saturating_add(additional_tax_credit_amount)
        .saturating_add(utility_rebate_amount);

    let (loan_principal, monthly_loan_payment) = match &input.financing {
        Financing::Loan {
            annual_rate_pct,
            term_years,
            down_payment,
        } => {
            let principal = total_project_cost.saturating_sub(*down_payment).max(Decimal::ZERO);
            (principal, monthly_payment(principal, *annual_rate_pct, *term_years))
        }
        Financing::Cash => (Decimal::ZERO, Decimal::ZERO),
    };

    let energy = energy_balance(input);

    ProjectTotals {
        ev_capital_cost,
        solar_capital_cost,
        battery_capital_cost,
        total_project_cost,
        base_tax_credit_amount,
        additional_tax_credit_amount,
        utility_rebate_amount,
        total_incentives,
        net_project_cost: total_project_cost.saturating_sub(total_incentives),
        depreciable_basis: depreciable_basis(total_project_cost, base_tax_credit_amount),
        loan_principal,
        monthly_loan_payment,
        discount_rate: input.discount_rate(),
        annual_ev_demand_kwh: energy.ev_demand_kwh,
        annual_solar_used_kwh: energy.solar_used_kwh,
        annual_grid_energy_kwh: energy.grid_energy_kwh,
        battery_usable_capacity_kwh,
    }
}

/// Totals and schedule without the derived metrics.
pub fn cash_flow_schedule(input: &ProjectAssumptions) -> Vec<CashFlowYear> {
    project_cash_flows(input, &project_totals(input))
}

/// The engine: one assumption snapshot in, a complete metrics bundle out.
///
/// Pure and idempotent. Input is assumed to be validated; see
/// [`validate_assumptions`] and [`analyze_project`].
#[instrument(level = "debug", skip_all, fields(years = input.operational_years()))]
pub fn compute_metrics(input: &ProjectAssumptions) -> FinancialMetrics {
    let totals = project_totals(input);
    let cash_flows = project_cash_flows(input, &totals);
    let flows = net_cash_flows(&cash_flows);
    let initial_investment = totals.net_project_cost;

    let project_npv = npv(&flows, totals.discount_rate, initial_investment);
    let project_irr = irr(&flows, initial_investment);
    let payback_period_years = payback_period(&flows, initial_investment);

    let total_net_cash_flow = saturating_sum(flows.iter().copied());
    // Fully subsidised projects have no investment to return on.
    let roi = if initial_investment <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        total_net_cash_flow
            .saturating_sub(initial_investment)
            .checked_div(initial_investment)
            .unwrap_or(Decimal::MAX)
    };
    let years = input.operational_years();
    let annualized_roi = if years == 0 {
        Decimal::ZERO
    } else {
        roi / Decimal::from(years)
    };

    debug!(
        npv = ?project_npv,
        irr = ?project_irr,
        payback = ?payback_period_years,
        "Computed project metrics"
    );

    let summary = LifetimeSummary {
        total_revenue: saturating_sum(cash_flows.iter().map(|y| y.revenue)),
        total_grid_cost: saturating_sum(cash_flows.iter().map(|y| y.grid_cost)),
        total_maintenance_cost: saturating_sum(cash_flows.iter().map(|y| y.maintenance_cost)),
        total_loan_payments: saturating_sum(cash_flows.iter().map(|y| y.loan_payment)),
        total_taxes: saturating_sum(cash_flows.iter().map(|y| y.taxes)),
        total_net_cash_flow,
        total_discounted_cash_flow: saturating_sum(
            cash_flows.iter().map(|y| y.discounted_cash_flow),
        ),
    };

    FinancialMetrics {
        total_project_cost: totals.total_project_cost,
        total_incentives: totals.total_incentives,
        net_project_cost: totals.net_project_cost,
        irr_pct: project_irr.map(to_percent),
        npv: project_npv,
        payback_period_years,
        roi_pct: to_percent(roi),
        annualized_roi_pct: to_percent(annualized_roi),
        totals,
        summary,
        cash_flows,
    }
}

/// Fraction to percentage. The only place the crate scales by 100.
pub fn to_percent(fraction: Decimal) -> Decimal {
    fraction.saturating_mul(dec!(100))
}

fn saturating_sum(values: impl Iterator<Item = Money>) -> Money {
    values.fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Validate, run the engine and wrap the result with methodology, warnings
/// and timing metadata.
#[instrument(level = "debug", skip_all)]
pub fn analyze_project(
    input: &ProjectAssumptions,
) -> EvSolarResult<ComputationOutput<FinancialMetrics>> {
    let start = Instant::now();

    validate_assumptions(input)?;

    let metrics = compute_metrics(input);
    let warnings = collect_warnings(input, &metrics);

    let financing = match &input.financing {
        Financing::Cash => "cash".to_string(),
        Financing::Loan {
            annual_rate_pct,
            term_years,
            ..
        } => format!("loan {annual_rate_pct}% / {term_years}y"),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "EV Charging + Solar Project Cash Flow Model (MACRS depreciation, Newton-Raphson IRR)",
        &serde_json::json!({
            "num_stations": input.ev.num_stations,
            "solar_system_size_kw": input.solar.system_size_kw.to_string(),
            "battery_enabled": input.battery.is_some(),
            "operational_years": input.operational_years(),
            "financing": financing,
            "discount_rate": metrics.totals.discount_rate.to_string(),
        }),
        warnings,
        elapsed,
        metrics,
    ))
}

fn collect_warnings(input: &ProjectAssumptions, metrics: &FinancialMetrics) -> Vec<String> {
    let mut warnings = Vec::new();
    let years = input.operational_years();

    if let Some(year) = metrics.cash_flows.iter().find(|y| is_saturated(y)) {
        warnings.push(format!(
            "Projection exceeds the decimal range from year {}: figures are saturated",
            year.year
        ));
    }

    if metrics.net_project_cost <= Decimal::ZERO {
        warnings.push(
            "Incentives cover the full project cost: ROI and IRR are not meaningful".into(),
        );
    }

    match metrics.irr_pct {
        None => warnings.push(
            "IRR unavailable: Newton-Raphson did not converge from a 10% initial guess".into(),
        ),
        Some(irr) if irr < Decimal::ZERO => {
            warnings.push(format!("IRR of {}% is negative", irr.round_dp(2)));
        }
        Some(_) => {}
    }

    match metrics.npv {
        None => warnings.push("NPV unavailable: cash flows could not be discounted".into()),
        Some(npv) if npv < Decimal::ZERO => warnings.push(format!(
            "NPV of {} is negative at a {}% discount rate",
            npv.round_dp(2),
            to_percent(metrics.totals.discount_rate).round_dp(2)
        )),
        Some(_) => {}
    }

    match metrics.payback_period_years {
        None => warnings.push(format!(
            "Investment is not recovered within the {years}-year horizon"
        )),
        Some(payback) if payback > Decimal::from(years) * dec!(0.70) => warnings.push(format!(
            "Payback period of {} years exceeds 70% of the horizon",
            payback.round_dp(2)
        )),
        Some(_) => {}
    }

    if metrics
        .cash_flows
        .first()
        .is_some_and(|y| y.net_cash_flow < Decimal::ZERO)
    {
        warnings.push("Year 1 net cash flow is negative".into());
    }

    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvSolarError;
    use crate::test_support::{reference_project, with_battery};

    #[test]
    fn test_reference_totals() {
        let totals = project_totals(&reference_project());
        assert_eq!(totals.ev_capital_cost, dec!(200_000));
        assert_eq!(totals.solar_capital_cost, dec!(180_000));
        assert_eq!(totals.battery_capital_cost, Decimal::ZERO);
        assert_eq!(totals.total_project_cost, dec!(380_000));
        assert_eq!(totals.base_tax_credit_amount, dec!(114_000));
        assert_eq!(totals.utility_rebate_amount, dec!(60_000));
        assert_eq!(totals.total_incentives, dec!(174_000));
        assert_eq!(totals.net_project_cost, dec!(206_000));
        assert_eq!(totals.depreciable_basis, dec!(323_000));
        assert_eq!(totals.loan_principal, Decimal::ZERO);
        assert_eq!(totals.discount_rate, dec!(0.10));
    }

    #[test]
    fn test_battery_included_when_enabled() {
        let totals = project_totals(&with_battery(reference_project()));
        assert_eq!(totals.battery_capital_cost, dec!(60_000));
        assert_eq!(totals.total_project_cost, dec!(440_000));
        assert_eq!(totals.battery_usable_capacity_kwh, dec!(180));
    }

    #[test]
    fn test_additional_credit_does_not_reduce_basis() {
        let mut input = reference_project();
        input.incentives.additional_tax_credit = Some(dec!(0.10));
        let totals = project_totals(&input);
        assert_eq!(totals.additional_tax_credit_amount, dec!(38_000));
        assert_eq!(totals.total_incentives, dec!(212_000));
        assert_eq!(totals.depreciable_basis, dec!(323_000));
    }

    #[test]
    fn test_loan_sizing() {
        let mut input = reference_project();
        input.financing = Financing::Loan {
            annual_rate_pct: dec!(5),
            term_years: 10,
            down_payment: dec!(280_000),
        };
        let totals = project_totals(&input);
        assert_eq!(totals.loan_principal, dec!(100_000));
        assert!((totals.monthly_loan_payment - dec!(1060.66)).abs() < dec!(0.01));
        assert_eq!(totals.discount_rate, dec!(0.05));
    }

    #[test]
    fn test_reference_metrics() {
        let m = compute_metrics(&reference_project());
        assert_eq!(m.cash_flows.len(), 20);

        let payback = m.payback_period_years.unwrap();
        // Crosses zero in year 3: 2 + 20625.6 / 90770.58985
        assert!((payback - dec!(2.2272)).abs() < dec!(0.0001), "Got {payback}");

        assert!(m.npv.unwrap() > Decimal::ZERO);
        let irr = m.irr_pct.unwrap();
        assert!(irr > dec!(30) && irr < dec!(60), "IRR {irr}% out of range");
    }

    #[test]
    fn test_percentages_scaled_once() {
        let input = reference_project();
        let m = compute_metrics(&input);
        let flows = net_cash_flows(&m.cash_flows);
        let raw_irr = irr(&flows, m.net_project_cost).unwrap();
        assert_eq!(m.irr_pct.unwrap(), raw_irr * dec!(100));

        let total: Money = flows.iter().sum();
        let raw_roi = (total - m.net_project_cost) / m.net_project_cost;
        assert_eq!(m.roi_pct, raw_roi * dec!(100));
        assert_eq!(m.annualized_roi_pct, raw_roi / dec!(20) * dec!(100));
    }

    #[test]
    fn test_summary_matches_schedule() {
        let m = compute_metrics(&reference_project());
        let last = m.cash_flows.last().unwrap();
        let diff = m.summary.total_net_cash_flow - m.net_project_cost - last.cumulative_cash_flow;
        assert!(diff.abs() < dec!(0.0000001), "Drift {diff}");
        assert_eq!(m.summary.total_loan_payments, Decimal::ZERO);
    }

    #[test]
    fn test_npv_matches_discounted_column() {
        let m = compute_metrics(&reference_project());
        let expected = m.summary.total_discounted_cash_flow - m.net_project_cost;
        assert!((m.npv.unwrap() - expected).abs() < dec!(0.000001));
    }

    #[test]
    fn test_idempotent() {
        let input = reference_project();
        assert_eq!(compute_metrics(&input), compute_metrics(&input));
    }

    #[test]
    fn test_fully_subsidised_project() {
        let mut input = reference_project();
        input.incentives.utility_rebate_per_station = dec!(66_500);
        let m = compute_metrics(&input);
        assert_eq!(m.net_project_cost, Decimal::ZERO);
        assert_eq!(m.roi_pct, Decimal::ZERO);
        assert_eq!(m.payback_period_years, Some(Decimal::ZERO));
    }

    #[test]
    fn test_incentives_above_cost() {
        let mut input = reference_project();
        input.incentives.utility_rebate_per_station = dec!(80_000);
        assert!(validate_assumptions(&input).is_ok());

        let m = compute_metrics(&input);
        assert_eq!(m.net_project_cost, dec!(-54_000));
        assert_eq!(m.payback_period_years, Some(Decimal::ZERO));
        assert_eq!(m.roi_pct, Decimal::ZERO);
        assert_eq!(m.annualized_roi_pct, Decimal::ZERO);

        let out = analyze_project(&input).unwrap();
        assert!(out
            .warnings
            .iter()
            .any(|w| w.starts_with("Incentives cover the full project cost")));
    }

    #[test]
    fn test_runaway_escalation_degrades_without_panic() {
        let mut input = reference_project();
        input.ev.price_escalation = dec!(1);
        input.ev.operational_years = 100;
        assert!(validate_assumptions(&input).is_ok());

        let out = analyze_project(&input).unwrap();
        assert_eq!(out.result.cash_flows.len(), 100);
        assert!(out.result.payback_period_years.is_some());
        assert!(out
            .warnings
            .iter()
            .any(|w| w.contains("exceeds the decimal range")));
    }

    #[test]
    fn test_analyze_wraps_metrics() {
        let input = reference_project();
        let out = analyze_project(&input).unwrap();
        assert_eq!(out.result, compute_metrics(&input));
        assert!(out.methodology.contains("Newton-Raphson"));
        assert_eq!(out.assumptions["num_stations"], 4);
        assert_eq!(out.assumptions["financing"], "cash");
    }

    #[test]
    fn test_analyze_rejects_invalid_input() {
        let mut input = reference_project();
        input.ev.operational_years = 0;
        assert!(matches!(
            analyze_project(&input),
            Err(EvSolarError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_analyze_warns_when_unprofitable() {
        let mut input = reference_project();
        input.ev.price_per_kwh = dec!(0.10);
        let out = analyze_project(&input).unwrap();
        assert!(out.result.payback_period_years.is_none());
        assert!(out
            .warnings
            .iter()
            .any(|w| w.contains("not recovered within the 20-year horizon")));
        assert!(out.warnings.iter().any(|w| w.starts_with("NPV of")));
    }
}
