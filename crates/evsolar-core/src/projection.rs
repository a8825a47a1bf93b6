use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::assumptions::{Financing, ProjectAssumptions};
use crate::depreciation::depreciation;
use crate::metrics::ProjectTotals;
use crate::types::{Kwh, Money, Rate};

/// Flat corporate income tax rate.
pub const CORPORATE_TAX_RATE: Rate = dec!(0.21);

/// Yearly growth factor applied to every maintenance line.
pub const MAINTENANCE_ESCALATION: Decimal = dec!(1.03);

const DAYS_PER_YEAR: Decimal = dec!(365);

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One projected operating year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowYear {
    /// Year number (1-based)
    pub year: u32,
    /// Charging sales
    pub revenue: Money,
    /// Electricity bought from the grid for the share solar does not cover
    pub grid_cost: Money,
    /// EV, solar and (if enabled) battery maintenance
    pub maintenance_cost: Money,
    /// Twelve monthly loan payments while the loan is outstanding
    pub loan_payment: Money,
    /// Revenue less grid cost, maintenance and loan payment
    pub profit: Money,
    /// Accelerated depreciation charge
    pub depreciation: Money,
    /// Profit less depreciation
    pub taxable_income: Money,
    /// Tax payable (zero if taxable income <= 0)
    pub taxes: Money,
    /// Profit less taxes
    pub net_cash_flow: Money,
    /// Running total starting from minus the net project cost
    pub cumulative_cash_flow: Money,
    /// Net cash flow discounted to the start of year 1
    pub discounted_cash_flow: Money,
}

/// Annual energy split between solar and grid. Constant across the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyBalance {
    pub ev_demand_kwh: Kwh,
    pub solar_used_kwh: Kwh,
    pub grid_energy_kwh: Kwh,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Annual EV demand and how much of it solar covers.
pub fn energy_balance(input: &ProjectAssumptions) -> EnergyBalance {
    let ev = &input.ev;
    let ev_demand_kwh = Decimal::from(ev.num_stations)
        .saturating_mul(ev.sessions_per_day)
        .saturating_mul(ev.energy_per_session_kwh)
        .saturating_mul(DAYS_PER_YEAR);

    let solar_used_kwh = input
        .solar
        .annual_production_kwh
        .min(ev_demand_kwh.saturating_mul(input.solar.ev_offset_fraction));
    let grid_energy_kwh = (ev_demand_kwh - solar_used_kwh).max(Decimal::ZERO);

    EnergyBalance {
        ev_demand_kwh,
        solar_used_kwh,
        grid_energy_kwh,
    }
}

/// Build the year-by-year cash-flow schedule.
///
/// `totals` must come from [`crate::metrics::project_totals`] for the same
/// `input`. Every downstream metric reads this schedule; nothing recomputes
/// a year independently.
///
/// Line items saturate at the decimal range instead of overflowing, so
/// runaway escalation over a long horizon degrades to `Decimal::MAX`-sized
/// figures (see [`is_saturated`]) rather than a panic.
pub fn project_cash_flows(input: &ProjectAssumptions, totals: &ProjectTotals) -> Vec<CashFlowYear> {
    let ev = &input.ev;
    let op = &input.operating;
    let stations = Decimal::from(ev.num_stations);

    let base_revenue = stations
        .saturating_mul(ev.sessions_per_day)
        .saturating_mul(ev.energy_per_session_kwh)
        .saturating_mul(ev.price_per_kwh)
        .saturating_mul(DAYS_PER_YEAR);
    let base_grid_cost = totals
        .annual_grid_energy_kwh
        .saturating_mul(op.grid_rate_per_kwh);
    let base_maintenance = op
        .ev_maintenance_per_station
        .saturating_mul(stations)
        .saturating_add(op.solar_maintenance_annual);
    let base_battery_maintenance = input.battery.as_ref().map_or(Decimal::ZERO, |b| {
        b.annual_maintenance_per_unit
            .saturating_mul(Decimal::from(b.num_units))
    });

    let annual_loan_payment = totals.monthly_loan_payment.saturating_mul(dec!(12));
    let loan_term = match &input.financing {
        Financing::Loan { term_years, .. } => Some(*term_years),
        Financing::Cash => None,
    };

    let price_growth = Decimal::ONE.saturating_add(ev.price_escalation);
    let utility_growth = Decimal::ONE.saturating_add(op.utility_escalation);
    let one_plus_d = Decimal::ONE + totals.discount_rate;
    let mut price_factor = Decimal::ONE;
    let mut utility_factor = Decimal::ONE;
    let mut maintenance_factor = Decimal::ONE;
    let mut discount = Decimal::ONE;
    let mut cumulative = -totals.net_project_cost;

    let mut schedule = Vec::with_capacity(ev.operational_years as usize);

    for year in 0..ev.operational_years {
        if year > 0 {
            price_factor = price_factor.saturating_mul(price_growth);
            utility_factor = utility_factor.saturating_mul(utility_growth);
            maintenance_factor = maintenance_factor.saturating_mul(MAINTENANCE_ESCALATION);
        }
        discount = discount.checked_mul(one_plus_d).unwrap_or(Decimal::ZERO);

        let revenue = base_revenue.saturating_mul(price_factor);
        let grid_cost = base_grid_cost.saturating_mul(utility_factor);
        let maintenance_cost = base_maintenance
            .saturating_mul(maintenance_factor)
            .saturating_add(base_battery_maintenance.saturating_mul(maintenance_factor));

        let loan_payment = match loan_term {
            Some(term) if year < term => annual_loan_payment,
            _ => Decimal::ZERO,
        };

        let profit = revenue
            .saturating_sub(grid_cost)
            .saturating_sub(maintenance_cost)
            .saturating_sub(loan_payment);
        let depreciation = depreciation(year as usize, totals.depreciable_basis);
        let taxable_income = profit.saturating_sub(depreciation);
        let taxes = taxable_income.max(Decimal::ZERO) * CORPORATE_TAX_RATE;
        let net_cash_flow = profit - taxes;

        cumulative = cumulative.saturating_add(net_cash_flow);

        // A non-positive 1 + rate has no meaningful discount factor.
        let discounted_cash_flow = net_cash_flow
            .checked_div(discount)
            .unwrap_or(Decimal::ZERO);

        schedule.push(CashFlowYear {
            year: year + 1,
            revenue,
            grid_cost,
            maintenance_cost,
            loan_payment,
            profit,
            depreciation,
            taxable_income,
            taxes,
            net_cash_flow,
            cumulative_cash_flow: cumulative,
            discounted_cash_flow,
        });
    }

    schedule
}

/// True when any line of the year hit the edge of the decimal range.
pub fn is_saturated(year: &CashFlowYear) -> bool {
    [
        year.revenue,
        year.grid_cost,
        year.maintenance_cost,
        year.loan_payment,
        year.profit,
        year.taxable_income,
        year.cumulative_cash_flow,
    ]
    .iter()
    .any(|v| *v == Decimal::MAX || *v == Decimal::MIN)
}

/// Net cash flows in year order, as fed to the discounting and payback code.
pub fn net_cash_flows(schedule: &[CashFlowYear]) -> Vec<Money> {
    schedule.iter().map(|y| y.net_cash_flow).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
