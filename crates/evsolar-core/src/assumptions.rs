use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::EvSolarError;
use crate::types::{Kwh, Money, Rate};
use crate::EvSolarResult;

/// Discount rate applied to cash-financed projects.
pub const DEFAULT_DISCOUNT_RATE: Rate = dec!(0.10);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// EV charging subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvAssumptions {
    /// Number of charging stations
    pub num_stations: u32,
    /// Installed cost per station
    pub cost_per_station: Money,
    /// Price charged to drivers per kWh
    pub price_per_kwh: Money,
    /// Charging sessions per station per day
    pub sessions_per_day: Decimal,
    /// Energy delivered per session (kWh)
    pub energy_per_session_kwh: Kwh,
    /// Annual escalation of the charging price (decimal)
    pub price_escalation: Rate,
    /// Projection horizon in years
    pub operational_years: u32,
}

/// Co-located solar generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarAssumptions {
    /// Nameplate size in kW
    pub system_size_kw: Decimal,
    /// Installed cost per watt
    pub cost_per_watt: Money,
    /// Expected annual production (kWh)
    pub annual_production_kwh: Kwh,
    /// Share of EV demand the array is expected to cover (0..=1)
    pub ev_offset_fraction: Rate,
}

/// Optional battery storage. Present means enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryAssumptions {
    pub num_units: u32,
    pub unit_cost: Money,
    pub capacity_kwh: Kwh,
    pub round_trip_efficiency: Rate,
    pub cycle_life: u32,
    pub depth_of_discharge: Rate,
    pub annual_maintenance_per_unit: Money,
}

/// How the upfront cost is funded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Financing {
    Cash,
    Loan {
        /// Annual percentage rate as quoted by the lender (6.5 = 6.5%)
        annual_rate_pct: Decimal,
        term_years: u32,
        down_payment: Money,
    },
}

/// Tax credits and rebates, all realised upfront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incentives {
    /// Base investment tax credit (decimal share of total project cost)
    pub base_tax_credit: Rate,
    /// Extra flat credit on top of the base (e.g. energy community adder)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_tax_credit: Option<Rate>,
    /// Utility make-ready rebate per charging station
    pub utility_rebate_per_station: Money,
}

/// Recurring operating costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingCosts {
    /// Grid electricity price per kWh
    pub grid_rate_per_kwh: Money,
    /// Annual escalation of the grid price (decimal)
    pub utility_escalation: Rate,
    /// Annual maintenance per charging station
    pub ev_maintenance_per_station: Money,
    /// Annual maintenance for the whole solar array
    pub solar_maintenance_annual: Money,
}

/// Complete, caller-populated snapshot of a project. The engine only ever
/// borrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAssumptions {
    pub ev: EvAssumptions,
    pub solar: SolarAssumptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<BatteryAssumptions>,
    pub financing: Financing,
    pub incentives: Incentives,
    pub operating: OperatingCosts,
}

impl ProjectAssumptions {
    /// Loan APR as a decimal when financed, otherwise [`DEFAULT_DISCOUNT_RATE`].
    pub fn discount_rate(&self) -> Rate {
        match &self.financing {
            Financing::Loan {
                annual_rate_pct, ..
            } => annual_rate_pct / dec!(100),
            Financing::Cash => DEFAULT_DISCOUNT_RATE,
        }
    }

    pub fn operational_years(&self) -> u32 {
        self.ev.operational_years
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Range checks a caller runs before handing assumptions to the engine.
///
/// The engine never calls this itself: it assumes validated input and
/// produces degenerate (never panicking) output otherwise.
pub fn validate_assumptions(input: &ProjectAssumptions) -> EvSolarResult<()> {
    let ev = &input.ev;
    if ev.operational_years < 1 {
        return Err(invalid(
            "ev.operational_years",
            "Operational horizon must be at least 1 year",
        ));
    }
    non_negative("ev.cost_per_station", ev.cost_per_station)?;
    non_negative("ev.price_per_kwh", ev.price_per_kwh)?;
    non_negative("ev.sessions_per_day", ev.sessions_per_day)?;
    non_negative("ev.energy_per_session_kwh", ev.energy_per_session_kwh)?;
    non_negative("ev.price_escalation", ev.price_escalation)?;

    let solar = &input.solar;
    non_negative("solar.system_size_kw", solar.system_size_kw)?;
    non_negative("solar.cost_per_watt", solar.cost_per_watt)?;
    non_negative("solar.annual_production_kwh", solar.annual_production_kwh)?;
    fraction("solar.ev_offset_fraction", solar.ev_offset_fraction)?;

    if let Some(battery) = &input.battery {
        non_negative("battery.unit_cost", battery.unit_cost)?;
        non_negative("battery.capacity_kwh", battery.capacity_kwh)?;
        fraction("battery.round_trip_efficiency", battery.round_trip_efficiency)?;
        fraction("battery.depth_of_discharge", battery.depth_of_discharge)?;
        non_negative(
            "battery.annual_maintenance_per_unit",
            battery.annual_maintenance_per_unit,
        )?;
    }

    if let Financing::Loan {
        annual_rate_pct,
        term_years,
        down_payment,
    } = &input.financing
    {
        non_negative("financing.annual_rate_pct", *annual_rate_pct)?;
        non_negative("financing.down_payment", *down_payment)?;
        if *term_years < 1 {
            return Err(invalid(
                "financing.term_years",
                "Loan term must be at least 1 year",
            ));
        }
    }

    let inc = &input.incentives;
    fraction("incentives.base_tax_credit", inc.base_tax_credit)?;
    if let Some(extra) = inc.additional_tax_credit {
        fraction("incentives.additional_tax_credit", extra)?;
        if inc.base_tax_credit + extra > Decimal::ONE {
            return Err(invalid(
                "incentives.additional_tax_credit",
                "Combined tax credit cannot exceed 100% of project cost",
            ));
        }
    }
    non_negative(
        "incentives.utility_rebate_per_station",
        inc.utility_rebate_per_station,
    )?;

    let op = &input.operating;
    non_negative("operating.grid_rate_per_kwh", op.grid_rate_per_kwh)?;
    non_negative("operating.utility_escalation", op.utility_escalation)?;
    non_negative(
        "operating.ev_maintenance_per_station",
        op.ev_maintenance_per_station,
    )?;
    non_negative(
        "operating.solar_maintenance_annual",
        op.solar_maintenance_annual,
    )?;

    Ok(())
}

fn invalid(field: &str, reason: &str) -> EvSolarError {
    EvSolarError::InvalidInput {
        field: field.into(),
        reason: reason.into(),
    }
}

fn non_negative(field: &str, value: Decimal) -> EvSolarResult<()> {
    if value < Decimal::ZERO {
        return Err(invalid(field, "Value cannot be negative"));
    }
    Ok(())
}

fn fraction(field: &str, value: Decimal) -> EvSolarResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(invalid(field, "Value must be between 0 and 1"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::reference_project;

    #[test]
    fn test_reference_project_is_valid() {
        assert!(validate_assumptions(&reference_project()).is_ok());
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let mut input = reference_project();
        input.ev.operational_years = 0;
        let err = validate_assumptions(&input).unwrap_err();
        assert!(matches!(
            err,
            EvSolarError::InvalidInput { ref field, .. } if field == "ev.operational_years"
        ));
    }

    #[test]
    fn test_negative_cost_rejected() {
        let mut input = reference_project();
        input.ev.cost_per_station = dec!(-1);
        assert!(validate_assumptions(&input).is_err());
    }

    #[test]
    fn test_offset_fraction_above_one_rejected() {
        let mut input = reference_project();
        input.solar.ev_offset_fraction = dec!(1.2);
        let err = validate_assumptions(&input).unwrap_err();
        assert!(err.to_string().contains("solar.ev_offset_fraction"));
    }

    #[test]
    fn test_combined_credit_above_one_rejected() {
        let mut input = reference_project();
        input.incentives.base_tax_credit = dec!(0.7);
        input.incentives.additional_tax_credit = Some(dec!(0.4));
        assert!(validate_assumptions(&input).is_err());
    }

    #[test]
    fn test_zero_term_loan_rejected() {
        let mut input = reference_project();
        input.financing = Financing::Loan {
            annual_rate_pct: dec!(6),
            term_years: 0,
            down_payment: dec!(0),
        };
        assert!(validate_assumptions(&input).is_err());
    }

    #[test]
    fn test_discount_rate_follows_financing() {
        let mut input = reference_project();
        assert_eq!(input.discount_rate(), dec!(0.10));

        input.financing = Financing::Loan {
            annual_rate_pct: dec!(6.5),
            term_years: 10,
            down_payment: dec!(50_000),
        };
        assert_eq!(input.discount_rate(), dec!(0.065));
    }

    #[test]
    fn test_financing_json_shape() {
        let json = r#"{"mode":"loan","annual_rate_pct":"5","term_years":10,"down_payment":"0"}"#;
        let financing: Financing = serde_json::from_str(json).unwrap();
        assert_eq!(
            financing,
            Financing::Loan {
                annual_rate_pct: dec!(5),
                term_years: 10,
                down_payment: dec!(0),
            }
        );

        let cash: Financing = serde_json::from_str(r#"{"mode":"cash"}"#).unwrap();
        assert_eq!(cash, Financing::Cash);
    }
}
