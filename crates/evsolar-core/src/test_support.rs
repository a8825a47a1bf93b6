use rust_decimal_macros::dec;

use crate::assumptions::*;

/// Four 50 kW-class chargers with a 100 kW array, paid in cash.
pub(crate) fn reference_project() -> ProjectAssumptions {
    ProjectAssumptions {
        ev: EvAssumptions {
            num_stations: 4,
            cost_per_station: dec!(50_000),
            price_per_kwh: dec!(0.45),
            sessions_per_day: dec!(6),
            energy_per_session_kwh: dec!(30),
            price_escalation: dec!(0.02),
            operational_years: 20,
        },
        solar: SolarAssumptions {
            system_size_kw: dec!(100),
            cost_per_watt: dec!(1.8),
            annual_production_kwh: dec!(140_000),
            ev_offset_fraction: dec!(0.5),
        },
        battery: None,
        financing: Financing::Cash,
        incentives: Incentives {
            base_tax_credit: dec!(0.30),
            additional_tax_credit: None,
            utility_rebate_per_station: dec!(15_000),
        },
        operating: OperatingCosts {
            grid_rate_per_kwh: dec!(0.15),
            utility_escalation: dec!(0.03),
            ev_maintenance_per_station: dec!(500),
            solar_maintenance_annual: dec!(1_500),
        },
    }
}

pub(crate) fn with_battery(mut input: ProjectAssumptions) -> ProjectAssumptions {
    input.battery = Some(BatteryAssumptions {
        num_units: 2,
        unit_cost: dec!(30_000),
        capacity_kwh: dec!(100),
        round_trip_efficiency: dec!(0.90),
        cycle_life: 6_000,
        depth_of_discharge: dec!(0.90),
        annual_maintenance_per_unit: dec!(400),
    });
    input
}
