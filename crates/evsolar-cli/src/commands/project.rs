use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use evsolar_core::amortization;
use evsolar_core::metrics::{self, cash_flow_schedule};
use evsolar_core::{validate_assumptions, ProjectAssumptions};

use crate::input;

/// Arguments for the full project analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to a JSON or YAML assumptions file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the cash-flow schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to a JSON or YAML assumptions file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the loan payment calculator
#[derive(Args)]
pub struct PaymentArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Decimal,
    /// Annual percentage rate (6.5 = 6.5%)
    #[arg(long)]
    pub rate_pct: Decimal,
    /// Term in years
    #[arg(long)]
    pub term_years: u32,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions: ProjectAssumptions = input::load(args.input.as_deref(), "project analysis")?;
    let result = metrics::analyze_project(&assumptions)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions: ProjectAssumptions =
        input::load(args.input.as_deref(), "cash-flow schedule")?;
    validate_assumptions(&assumptions)?;
    let schedule = cash_flow_schedule(&assumptions);
    Ok(serde_json::to_value(schedule)?)
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.principal < Decimal::ZERO || args.rate_pct < Decimal::ZERO {
        return Err("--principal and --rate-pct cannot be negative".into());
    }
    let monthly = amortization::monthly_payment(args.principal, args.rate_pct, args.term_years);
    let annual = amortization::annual_payment(args.principal, args.rate_pct, args.term_years);
    let total_paid = monthly * Decimal::from(args.term_years) * Decimal::from(12);
    Ok(json!({
        "result": {
            "monthly_payment": monthly.round_dp(2).to_string(),
            "annual_payment": annual.round_dp(2).to_string(),
            "total_paid": total_paid.round_dp(2).to_string(),
            "total_interest": (total_paid - args.principal).round_dp(2).to_string(),
        }
    }))
}
