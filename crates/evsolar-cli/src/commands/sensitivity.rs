use clap::Args;
use serde_json::Value;

use evsolar_core::sensitivity::{self, SensitivityInput};

use crate::input;

/// Arguments for the 2-way sensitivity grid
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to a JSON or YAML sensitivity input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sens_input: SensitivityInput = input::load(args.input.as_deref(), "sensitivity analysis")?;
    let result = sensitivity::run_sensitivity(&sens_input)?;
    Ok(serde_json::to_value(result)?)
}
