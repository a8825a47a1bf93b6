pub mod amortization;
pub mod assumptions;
pub mod depreciation;
pub mod error;
pub mod metrics;
pub mod projection;
pub mod time_value;
pub mod types;

#[cfg(feature = "sensitivity")]
pub mod sensitivity;

#[cfg(test)]
mod test_support;

pub use assumptions::{validate_assumptions, ProjectAssumptions};
pub use error::EvSolarError;
pub use metrics::{analyze_project, compute_metrics, FinancialMetrics};
pub use types::*;

/// Standard result type for all evsolar operations
pub type EvSolarResult<T> = Result<T, EvSolarError>;
