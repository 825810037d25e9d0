//! Pre-trade cost estimation and post-trade actualization: `SlippageEstimator`
//! and `DynamicCostEstimator`.

pub mod slippage;
pub mod estimator;

pub use estimator::{CostEstimate, DynamicCostEstimator};
pub use slippage::SlippageEstimator;
