//! Operational health tracking: fill-rate bookkeeping per confidence band
//! and the Prometheus metrics surface. Distinct from `attribution`, which
//! tracks PnL quality rather than system health.

pub mod fill_rate;
pub mod metrics;

pub use fill_rate::{FillRateHealth, FillRateMonitor};
pub use metrics::MetricsRegistry;
