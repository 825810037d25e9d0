//! Resilience patterns used by `MarketDataHub` and `RiskGate`: exponential
//! backoff for reconnects and the process-wide halt latch.

pub mod backoff;
pub mod halt;

pub use backoff::{BackoffConfig, ExponentialBackoff};
pub use halt::HaltLatch;
