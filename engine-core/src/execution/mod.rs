//! Order-placement backends: `ShallowMakerExecutor`, `IocExecutor`, and
//! `HybridExecutor`, the per-signal routing/fallback coordinator.

pub mod hybrid;
pub mod ioc;
pub mod maker;

pub use hybrid::{ExecutionConfig, ExecutionStrategy, HybridExecutor};
pub use ioc::IocExecutor;
pub use maker::ShallowMakerExecutor;
