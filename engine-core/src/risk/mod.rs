//! Admission control, position tracking, and the process-wide halt latch.

pub mod gate;
pub mod position;
pub mod state;

pub use gate::{IntendedOrder, RiskGate, RiskGateConfig};
pub use position::{Position, PositionManager};
pub use state::RiskState;
