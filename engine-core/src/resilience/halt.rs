//! The process-wide halt latch backing `RiskState.halted`: a sticky,
//! atomically-settable boolean rather than a multi-state
//! running/paused/shutting-down machine, since trading only ever needs
//! "on or off", not full process lifecycle control.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Clone)]
struct HaltInfo {
    reason: String,
    ts_ms: i64,
}

/// Monotone: once tripped, stays tripped until `reset` is called explicitly
/// by an external operator action. Cheap to check (`is_halted`) from every
/// `RiskGate::allow` call.
#[derive(Clone)]
pub struct HaltLatch {
    halted: Arc<AtomicBool>,
    info: Arc<Mutex<Option<HaltInfo>>>,
}

impl HaltLatch {
    pub fn new() -> Self {
        Self { halted: Arc::new(AtomicBool::new(false)), info: Arc::new(Mutex::new(None)) }
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    /// Trips the latch. Idempotent: repeated trips after the first are
    /// ignored (the first reason wins) so a storm of risk breaches doesn't
    /// overwrite the original root cause.
    pub fn trip(&self, reason: impl Into<String>, ts_ms: i64) {
        if self.halted.swap(true, Ordering::AcqRel) {
            return;
        }
        let reason = reason.into();
        error!(reason = %reason, "risk halt latch tripped");
        *self.info.lock() = Some(HaltInfo { reason, ts_ms });
    }

    pub fn reason(&self) -> Option<String> {
        self.info.lock().as_ref().map(|i| i.reason.clone())
    }

    /// External reset, e.g. an operator acknowledging the halt reason and
    /// clearing it after manual review.
    pub fn reset(&self) {
        self.halted.store(false, Ordering::Release);
        *self.info.lock() = None;
    }
}

impl Default for HaltLatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halt_is_monotone_until_reset() {
        let latch = HaltLatch::new();
        assert!(!latch.is_halted());
        latch.trip("daily drawdown exceeded", 0);
        assert!(latch.is_halted());
        assert_eq!(latch.reason().as_deref(), Some("daily drawdown exceeded"));

        latch.trip("a different reason", 1);
        assert_eq!(latch.reason().as_deref(), Some("daily drawdown exceeded"));

        latch.reset();
        assert!(!latch.is_halted());
        assert!(latch.reason().is_none());
    }

    #[test]
    fn clone_shares_state() {
        let latch = HaltLatch::new();
        let other = latch.clone();
        latch.trip("x", 0);
        assert!(other.is_halted());
    }
}
