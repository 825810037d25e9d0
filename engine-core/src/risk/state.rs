use crate::resilience::HaltLatch;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
struct Inner {
    nav: Decimal,
    daily_pnl: Decimal,
    daily_realized: Decimal,
}

/// Process-wide shared state: `{nav, daily_pnl, daily_realized, halted,
/// halt_reason}`. `halted`/`halt_reason` live in `HaltLatch`; the numeric
/// fields are guarded by a `parking_lot::Mutex` since they're read and
/// written from every symbol's trading loop.
#[derive(Clone)]
pub struct RiskState {
    inner: Arc<Mutex<Inner>>,
    pub halt: HaltLatch,
}

impl RiskState {
    pub fn new(starting_nav: Decimal) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { nav: starting_nav, daily_pnl: Decimal::ZERO, daily_realized: Decimal::ZERO })),
            halt: HaltLatch::new(),
        }
    }

    pub fn nav(&self) -> Decimal {
        self.inner.lock().nav
    }

    pub fn daily_pnl(&self) -> Decimal {
        self.inner.lock().daily_pnl
    }

    /// Folds a realized trade PnL into `daily_pnl`/`daily_realized` and `nav`.
    pub fn on_trade(&self, realized_pnl: Decimal) {
        let mut inner = self.inner.lock();
        inner.daily_pnl += realized_pnl;
        inner.daily_realized += realized_pnl;
        inner.nav += realized_pnl;
    }

    /// Resets the daily counters (called once per trading day by the
    /// external scheduler; the core itself carries no wall-clock scheduling).
    pub fn reset_daily(&self) {
        let mut inner = self.inner.lock();
        inner.daily_pnl = Decimal::ZERO;
        inner.daily_realized = Decimal::ZERO;
    }

    pub fn is_halted(&self) -> bool {
        self.halt.is_halted()
    }
}
