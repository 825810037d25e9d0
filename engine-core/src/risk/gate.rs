use super::{Position, RiskState};
use crate::data::MarketData;
use crate::errors::RiskRejection;
use crate::types::{Side, Size};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// An order the `TradingLoop` intends to submit, prior to admission.
#[derive(Debug, Clone, Copy)]
pub struct IntendedOrder {
    pub side: Side,
    pub size: Size,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskGateConfig {
    pub max_position_usd: Decimal,
    pub max_single_loss_pct: f64,
    pub max_daily_drawdown_pct: f64,
    /// Configured bps envelope for the worst adverse price move used in
    /// the pre-trade worst-case-loss estimate (e.g. 30 bps).
    pub worst_adverse_move_bps: Decimal,
}

impl Default for RiskGateConfig {
    fn default() -> Self {
        Self {
            max_position_usd: Decimal::from(50_000),
            max_single_loss_pct: 0.02,
            max_daily_drawdown_pct: 0.05,
            worst_adverse_move_bps: Decimal::from(30),
        }
    }
}

/// Pre-order admission control. `PositionManager` is a
/// sub-component owned separately (`crate::risk::PositionManager`); `allow`
/// takes the caller's current `Position` by value so the gate itself holds no
/// position state of its own, keeping it a pure check against `RiskState`.
pub struct RiskGate {
    config: RiskGateConfig,
    state: RiskState,
}

impl RiskGate {
    pub fn new(config: RiskGateConfig, state: RiskState) -> Self {
        Self { config, state }
    }

    pub fn state(&self) -> &RiskState {
        &self.state
    }

    fn worst_case_loss(&self, size: Size, mid: Decimal) -> Decimal {
        size * mid * self.config.worst_adverse_move_bps / Decimal::from(10_000)
    }

    /// Rejects when halted, when the projected position notional would
    /// exceed `max_position_usd`, when the worst-case loss estimate exceeds
    /// `max_single_loss_pct * nav`, or when it would push `daily_pnl` past
    /// `-max_daily_drawdown_pct * nav`.
    pub fn allow(&self, intended: IntendedOrder, position: &Position, snapshot: &MarketData) -> Result<(), RiskRejection> {
        if self.state.is_halted() {
            return Err(RiskRejection::Halted { reason: self.state.halt.reason().unwrap_or_default() });
        }

        let mid = snapshot.mid;
        let signed_delta = match intended.side {
            Side::Buy => intended.size,
            Side::Sell => -intended.size,
        };
        let projected_size = position.size + signed_delta;
        let projected_notional = projected_size.abs() * mid;

        if projected_notional > self.config.max_position_usd {
            return Err(RiskRejection::PositionLimitExceeded { notional: projected_notional, limit: self.config.max_position_usd });
        }

        let nav = self.state.nav();
        let worst_case_loss = self.worst_case_loss(intended.size, mid);
        let single_loss_limit = nav * Decimal::try_from(self.config.max_single_loss_pct).unwrap_or(Decimal::ZERO);
        if worst_case_loss > single_loss_limit {
            return Err(RiskRejection::SingleLossLimitExceeded { loss: worst_case_loss, limit: single_loss_limit });
        }

        let daily_drawdown_limit = nav * Decimal::try_from(self.config.max_daily_drawdown_pct).unwrap_or(Decimal::ZERO);
        if self.state.daily_pnl() - worst_case_loss < -daily_drawdown_limit {
            return Err(RiskRejection::DailyDrawdownWouldExceed);
        }

        Ok(())
    }

    /// Folds a realized trade PnL into `RiskState` and trips the halt latch
    /// if either hard limit is breached by the actual fill. Halt is sticky
    /// until an external reset.
    pub fn on_trade(&self, realized_pnl: Decimal, ts_ms: i64) {
        self.state.on_trade(realized_pnl);

        let nav = self.state.nav();

        let single_loss_limit = nav * Decimal::try_from(self.config.max_single_loss_pct).unwrap_or(Decimal::ZERO);
        if -realized_pnl > single_loss_limit {
            warn!(realized_pnl = %realized_pnl, limit = %single_loss_limit, "single-trade loss breached");
            self.state.halt.trip("single_loss_breached", ts_ms);
        }

        let daily_drawdown_limit = nav * Decimal::try_from(self.config.max_daily_drawdown_pct).unwrap_or(Decimal::ZERO);
        if self.state.daily_pnl() < -daily_drawdown_limit {
            warn!(daily_pnl = %self.state.daily_pnl(), limit = %daily_drawdown_limit, "daily drawdown breached");
            self.state.halt.trip("daily_drawdown_breached", ts_ms);
        }
    }
}
