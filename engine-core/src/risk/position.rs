use crate::types::Fill;
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;

/// `{symbol, size (signed), avg_entry_price, unrealized_pnl, realized_pnl}`.
#[derive(Debug, Clone, Default)]
pub struct Position {
    pub symbol: String,
    pub size: Decimal,
    pub avg_entry_price: Decimal,
    pub unrealized_pnl: Decimal,
    pub realized_pnl: Decimal,
}

impl Position {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self { symbol: symbol.into(), ..Default::default() }
    }

    pub fn is_flat(&self) -> bool {
        self.size.is_zero()
    }

    pub fn is_long(&self) -> bool {
        self.size > Decimal::ZERO
    }

    pub fn is_short(&self) -> bool {
        self.size < Decimal::ZERO
    }

    pub fn notional(&self, mark_price: Decimal) -> Decimal {
        self.size.abs() * mark_price
    }

    pub fn mark_to_market(&mut self, mark_price: Decimal) {
        self.unrealized_pnl = (mark_price - self.avg_entry_price) * self.size;
    }

    /// Applies a fill's size-weighted effect on position:
    /// size-weighted moving average when increasing in the existing
    /// direction, proportional realization when decreasing, and a sign
    /// change is treated as close-then-open with full realization across
    /// zero.
    fn apply_fill(&mut self, signed_size: Decimal, price: Decimal) {
        let old_size = self.size;

        if old_size.is_zero() || (old_size > Decimal::ZERO) == (signed_size > Decimal::ZERO) {
            // Flat or adding in the same direction: size-weighted average entry.
            let new_size = old_size + signed_size;
            if !new_size.is_zero() {
                self.avg_entry_price = (self.avg_entry_price * old_size.abs() + price * signed_size.abs()) / new_size.abs();
            }
            self.size = new_size;
            return;
        }

        // Reducing or flipping direction.
        let closing_size = signed_size.abs().min(old_size.abs());
        let realized_per_unit = if old_size > Decimal::ZERO {
            price - self.avg_entry_price
        } else {
            self.avg_entry_price - price
        };
        self.realized_pnl += realized_per_unit * closing_size;

        let new_size = old_size + signed_size;
        if new_size.is_zero() {
            self.avg_entry_price = Decimal::ZERO;
        } else if (new_size > Decimal::ZERO) != (old_size > Decimal::ZERO) {
            // Sign change: close-then-open, residual opens at the fill price.
            self.avg_entry_price = price;
        }
        self.size = new_size;
    }
}

/// Owns one `Position` per symbol, applying fills idempotently keyed on
/// `(order_id, fill_seq)` so position and PnL updates happen exactly once
/// per fill even under retried or duplicated fill reports.
pub struct PositionManager {
    positions: DashMap<String, Mutex<Position>>,
    applied: Mutex<HashSet<(u64, u64)>>,
}

impl PositionManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { positions: DashMap::new(), applied: Mutex::new(HashSet::new()) })
    }

    pub fn position(&self, symbol: &str) -> Position {
        self.positions
            .entry(symbol.to_string())
            .or_insert_with(|| Mutex::new(Position::new(symbol)))
            .lock()
            .clone()
    }

    /// Applies a fill's effect on position, returning `true` if this fill was
    /// newly applied and `false` if it was a duplicate (same order id + fill
    /// sequence) and therefore a no-op.
    pub fn apply_fill(&self, fill: &Fill) -> bool {
        let key = (fill.order_id.0, fill.fill_seq);
        {
            let mut applied = self.applied.lock();
            if !applied.insert(key) {
                return false;
            }
        }

        let entry = self
            .positions
            .entry(fill.symbol.clone())
            .or_insert_with(|| Mutex::new(Position::new(fill.symbol.clone())));
        let mut position = entry.lock();
        position.apply_fill(fill.signed_size(), fill.price);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderId, OrderKind, Side};
    use rust_decimal_macros::dec;

    #[test]
    fn increasing_position_uses_size_weighted_average() {
        let mut position = Position::new("ETH-PERP");
        position.apply_fill(dec!(1), dec!(1500));
        position.apply_fill(dec!(1), dec!(1510));
        assert_eq!(position.size, dec!(2));
        assert_eq!(position.avg_entry_price, dec!(1505));
    }

    #[test]
    fn sign_change_closes_then_opens() {
        let mut position = Position::new("ETH-PERP");
        position.apply_fill(dec!(1), dec!(1500));
        position.apply_fill(dec!(-2), dec!(1510));
        assert_eq!(position.size, dec!(-1));
        assert_eq!(position.avg_entry_price, dec!(1510));
        assert_eq!(position.realized_pnl, dec!(10));
    }

    #[test]
    fn reducing_position_realizes_proportionally() {
        let mut position = Position::new("ETH-PERP");
        position.apply_fill(dec!(2), dec!(1500));
        position.apply_fill(dec!(-1), dec!(1520));
        assert_eq!(position.size, dec!(1));
        assert_eq!(position.avg_entry_price, dec!(1500));
        assert_eq!(position.realized_pnl, dec!(20));
    }

    fn fill(order_id: u64, seq: u64, side: Side, price: Decimal, size: Decimal) -> Fill {
        Fill { order_id: OrderId(order_id), fill_seq: seq, symbol: "ETH-PERP".into(), side, kind: OrderKind::Limit, price, size, ts_ms: 0 }
    }

    #[test]
    fn duplicate_fill_is_idempotent() {
        let manager = PositionManager::new();
        let f = fill(1, 0, Side::Buy, dec!(1500), dec!(1));
        assert!(manager.apply_fill(&f));
        assert!(!manager.apply_fill(&f));
    }
}
