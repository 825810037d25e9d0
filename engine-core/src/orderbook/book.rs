use crate::errors::BookError;
use crate::types::{L2Update, Level, Price, Side};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::warn;

pub const DEFAULT_DEPTH: usize = 10;

/// A single symbol's L2 book. Bids are stored highest-first, asks lowest-first.
///
/// Ownership: exclusively owned and mutated by `MarketDataHub`; signals only
/// ever see an immutable `MarketData` snapshot built from a valid book.
#[derive(Debug, Clone)]
pub struct OrderBook {
    pub symbol: String,
    depth: usize,
    bids: BTreeMap<Price, Decimal>,
    asks: BTreeMap<Price, Decimal>,
    pub last_update_ts_ms: i64,
    pub last_sequence: u64,
    stale: bool,
}

impl OrderBook {
    pub fn new(symbol: impl Into<String>, depth: usize) -> Self {
        Self {
            symbol: symbol.into(),
            depth,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            last_update_ts_ms: 0,
            last_sequence: 0,
            stale: true,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Replaces the book wholesale from a full snapshot. Always clears the
    /// stale flag (a snapshot is definitionally consistent).
    pub fn sync_from_snapshot(&mut self, sequence: u64, bids: &[Level], asks: &[Level], ts_ms: i64) {
        self.bids.clear();
        self.asks.clear();
        for l in bids.iter().take(self.depth) {
            self.bids.insert(l.price, l.size);
        }
        for l in asks.iter().take(self.depth) {
            self.asks.insert(l.price, l.size);
        }
        self.last_sequence = sequence;
        self.last_update_ts_ms = ts_ms;
        self.stale = false;
    }

    /// Checks for a gap in the incrementing sequence number, returning the
    /// number of missed messages if any.
    pub fn check_sequence_gap(&self, sequence: u64) -> Option<u64> {
        if self.last_sequence == 0 {
            return None;
        }
        if sequence > self.last_sequence + 1 {
            Some(sequence - self.last_sequence - 1)
        } else {
            None
        }
    }

    /// Applies a batch of incremental updates in feed order, trims each side
    /// to `depth`, and sets `last_update_ts_ms`. If the result is crossed the
    /// book is marked stale and `BookError::Crossed` is returned; callers
    /// (`MarketDataHub`) must trigger a snapshot resync and must not publish a
    /// snapshot to signals until the stale flag clears.
    pub fn apply_updates(&mut self, updates: &[L2Update], ts_ms: i64) -> Result<(), BookError> {
        for u in updates {
            let side_map = match u.side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            if u.size.is_zero() {
                side_map.remove(&u.price);
            } else {
                side_map.insert(u.price, u.size);
            }
        }
        self.trim();
        self.last_update_ts_ms = ts_ms;

        if let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) {
            if bid >= ask {
                self.stale = true;
                return Err(BookError::Crossed { symbol: self.symbol.clone(), bid, ask });
            }
        }
        self.stale = false;
        Ok(())
    }

    fn trim(&mut self) {
        while self.bids.len() > self.depth {
            let lowest = *self.bids.keys().next().expect("len > depth >= 0 implies non-empty");
            self.bids.remove(&lowest);
        }
        while self.asks.len() > self.depth {
            let highest = *self.asks.keys().next_back().expect("len > depth >= 0 implies non-empty");
            self.asks.remove(&highest);
        }
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    pub fn best_bid_size(&self) -> Option<Decimal> {
        self.bids.iter().next_back().map(|(_, s)| *s)
    }

    pub fn best_ask_size(&self) -> Option<Decimal> {
        self.asks.iter().next().map(|(_, s)| *s)
    }

    pub fn mid_price(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(b), Some(a)) => Some((b + a) / Decimal::TWO),
            _ => None,
        }
    }

    pub fn microprice(&self) -> Option<Price> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        let bid_size = self.best_bid_size()?;
        let ask_size = self.best_ask_size()?;
        let denom = bid_size + ask_size;
        if denom.is_zero() {
            return None;
        }
        Some((ask * bid_size + bid * ask_size) / denom)
    }

    pub fn spread_bps(&self) -> Option<Decimal> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        if bid.is_zero() {
            return None;
        }
        Some((ask - bid) / bid * Decimal::from(10_000))
    }

    /// Top-K bid levels, highest price first.
    pub fn bid_levels(&self, k: usize) -> Vec<Level> {
        self.bids
            .iter()
            .rev()
            .take(k)
            .map(|(&price, &size)| Level { price, size })
            .collect()
    }

    /// Top-K ask levels, lowest price first.
    pub fn ask_levels(&self, k: usize) -> Vec<Level> {
        self.asks
            .iter()
            .take(k)
            .map(|(&price, &size)| Level { price, size })
            .collect()
    }

    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(b), Some(a)) => b >= a,
            _ => false,
        }
    }

    pub fn age_ms(&self, now_ms: i64) -> i64 {
        (now_ms - self.last_update_ts_ms).max(0)
    }

    pub fn log_health(&self) {
        if self.stale {
            warn!(symbol = %self.symbol, "order book is stale");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snap(book: &mut OrderBook) {
        book.sync_from_snapshot(
            1,
            &[Level { price: dec!(1499.9), size: dec!(10) }, Level { price: dec!(1499.8), size: dec!(5) }],
            &[Level { price: dec!(1500.1), size: dec!(10) }],
            0,
        );
    }

    #[test]
    fn book_consistency_after_valid_updates() {
        let mut book = OrderBook::new("ETH-PERP", DEFAULT_DEPTH);
        snap(&mut book);
        assert!(book.best_bid().unwrap() < book.best_ask().unwrap());

        book.apply_updates(&[L2Update { side: Side::Buy, price: dec!(1499.95), size: dec!(2) }], 1).unwrap();
        assert!(book.best_bid().unwrap() < book.best_ask().unwrap());
        assert_eq!(book.best_bid(), Some(dec!(1499.95)));
    }

    #[test]
    fn crossed_update_marks_stale() {
        let mut book = OrderBook::new("ETH-PERP", DEFAULT_DEPTH);
        snap(&mut book);
        let result = book.apply_updates(&[L2Update { side: Side::Buy, price: dec!(1500.2), size: dec!(1) }], 2);
        assert!(result.is_err());
        assert!(book.is_stale());
    }

    #[test]
    fn zero_size_update_removes_level() {
        let mut book = OrderBook::new("ETH-PERP", DEFAULT_DEPTH);
        snap(&mut book);
        book.apply_updates(&[L2Update { side: Side::Buy, price: dec!(1499.8), size: dec!(0) }], 1).unwrap();
        assert_eq!(book.bid_levels(10).len(), 1);
    }

    #[test]
    fn microprice_is_between_best_bid_and_ask() {
        let mut book = OrderBook::new("ETH-PERP", DEFAULT_DEPTH);
        snap(&mut book);
        let mp = book.microprice().unwrap();
        assert!(mp >= book.best_bid().unwrap() && mp <= book.best_ask().unwrap());
    }

    #[test]
    fn sequence_gap_detected() {
        let mut book = OrderBook::new("ETH-PERP", DEFAULT_DEPTH);
        snap(&mut book);
        assert_eq!(book.check_sequence_gap(5), Some(3));
        assert_eq!(book.check_sequence_gap(2), None);
    }
}
