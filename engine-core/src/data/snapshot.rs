use crate::types::{Level, Price, Trade};

/// Immutable view of a symbol's market state passed to signals. Lifetime: one
/// iteration of the per-symbol trading loop; never mutated after construction.
#[derive(Debug, Clone)]
pub struct MarketData {
    pub symbol: String,
    pub ts_ms: i64,
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
    pub mid: Price,
    pub microprice: Option<Price>,
    pub recent_trades: Vec<Trade>,
}

impl MarketData {
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|l| l.price)
    }
}
