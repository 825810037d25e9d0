//! Core value types shared across the engine: prices, sizes, sides, and the
//! order/fill data model. All monetary arithmetic uses `rust_decimal::Decimal`;
//! `f64` is reserved for signal scalars and statistics (see `signals`, `cost`).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A price, in quote currency, at configured per-symbol precision.
pub type Price = Decimal;
/// A size, in base currency.
pub type Size = Decimal;
/// Basis points (1 bp = 1e-4), carried as `Decimal` when it feeds into monetary
/// arithmetic and as `f64` when it is a pure statistic.
pub type Bps = Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// +1 for Buy, -1 for Sell; used to sign sizes into position deltas.
    pub fn sign(self) -> i8 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Tagged variant for fee dispatch — no string comparisons against an order
/// "type" field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    Limit,
    Ioc,
}

impl OrderKind {
    /// Selects the configured fee rate for this kind (maker for Limit, taker
    /// for Ioc). Callers supply the two rates; this avoids a hidden global.
    pub fn fee_bps(self, maker_fee_bps: Bps, taker_fee_bps: Bps) -> Bps {
        match self {
            OrderKind::Limit => maker_fee_bps,
            OrderKind::Ioc => taker_fee_bps,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Created,
    Submitted,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected | OrderStatus::Expired
        )
    }
}

/// A single price/size level in an order book. A `size` of zero on an
/// incremental update means "remove this level"; `Level` itself only ever
/// carries a strictly positive size once stored in a book.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    pub price: Price,
    pub size: Size,
}

/// One side of an incremental book update, as published by the exchange
/// adapter's streaming feed.
#[derive(Debug, Clone, Copy)]
pub struct L2Update {
    pub side: Side,
    pub price: Price,
    pub size: Size,
}

/// A single executed trade, retained in the per-symbol trade ring.
#[derive(Debug, Clone, Copy)]
pub struct Trade {
    pub ts_ms: i64,
    pub side: Side,
    pub price: Price,
    pub size: Size,
}

/// Monotonically increasing client-assigned order identifier. Newtype over
/// `u64` so it can't be confused with a raw sequence number or timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ord-{}", self.0)
    }
}

/// An order under the coordinator's exclusive ownership from `Created` until
/// a terminal status.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub symbol: String,
    pub side: Side,
    pub kind: OrderKind,
    pub price: Price,
    pub size: Size,
    pub filled_size: Size,
    pub status: OrderStatus,
    pub created_at_ms: i64,
    pub last_update_at_ms: i64,
}

impl Order {
    pub fn new(
        id: OrderId,
        symbol: impl Into<String>,
        side: Side,
        kind: OrderKind,
        price: Price,
        size: Size,
        now_ms: i64,
    ) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            side,
            kind,
            price,
            size,
            filled_size: Decimal::ZERO,
            status: OrderStatus::Created,
            created_at_ms: now_ms,
            last_update_at_ms: now_ms,
        }
    }

    pub fn remaining_size(&self) -> Size {
        self.size - self.filled_size
    }

    pub fn is_fully_filled(&self) -> bool {
        self.filled_size >= self.size
    }
}

/// A fill against an order, with a monotonic per-order fill sequence used for
/// idempotent application to position and PnL state.
#[derive(Debug, Clone)]
pub struct Fill {
    pub order_id: OrderId,
    pub fill_seq: u64,
    pub symbol: String,
    pub side: Side,
    pub kind: OrderKind,
    pub price: Price,
    pub size: Size,
    pub ts_ms: i64,
}

impl Fill {
    pub fn notional(&self) -> Decimal {
        self.price * self.size
    }

    /// Signed position delta this fill applies: positive for a buy fill,
    /// negative for a sell fill.
    pub fn signed_size(&self) -> Decimal {
        match self.side {
            Side::Buy => self.size,
            Side::Sell => -self.size,
        }
    }
}
