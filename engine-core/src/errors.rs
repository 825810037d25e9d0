//! Domain error taxonomy: precise, matchable error enums rather than
//! stringly errors, following the corpus convention of deriving
//! `thiserror::Error` per subsystem.

use crate::types::{OrderId, Price};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BookError {
    #[error("order book for {symbol} is stale, last update {age_ms}ms ago")]
    Stale { symbol: String, age_ms: i64 },
    #[error("order book for {symbol} is crossed: best_bid={bid} best_ask={ask}")]
    Crossed { symbol: String, bid: Price, ask: Price },
    #[error("sequence gap on {symbol}: expected {expected}, got {got}")]
    SequenceGap { symbol: String, expected: u64, got: u64 },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RiskRejection {
    #[error("trading is halted: {reason}")]
    Halted { reason: String },
    #[error("position notional {notional} exceeds max_position_usd {limit}")]
    PositionLimitExceeded { notional: Price, limit: Price },
    #[error("worst-case loss {loss} exceeds max_single_loss_pct*nav {limit}")]
    SingleLossLimitExceeded { loss: Price, limit: Price },
    #[error("daily drawdown would exceed max_daily_drawdown_pct*nav")]
    DailyDrawdownWouldExceed,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum VenueError {
    #[error("order {order_id} rejected by venue: {reason}")]
    Rejected { order_id: OrderId, reason: String },
    #[error("post-only order {order_id} would have taken liquidity")]
    PostOnlyWouldTake { order_id: OrderId },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransientError {
    #[error("adapter timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("adapter stream disconnected: {reason}")]
    Disconnected { reason: String },
    #[error("adapter rate-limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Book(#[from] BookError),
    #[error(transparent)]
    Risk(#[from] RiskRejection),
    #[error(transparent)]
    Venue(#[from] VenueError),
    #[error(transparent)]
    Transient(#[from] TransientError),
    #[error("invariant breach: {0}")]
    InvariantBreach(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
