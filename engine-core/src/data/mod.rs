//! Market data plumbing: the exchange adapter contract, the per-symbol trade
//! ring, the immutable snapshot handed to signals, and `MarketDataHub`, which
//! demultiplexes a streaming feed into per-symbol books and trade tapes.

pub mod hub;
pub mod snapshot;

pub use hub::MarketDataHub;
pub use snapshot::MarketData;

use crate::types::{L2Update, Level, Trade};
use anyhow::Result;
use async_trait::async_trait;

/// A full-book snapshot as delivered by the exchange adapter, either on
/// connect or in response to a resync request.
#[derive(Debug, Clone)]
pub struct SnapshotResponse {
    pub symbol: String,
    pub sequence: u64,
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
    pub ts_ms: i64,
}

/// One item off the streaming feed for a given symbol.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Update { sequence: u64, updates: Vec<L2Update>, ts_ms: i64 },
    Trade(Trade),
}

/// Narrow interface to the exchange, consumed but not implemented here. A
/// production binary supplies a concrete REST + streaming implementation;
/// tests supply an in-memory fake.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    async fn subscribe(&self, symbol: &str) -> Result<tokio::sync::mpsc::Receiver<StreamEvent>>;
    async fn snapshot(&self, symbol: &str) -> Result<SnapshotResponse>;

    async fn place_order(
        &self,
        symbol: &str,
        side: crate::types::Side,
        kind: crate::types::OrderKind,
        price: crate::types::Price,
        size: crate::types::Size,
        post_only: bool,
        client_nonce: u64,
    ) -> Result<crate::types::OrderId>;

    async fn cancel_order(&self, order_id: crate::types::OrderId) -> Result<()>;
    async fn get_order(&self, order_id: crate::types::OrderId) -> Result<crate::types::Order>;
    async fn get_fills(&self, order_id: crate::types::OrderId) -> Result<Vec<crate::types::Fill>>;
}
