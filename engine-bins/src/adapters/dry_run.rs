//! Wraps an inner adapter and refuses every order submission, so `--dry-run`
//! exercises market data, signals, risk, and routing without ever placing or
//! canceling a real order.

use async_trait::async_trait;
use engine_core::data::{ExchangeAdapter, SnapshotResponse, StreamEvent};
use engine_core::types::{Fill, Order, OrderId, OrderKind, Price, Side, Size};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

pub struct DryRunAdapter {
    inner: Arc<dyn ExchangeAdapter>,
}

impl DryRunAdapter {
    pub fn new(inner: Arc<dyn ExchangeAdapter>) -> Arc<Self> {
        Arc::new(Self { inner })
    }
}

#[async_trait]
impl ExchangeAdapter for DryRunAdapter {
    async fn subscribe(&self, symbol: &str) -> anyhow::Result<mpsc::Receiver<StreamEvent>> {
        self.inner.subscribe(symbol).await
    }

    async fn snapshot(&self, symbol: &str) -> anyhow::Result<SnapshotResponse> {
        self.inner.snapshot(symbol).await
    }

    async fn place_order(
        &self,
        symbol: &str,
        side: Side,
        _kind: OrderKind,
        price: Price,
        size: Size,
        _post_only: bool,
        _client_nonce: u64,
    ) -> anyhow::Result<OrderId> {
        info!(symbol, %side, %price, %size, "dry run: order suppressed");
        Err(anyhow::anyhow!("dry run: order submission disabled"))
    }

    async fn cancel_order(&self, _order_id: OrderId) -> anyhow::Result<()> {
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> anyhow::Result<Order> {
        self.inner.get_order(order_id).await
    }

    async fn get_fills(&self, order_id: OrderId) -> anyhow::Result<Vec<Fill>> {
        self.inner.get_fills(order_id).await
    }
}
