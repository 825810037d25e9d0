use super::{IocExecutor, ShallowMakerExecutor};
use crate::data::ExchangeAdapter;
use crate::errors::EngineError;
use crate::signals::{Confidence, SignalScore};
use crate::types::{Fill, OrderStatus, Price, Side, Size};
use dashmap::DashSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStrategy {
    IocOnly,
    Hybrid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub strategy: ExecutionStrategy,
    pub fallback_on_high: bool,
    pub fallback_on_medium: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self { strategy: ExecutionStrategy::Hybrid, fallback_on_high: true, fallback_on_medium: false }
    }
}

/// Terminal result of one `HybridExecutor::execute` call.
///
/// `filled` follows the fill-rate convention exactly: an attempt
/// counts as filled iff the maker leg was FILLED in full within its window.
/// A maker timeout followed by a successful IOC fallback still reports
/// `filled = false` to `FillRateMonitor` (the IOC fill is real and is still
/// applied to position/PnL via `fills`).
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub confidence: Confidence,
    pub filled: bool,
    pub fills: Vec<Fill>,
}

/// Per-signal routing + fallback state machine:
///
/// ```text
///   IDLE ──submit──▶ MAKER_PENDING ──fill──▶ FILLED(terminal)
///                      │  │
///                      │  └──timeout/partial──▶ CANCELED_BY_TIMEOUT
///                      │                              │
///                      │                     (HIGH)   │          (MEDIUM)
///                      │                              ▼              ▼
///                      └──reject──▶ REJECTED ───▶ IOC_SUBMITTED  SKIPPED(terminal)
///                                                     │
///                                        ───────▶ IOC_TERMINAL
/// ```
///
/// At most one outstanding attempt per symbol: a signal arriving while a
/// prior intent is in-flight for the same symbol is dropped and logged as
/// `coalesced` rather than queued.
pub struct HybridExecutor {
    adapter: Arc<dyn ExchangeAdapter>,
    maker: ShallowMakerExecutor,
    ioc: IocExecutor,
    config: ExecutionConfig,
    in_flight: DashSet<String>,
}

impl HybridExecutor {
    pub fn new(adapter: Arc<dyn ExchangeAdapter>, maker: ShallowMakerExecutor, ioc: IocExecutor, config: ExecutionConfig) -> Self {
        Self { adapter, maker, ioc, config, in_flight: DashSet::new() }
    }

    /// `LOW` always skips. `HIGH` tries the maker leg, then falls to IOC for
    /// the unfilled remainder if configured to. `MEDIUM` tries the maker leg
    /// and skips outright on timeout (never crosses the spread) unless
    /// explicitly configured to fall back.
    pub async fn execute(
        &self,
        symbol: &str,
        side: Side,
        size: Size,
        score: &SignalScore,
        best_bid: Price,
        best_ask: Price,
        cancel: &CancellationToken,
    ) -> Result<Option<ExecutionOutcome>, EngineError> {
        if matches!(score.confidence, Confidence::Low) {
            return Ok(None);
        }

        if !self.in_flight.insert(symbol.to_string()) {
            info!(symbol, "signal coalesced: prior intent still in-flight");
            return Ok(None);
        }
        let result = self.execute_inner(symbol, side, size, score, best_bid, best_ask, cancel).await;
        self.in_flight.remove(symbol);
        result
    }

    async fn execute_inner(
        &self,
        symbol: &str,
        side: Side,
        size: Size,
        score: &SignalScore,
        best_bid: Price,
        best_ask: Price,
        cancel: &CancellationToken,
    ) -> Result<Option<ExecutionOutcome>, EngineError> {
        if self.config.strategy == ExecutionStrategy::IocOnly {
            let order = self.ioc.execute(symbol, side, size, best_bid, best_ask).await?;
            let fills = self.adapter.get_fills(order.id).await?;
            return Ok(Some(ExecutionOutcome { confidence: score.confidence, filled: order.status == OrderStatus::Filled, fills }));
        }

        let maker_result = self.maker.try_maker(symbol, side, size, score.confidence, best_bid, best_ask, cancel).await?;

        match (score.confidence, maker_result) {
            (_, Some(order)) => {
                let fills = self.adapter.get_fills(order.id).await?;
                Ok(Some(ExecutionOutcome { confidence: score.confidence, filled: true, fills }))
            }
            (Confidence::High, None) => {
                if self.config.fallback_on_high {
                    let ioc_order = self.ioc.execute(symbol, side, size, best_bid, best_ask).await?;
                    let fills = self.adapter.get_fills(ioc_order.id).await?;
                    Ok(Some(ExecutionOutcome { confidence: score.confidence, filled: false, fills }))
                } else {
                    Ok(Some(ExecutionOutcome { confidence: score.confidence, filled: false, fills: Vec::new() }))
                }
            }
            (Confidence::Medium, None) => {
                if self.config.fallback_on_medium {
                    let ioc_order = self.ioc.execute(symbol, side, size, best_bid, best_ask).await?;
                    let fills = self.adapter.get_fills(ioc_order.id).await?;
                    Ok(Some(ExecutionOutcome { confidence: score.confidence, filled: false, fills }))
                } else {
                    Ok(Some(ExecutionOutcome { confidence: score.confidence, filled: false, fills: Vec::new() }))
                }
            }
            (Confidence::Low, None) => unreachable!("Low confidence returns before reaching execute_inner"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ExchangeAdapter, SnapshotResponse, StreamEvent};
    use crate::signals::Confidence;
    use crate::types::{Order, OrderId, OrderKind, OrderStatus};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use tokio::sync::mpsc;

    struct FakeAdapter {
        /// If true, the first order placed (the maker leg) is reported
        /// filled immediately; otherwise it stays `Submitted` forever so the
        /// maker executor's timeout drives the fallback path.
        maker_fills: bool,
        next_id: Mutex<u64>,
        orders: Mutex<HashMap<OrderId, Order>>,
    }

    impl FakeAdapter {
        fn new(maker_fills: bool) -> Self {
            Self { maker_fills, next_id: Mutex::new(1), orders: Mutex::new(HashMap::new()) }
        }
    }

    #[async_trait]
    impl ExchangeAdapter for FakeAdapter {
        async fn subscribe(&self, _symbol: &str) -> anyhow::Result<mpsc::Receiver<StreamEvent>> {
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }

        async fn snapshot(&self, symbol: &str) -> anyhow::Result<SnapshotResponse> {
            Ok(SnapshotResponse { symbol: symbol.to_string(), sequence: 0, bids: vec![], asks: vec![], ts_ms: 0 })
        }

        async fn place_order(
            &self,
            symbol: &str,
            side: Side,
            kind: OrderKind,
            price: Price,
            size: Size,
            _post_only: bool,
            _client_nonce: u64,
        ) -> anyhow::Result<OrderId> {
            let mut next_id = self.next_id.lock();
            let id = OrderId(*next_id);
            *next_id += 1;
            let is_first_order = id.0 == 1;

            let mut order = Order::new(id, symbol, side, kind, price, size, 0);
            if kind == OrderKind::Ioc || (is_first_order && self.maker_fills) {
                order.status = OrderStatus::Filled;
                order.filled_size = size;
            }
            self.orders.lock().insert(id, order);
            Ok(id)
        }

        async fn cancel_order(&self, order_id: OrderId) -> anyhow::Result<()> {
            if let Some(order) = self.orders.lock().get_mut(&order_id) {
                if !order.status.is_terminal() {
                    order.status = OrderStatus::Canceled;
                }
            }
            Ok(())
        }

        async fn get_order(&self, order_id: OrderId) -> anyhow::Result<Order> {
            Ok(self.orders.lock().get(&order_id).cloned().expect("order exists"))
        }

        async fn get_fills(&self, order_id: OrderId) -> anyhow::Result<Vec<Fill>> {
            let order = self.orders.lock().get(&order_id).cloned().expect("order exists");
            if order.status == OrderStatus::Filled {
                Ok(vec![Fill {
                    order_id,
                    fill_seq: 0,
                    symbol: order.symbol,
                    side: order.side,
                    kind: order.kind,
                    price: order.price,
                    size: order.size,
                    ts_ms: 0,
                }])
            } else {
                Ok(vec![])
            }
        }
    }

    fn score(confidence: Confidence) -> SignalScore {
        SignalScore { value: 0.0, confidence, components: vec![], ts_ms: 0 }
    }

    fn executor(adapter: Arc<dyn ExchangeAdapter>, config: ExecutionConfig) -> HybridExecutor {
        let maker = ShallowMakerExecutor::new(
            adapter.clone(),
            dec!(0.01),
            std::time::Duration::from_millis(20),
            std::time::Duration::from_millis(20),
            false,
        );
        let ioc = IocExecutor::new(adapter.clone(), dec!(10));
        HybridExecutor::new(adapter, maker, ioc, config)
    }

    #[tokio::test]
    async fn low_confidence_always_skips() {
        let adapter: Arc<dyn ExchangeAdapter> = Arc::new(FakeAdapter::new(true));
        let executor = executor(adapter, ExecutionConfig::default());
        let cancel = CancellationToken::new();
        let outcome = executor
            .execute("ETH-PERP", Side::Buy, dec!(1), &score(Confidence::Low), dec!(1500), dec!(1500.2), &cancel)
            .await
            .unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn high_confidence_filled_by_maker_reports_filled_true() {
        let adapter: Arc<dyn ExchangeAdapter> = Arc::new(FakeAdapter::new(true));
        let executor = executor(adapter, ExecutionConfig::default());
        let cancel = CancellationToken::new();
        let outcome = executor
            .execute("ETH-PERP", Side::Buy, dec!(1), &score(Confidence::High), dec!(1500), dec!(1500.2), &cancel)
            .await
            .unwrap()
            .unwrap();
        assert!(outcome.filled);
        assert_eq!(outcome.fills.len(), 1);
    }

    #[tokio::test]
    async fn high_confidence_maker_timeout_falls_back_to_ioc() {
        let adapter: Arc<dyn ExchangeAdapter> = Arc::new(FakeAdapter::new(false));
        let executor = executor(adapter, ExecutionConfig::default());
        let cancel = CancellationToken::new();
        let outcome = executor
            .execute("ETH-PERP", Side::Buy, dec!(1), &score(Confidence::High), dec!(1500), dec!(1500.2), &cancel)
            .await
            .unwrap()
            .unwrap();
        assert!(!outcome.filled);
        assert_eq!(outcome.fills.len(), 1, "ioc fallback leg should have produced a fill");
    }

    #[tokio::test]
    async fn medium_confidence_maker_timeout_skips_without_crossing() {
        let adapter: Arc<dyn ExchangeAdapter> = Arc::new(FakeAdapter::new(false));
        let executor = executor(adapter, ExecutionConfig::default());
        let cancel = CancellationToken::new();
        let outcome = executor
            .execute("ETH-PERP", Side::Buy, dec!(1), &score(Confidence::Medium), dec!(1500), dec!(1500.2), &cancel)
            .await
            .unwrap()
            .unwrap();
        assert!(!outcome.filled);
        assert!(outcome.fills.is_empty());
    }
}
