//! End-to-end tests wiring `MarketDataHub`, `RiskGate`, `HybridExecutor`, and
//! `TradingLoop` together against a fake venue, rather than exercising each
//! component in isolation.

use async_trait::async_trait;
use engine_core::attribution::PnLAttributor;
use engine_core::cost::{DynamicCostEstimator, SlippageEstimator};
use engine_core::data::{ExchangeAdapter, MarketDataHub, SnapshotResponse, StreamEvent};
use engine_core::engine::{SizingConfig, TradingLoop};
use engine_core::execution::{ExecutionConfig, HybridExecutor, IocExecutor, ShallowMakerExecutor};
use engine_core::monitoring::{FillRateMonitor, MetricsRegistry};
use engine_core::risk::{PositionManager, RiskGate, RiskGateConfig, RiskState};
use engine_core::signals::{Classifier, SignalAggregator, SignalWeights};
use engine_core::types::{Fill, Level, Order, OrderId, OrderKind, OrderStatus, Price, Side, Size};
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const SYMBOL: &str = "ETH-PERP";

/// A venue that always fills instantly and serves a fixed book, so tests
/// control the signal value purely through bid/ask size imbalance.
struct FakeVenue {
    bids: Vec<Level>,
    asks: Vec<Level>,
    next_id: AtomicU64,
    next_fill_seq: AtomicU64,
    orders: Mutex<HashMap<OrderId, Order>>,
    fills: Mutex<HashMap<OrderId, Vec<Fill>>>,
}

impl FakeVenue {
    fn new(bids: Vec<Level>, asks: Vec<Level>) -> Arc<Self> {
        Arc::new(Self {
            bids,
            asks,
            next_id: AtomicU64::new(1),
            next_fill_seq: AtomicU64::new(0),
            orders: Mutex::new(HashMap::new()),
            fills: Mutex::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl ExchangeAdapter for FakeVenue {
    async fn subscribe(&self, _symbol: &str) -> anyhow::Result<mpsc::Receiver<StreamEvent>> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn snapshot(&self, symbol: &str) -> anyhow::Result<SnapshotResponse> {
        let ts_ms = chrono::Utc::now().timestamp_millis();
        Ok(SnapshotResponse { symbol: symbol.to_string(), sequence: 1, bids: self.bids.clone(), asks: self.asks.clone(), ts_ms })
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
        let id = OrderId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut order = Order::new(id, symbol, side, kind, price, size, 0);
        order.status = OrderStatus::Filled;
        order.filled_size = size;

        let fill = Fill {
            order_id: id,
            fill_seq: self.next_fill_seq.fetch_add(1, Ordering::Relaxed),
            symbol: symbol.to_string(),
            side,
            kind,
            price,
            size,
            ts_ms: 0,
        };
        self.orders.lock().insert(id, order);
        self.fills.lock().entry(id).or_default().push(fill);
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
        self.orders.lock().get(&order_id).cloned().ok_or_else(|| anyhow::anyhow!("unknown order"))
    }

    async fn get_fills(&self, order_id: OrderId) -> anyhow::Result<Vec<Fill>> {
        Ok(self.fills.lock().get(&order_id).cloned().unwrap_or_default())
    }
}

struct Harness {
    hub: Arc<MarketDataHub>,
    risk_gate: Arc<RiskGate>,
    positions: Arc<PositionManager>,
    fill_rate: Arc<FillRateMonitor>,
    trading_loop: TradingLoop,
}

fn build_harness(adapter: Arc<dyn ExchangeAdapter>, theta_1: f64, theta_2: f64) -> Harness {
    let hub = Arc::new(MarketDataHub::new(adapter.clone(), 10, 5_000));

    let risk_state = RiskState::new(dec!(1_000_000));
    let risk_gate = Arc::new(RiskGate::new(RiskGateConfig::default(), risk_state));
    let positions = PositionManager::new();

    let slippage = SlippageEstimator::new(100, 2.0);
    let cost_estimator = Arc::new(DynamicCostEstimator::new(dec!(1), dec!(4), 0.1, 0.5, slippage));
    let fill_rate = Arc::new(FillRateMonitor::new(100));
    let attributor = Arc::new(PnLAttributor::new(dec!(1), dec!(4)));
    let metrics = Arc::new(MetricsRegistry::new().expect("metrics registry"));

    let maker = ShallowMakerExecutor::new(adapter.clone(), dec!(0.01), std::time::Duration::from_millis(20), std::time::Duration::from_millis(20), false);
    let ioc = IocExecutor::new(adapter.clone(), dec!(50));
    let executor = Arc::new(HybridExecutor::new(adapter, maker, ioc, ExecutionConfig::default()));

    let aggregator = SignalAggregator::new(SignalWeights::default());
    let classifier = Classifier::new(theta_1, theta_2);
    let sizing = SizingConfig { base_size: dec!(1), k: 1.0 };

    let trading_loop = TradingLoop::new(
        SYMBOL,
        hub.clone(),
        aggregator,
        classifier,
        sizing,
        risk_gate.clone(),
        executor,
        positions.clone(),
        cost_estimator,
        fill_rate.clone(),
        attributor,
        metrics,
        5_000,
    );

    Harness { hub, risk_gate, positions, fill_rate, trading_loop }
}

async fn run_briefly(harness: &Harness, millis: u64) {
    let cancel = CancellationToken::new();
    let hub = harness.hub.clone();
    let hub_cancel = cancel.clone();
    let feed_task = tokio::spawn(async move {
        let _ = hub.run_symbol(SYMBOL, hub_cancel).await;
    });

    tokio::select! {
        _ = harness.trading_loop.run(cancel.clone()) => {}
        _ = tokio::time::sleep(std::time::Duration::from_millis(millis)) => cancel.cancel(),
    }
    cancel.cancel();
    let _ = tokio::time::timeout(std::time::Duration::from_millis(500), feed_task).await;
}

#[tokio::test]
async fn high_confidence_imbalance_results_in_a_filled_position() {
    let venue = FakeVenue::new(
        vec![Level { price: dec!(1499.9), size: dec!(100) }],
        vec![Level { price: dec!(1500.1), size: dec!(1) }],
    );
    let harness = build_harness(venue, 0.1, 0.05);

    run_briefly(&harness, 150).await;

    let position = harness.positions.position(SYMBOL);
    assert!(position.is_long(), "expected a long position from a buy-imbalanced book, got {:?}", position);
    assert_eq!(harness.fill_rate.fill_rate(engine_core::signals::Confidence::High), Some(1.0));
}

#[tokio::test]
async fn balanced_book_classifies_low_and_never_trades() {
    let venue = FakeVenue::new(
        vec![Level { price: dec!(1499.9), size: dec!(10) }],
        vec![Level { price: dec!(1500.1), size: dec!(10) }],
    );
    let harness = build_harness(venue, 0.9, 0.8);

    run_briefly(&harness, 150).await;

    assert!(harness.positions.position(SYMBOL).is_flat());
}

#[tokio::test]
async fn halted_risk_state_blocks_all_trading() {
    let venue = FakeVenue::new(
        vec![Level { price: dec!(1499.9), size: dec!(100) }],
        vec![Level { price: dec!(1500.1), size: dec!(1) }],
    );
    let harness = build_harness(venue, 0.1, 0.05);
    harness.risk_gate.state().halt.trip("manual halt for test", 0);

    run_briefly(&harness, 150).await;

    assert!(harness.positions.position(SYMBOL).is_flat());
}
