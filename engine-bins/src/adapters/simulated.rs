//! In-process synthetic venue: instant fills at the requested price, a
//! random-walk book. No real network round trip, useful for local smoke
//! runs and `--dry-run` plumbing.

use async_trait::async_trait;
use engine_core::data::{ExchangeAdapter, SnapshotResponse, StreamEvent};
use engine_core::types::{Fill, L2Update, Level, Order, OrderId, OrderKind, OrderStatus, Price, Side, Size};
use parking_lot::Mutex;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

struct Book {
    mid: Decimal,
    tick: Decimal,
}

pub struct SimulatedAdapter {
    books: Mutex<HashMap<String, Book>>,
    orders: Mutex<HashMap<OrderId, Order>>,
    fills: Mutex<HashMap<OrderId, Vec<Fill>>>,
    next_order_id: AtomicU64,
    next_fill_seq: AtomicU64,
}

impl SimulatedAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            books: Mutex::new(HashMap::new()),
            orders: Mutex::new(HashMap::new()),
            fills: Mutex::new(HashMap::new()),
            next_order_id: AtomicU64::new(1),
            next_fill_seq: AtomicU64::new(0),
        })
    }

    fn book_for(&self, symbol: &str) -> Decimal {
        let mut books = self.books.lock();
        books.entry(symbol.to_string()).or_insert(Book { mid: dec!(1500), tick: dec!(0.1) }).mid
    }
}

#[async_trait]
impl ExchangeAdapter for SimulatedAdapter {
    async fn subscribe(&self, symbol: &str) -> anyhow::Result<mpsc::Receiver<StreamEvent>> {
        let (tx, rx) = mpsc::channel(64);
        let symbol = symbol.to_string();
        let mid = self.book_for(&symbol);
        tokio::spawn(async move {
            let mut sequence = 0u64;
            let mut mid = mid;
            loop {
                tokio::time::sleep(Duration::from_millis(50)).await;
                sequence += 1;
                let drift = {
                    let mut rng = rand::thread_rng();
                    Decimal::try_from(rng.gen_range(-0.2..0.2)).unwrap_or(Decimal::ZERO)
                };
                mid += drift;
                let now_ms = chrono::Utc::now().timestamp_millis();
                let updates = vec![
                    L2Update { side: Side::Buy, price: mid - dec!(0.1), size: dec!(10) },
                    L2Update { side: Side::Sell, price: mid + dec!(0.1), size: dec!(10) },
                ];
                if tx.send(StreamEvent::Update { sequence, updates, ts_ms: now_ms }).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }

    async fn snapshot(&self, symbol: &str) -> anyhow::Result<SnapshotResponse> {
        let mid = self.book_for(symbol);
        Ok(SnapshotResponse {
            symbol: symbol.to_string(),
            sequence: 0,
            bids: vec![Level { price: mid - dec!(0.1), size: dec!(10) }],
            asks: vec![Level { price: mid + dec!(0.1), size: dec!(10) }],
            ts_ms: chrono::Utc::now().timestamp_millis(),
        })
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
        let id = OrderId(self.next_order_id.fetch_add(1, Ordering::Relaxed));
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
        info!(symbol, %side, %price, %size, "simulated fill");
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
        self.orders.lock().get(&order_id).cloned().ok_or_else(|| anyhow::anyhow!("unknown order {order_id}"))
    }

    async fn get_fills(&self, order_id: OrderId) -> anyhow::Result<Vec<Fill>> {
        Ok(self.fills.lock().get(&order_id).cloned().unwrap_or_default())
    }
}
