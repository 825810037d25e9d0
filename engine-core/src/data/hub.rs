use super::{ExchangeAdapter, StreamEvent};
use crate::data::snapshot::MarketData;
use crate::orderbook::OrderBook;
use crate::resilience::backoff::{BackoffConfig, ExponentialBackoff};
use crate::types::Trade;
use anyhow::{Context, Result};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_TRADE_WINDOW_MS: i64 = 100;
const DEFAULT_COALESCE_MS: i64 = 1;

struct SymbolState {
    book: OrderBook,
    trades: VecDeque<Trade>,
    trade_window_ms: i64,
    last_published_ts_ms: i64,
}

impl SymbolState {
    fn new(symbol: &str, depth: usize, trade_window_ms: i64) -> Self {
        Self {
            book: OrderBook::new(symbol, depth),
            trades: VecDeque::new(),
            trade_window_ms,
            last_published_ts_ms: 0,
        }
    }

    fn push_trade(&mut self, trade: Trade) {
        self.trades.push_back(trade);
        let cutoff = trade.ts_ms - self.trade_window_ms;
        while matches!(self.trades.front(), Some(t) if t.ts_ms < cutoff) {
            self.trades.pop_front();
        }
    }

    fn snapshot(&self) -> Option<MarketData> {
        if self.book.is_stale() {
            return None;
        }
        let mid = self.book.mid_price()?;
        Some(MarketData {
            symbol: self.book.symbol.clone(),
            ts_ms: self.book.last_update_ts_ms,
            bids: self.book.bid_levels(10),
            asks: self.book.ask_levels(10),
            mid,
            microprice: self.book.microprice(),
            recent_trades: self.trades.iter().copied().collect(),
        })
    }
}

/// Owns the streaming connection via the exchange adapter and demultiplexes
/// it by symbol into a book + trade ring per symbol. Ordering is strictly
/// sequential within a symbol; no cross-symbol ordering is guaranteed.
pub struct MarketDataHub {
    adapter: Arc<dyn ExchangeAdapter>,
    symbols: DashMap<String, Mutex<SymbolState>>,
    depth: usize,
    coalesce_ms: i64,
    trade_window_ms: i64,
    max_staleness_ms: i64,
    resync_failures_before_halt: u32,
}

impl MarketDataHub {
    pub fn new(adapter: Arc<dyn ExchangeAdapter>, depth: usize, max_staleness_ms: i64) -> Self {
        Self {
            adapter,
            symbols: DashMap::new(),
            depth,
            coalesce_ms: DEFAULT_COALESCE_MS,
            trade_window_ms: DEFAULT_TRADE_WINDOW_MS,
            max_staleness_ms,
            resync_failures_before_halt: 5,
        }
    }

    /// Non-blocking read of the latest snapshot for a symbol. Returns `None`
    /// if the symbol is unknown, the book is stale, or it exceeds
    /// `max_staleness_ms` (the trading loop skips the iteration in that case).
    pub fn snapshot(&self, symbol: &str, now_ms: i64) -> Option<MarketData> {
        let entry = self.symbols.get(symbol)?;
        let state = entry.lock();
        if state.book.age_ms(now_ms) > self.max_staleness_ms {
            return None;
        }
        state.snapshot()
    }

    /// Runs the I/O task for one symbol until the adapter stream ends or the
    /// cancellation token fires. Reconnects with exponential backoff on
    /// disconnect, resyncing via snapshot after every (re)connect and after a
    /// crossed-book invariant breach. Returns an invariant-breach error if
    /// resyncs fail more than `resync_failures_before_halt` times in a row.
    pub async fn run_symbol(&self, symbol: &str, cancel: tokio_util::sync::CancellationToken) -> Result<()> {
        self.symbols
            .entry(symbol.to_string())
            .or_insert_with(|| Mutex::new(SymbolState::new(symbol, self.depth, self.trade_window_ms)));

        let mut backoff = ExponentialBackoff::new(BackoffConfig::default());
        let mut consecutive_resync_failures = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            self.resync(symbol).await.map_err(|e| {
                consecutive_resync_failures += 1;
                warn!(symbol, error = %e, consecutive_resync_failures, "snapshot resync failed");
                e
            })?;
            consecutive_resync_failures = 0;
            backoff.reset();

            let mut rx = match self.adapter.subscribe(symbol).await {
                Ok(rx) => rx,
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(symbol, error = %e, delay_ms = delay.as_millis() as u64, "subscribe failed, backing off");
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => continue,
                        _ = cancel.cancelled() => return Ok(()),
                    }
                }
            };

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(()),
                    maybe_event = rx.recv() => {
                        match maybe_event {
                            Some(event) => {
                                if let Err(e) = self.apply_event(symbol, event) {
                                    warn!(symbol, error = %e, "invariant breach applying stream event, resyncing");
                                    consecutive_resync_failures += 1;
                                    if consecutive_resync_failures > self.resync_failures_before_halt {
                                        return Err(anyhow::anyhow!(
                                            "persistent invariant breach on {symbol} after {} resyncs",
                                            consecutive_resync_failures
                                        ));
                                    }
                                    if self.resync(symbol).await.is_ok() {
                                        consecutive_resync_failures = 0;
                                    }
                                }
                            }
                            None => {
                                let delay = backoff.next_delay();
                                info!(symbol, delay_ms = delay.as_millis() as u64, "stream ended, reconnecting");
                                tokio::select! {
                                    _ = tokio::time::sleep(delay) => break,
                                    _ = cancel.cancelled() => return Ok(()),
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    async fn resync(&self, symbol: &str) -> Result<()> {
        let snap = self.adapter.snapshot(symbol).await.context("snapshot request failed")?;
        let entry = self.symbols.get(symbol).context("symbol not registered")?;
        let mut state = entry.lock();
        state.book.sync_from_snapshot(snap.sequence, &snap.bids, &snap.asks, snap.ts_ms);
        Ok(())
    }

    fn apply_event(&self, symbol: &str, event: StreamEvent) -> Result<()> {
        let entry = self.symbols.get(symbol).context("symbol not registered")?;
        let mut state = entry.lock();
        match event {
            StreamEvent::Update { sequence, updates, ts_ms } => {
                if let Some(gap) = state.book.check_sequence_gap(sequence) {
                    warn!(symbol, gap, "sequence gap detected");
                }
                state.book.apply_updates(&updates, ts_ms)?;
            }
            StreamEvent::Trade(trade) => state.push_trade(trade),
        }
        Ok(())
    }

    pub fn coalesce_interval(&self) -> Duration {
        Duration::from_millis(self.coalesce_ms as u64)
    }
}
