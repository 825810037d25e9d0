//! Per-symbol cooperative trading loop, tying together every other module.
//! Single-threaded per symbol: one `TradingLoop::run` task per traded symbol,
//! interleaved only at suspension points.

use crate::attribution::PnLAttributor;
use crate::cost::DynamicCostEstimator;
use crate::data::MarketDataHub;
use crate::errors::RiskRejection;
use crate::execution::HybridExecutor;
use crate::monitoring::{FillRateMonitor, MetricsRegistry};
use crate::risk::{IntendedOrder, PositionManager, RiskGate};
use crate::signals::{Classifier, SignalAggregator};
use crate::types::{OrderKind, Side};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Intent sizing knobs: `size = min(base_size, k * |value| * nav / mid)`.
#[derive(Debug, Clone, Copy)]
pub struct SizingConfig {
    pub base_size: Decimal,
    pub k: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self { base_size: Decimal::ONE, k: 1.0 }
    }
}

fn size_intent(value: f64, nav: Decimal, mid: Decimal, config: &SizingConfig) -> Decimal {
    if mid.is_zero() {
        return Decimal::ZERO;
    }
    let scaled = Decimal::try_from(config.k * value.abs()).unwrap_or(Decimal::ZERO) * nav / mid;
    config.base_size.min(scaled).max(Decimal::ZERO)
}

/// One symbol's share of the shared, process-wide components: FillRateMonitor,
/// CostEstimator, and RiskState are shared across symbol loops and internally
/// serialize their own operations.
pub struct TradingLoop {
    symbol: String,
    hub: Arc<MarketDataHub>,
    aggregator: SignalAggregator,
    classifier: Classifier,
    sizing: SizingConfig,
    risk_gate: Arc<RiskGate>,
    executor: Arc<HybridExecutor>,
    positions: Arc<PositionManager>,
    cost_estimator: Arc<DynamicCostEstimator>,
    fill_rate: Arc<FillRateMonitor>,
    attributor: Arc<PnLAttributor>,
    metrics: Arc<MetricsRegistry>,
    max_staleness_ms: i64,
    iteration_budget_ms: u64,
}

impl TradingLoop {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        hub: Arc<MarketDataHub>,
        aggregator: SignalAggregator,
        classifier: Classifier,
        sizing: SizingConfig,
        risk_gate: Arc<RiskGate>,
        executor: Arc<HybridExecutor>,
        positions: Arc<PositionManager>,
        cost_estimator: Arc<DynamicCostEstimator>,
        fill_rate: Arc<FillRateMonitor>,
        attributor: Arc<PnLAttributor>,
        metrics: Arc<MetricsRegistry>,
        max_staleness_ms: i64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            hub,
            aggregator,
            classifier,
            sizing,
            risk_gate,
            executor,
            positions,
            cost_estimator,
            fill_rate,
            attributor,
            metrics,
            max_staleness_ms,
            iteration_budget_ms: 100,
        }
    }

    /// Runs until `cancel` fires. Each iteration: read snapshot, compute and
    /// classify signals, size the intent, gate on risk, route through
    /// execution, and fold any resulting fills into position/attribution/
    /// fill-rate/cost state. Transient per-iteration errors are logged and the
    /// loop continues; only cancellation stops it — the loop itself never
    /// turns a transient error into a halt.
    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                info!(symbol = %self.symbol, "trading loop canceled");
                return;
            }

            let now_ms = now_ms();
            let started = Instant::now();

            if let Err(e) = self.iterate(now_ms, &cancel).await {
                warn!(symbol = %self.symbol, error = %e, "iteration error, continuing");
            }

            let elapsed_ms = started.elapsed().as_millis() as u64;
            self.metrics.iteration_latency_ms.observe(elapsed_ms as f64);
            if elapsed_ms > self.iteration_budget_ms {
                warn!(symbol = %self.symbol, elapsed_ms, budget_ms = self.iteration_budget_ms, "iteration budget exceeded");
            }

            tokio::select! {
                _ = tokio::time::sleep(std::time::Duration::from_millis(5)) => {}
                _ = cancel.cancelled() => return,
            }
        }
    }

    async fn iterate(&self, now_ms: i64, cancel: &CancellationToken) -> anyhow::Result<()> {
        let snapshot = match self.hub.snapshot(&self.symbol, now_ms) {
            Some(snapshot) => snapshot,
            None => {
                debug!(symbol = %self.symbol, "snapshot stale or unavailable, skipping iteration");
                return Ok(());
            }
        };

        let halted = self.risk_gate.state().is_halted();
        self.metrics.halted.set(halted as i64);
        if halted {
            debug!(symbol = %self.symbol, "risk halted, skipping iteration");
            return Ok(());
        }

        let raw_score = self.aggregator.aggregate(&snapshot, now_ms);
        let confidence = self.classifier.classify(raw_score.value);
        let score = raw_score.with_confidence(confidence);

        let nav = self.risk_gate.state().nav();
        let size = size_intent(score.value, nav, snapshot.mid, &self.sizing);
        if size.is_zero() {
            return Ok(());
        }
        let side = if score.value >= 0.0 { Side::Buy } else { Side::Sell };

        let position = self.positions.position(&self.symbol);
        if let Err(rejection) = self.risk_gate.allow(IntendedOrder { side, size }, &position, &snapshot) {
            debug!(symbol = %self.symbol, %rejection, "risk gate denied intent");
            self.metrics.rejections_total.with_label_values(&[rejection_label(&rejection)]).inc();
            return Ok(());
        }

        let best_bid = snapshot.best_bid().unwrap_or(snapshot.mid);
        let best_ask = snapshot.best_ask().unwrap_or(snapshot.mid);
        let estimate = self.cost_estimator.estimate_cost(OrderKind::Limit, side, size, &snapshot);
        self.metrics.orders_total.with_label_values(&[&self.symbol, "limit"]).inc();

        let outcome = self
            .executor
            .execute(&self.symbol, side, size, &score, best_bid, best_ask, cancel)
            .await?;

        let Some(outcome) = outcome else {
            return Ok(());
        };

        self.fill_rate.record(outcome.confidence, outcome.filled);

        let realized_before = position.realized_pnl;
        let mut any_applied = false;
        for fill in &outcome.fills {
            if self.positions.apply_fill(fill) {
                any_applied = true;
                self.attributor.attribute(fill, snapshot.mid, &estimate);
                self.cost_estimator.record(&fill.symbol, fill.kind, estimate, fill.price, snapshot.mid);
                self.cost_estimator.slippage_estimator().record(&fill.symbol, fill.side, fill.price, snapshot.mid, fill.size);
                self.metrics.fills_total.with_label_values(&[&fill.symbol, &fill.side.to_string()]).inc();
            }
        }
        if any_applied {
            let realized_after = self.positions.position(&self.symbol).realized_pnl;
            self.risk_gate.on_trade(realized_after - realized_before, now_ms);
        }

        Ok(())
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Stable, low-cardinality label for `rejections_total`; variant name only,
/// never the formatted `Display` string (which embeds per-call numbers).
fn rejection_label(rejection: &RiskRejection) -> &'static str {
    match rejection {
        RiskRejection::Halted { .. } => "halted",
        RiskRejection::PositionLimitExceeded { .. } => "position_limit_exceeded",
        RiskRejection::SingleLossLimitExceeded { .. } => "single_loss_limit_exceeded",
        RiskRejection::DailyDrawdownWouldExceed => "daily_drawdown_would_exceed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn size_intent_respects_base_cap() {
        let config = SizingConfig { base_size: dec!(1), k: 1.0 };
        let size = size_intent(1.0, dec!(1_000_000), dec!(1500), &config);
        assert_eq!(size, dec!(1));
    }

    #[test]
    fn size_intent_scales_with_signal_value() {
        let config = SizingConfig { base_size: dec!(100), k: 1.0 };
        let size = size_intent(0.5, dec!(3000), dec!(1500), &config);
        assert_eq!(size, dec!(1));
    }

    #[test]
    fn size_intent_is_never_negative() {
        let config = SizingConfig { base_size: dec!(1), k: 1.0 };
        let size = size_intent(-0.8, dec!(1000), dec!(1500), &config);
        assert!(size >= Decimal::ZERO);
    }
}
