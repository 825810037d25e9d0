use super::SlippageEstimator;
use crate::data::MarketData;
use crate::types::{Bps, OrderKind, Side, Size};
use parking_lot::Mutex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::warn;

/// `{fee_bps, slippage_bps, impact_bps, total_bps}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    pub fee_bps: Bps,
    pub slippage_bps: Bps,
    pub impact_bps: Bps,
    pub total_bps: Bps,
}

/// A realized cost breakdown recorded post-trade for drift monitoring.
#[derive(Debug, Clone, Copy)]
pub struct RealizedCost {
    pub estimate: CostEstimate,
    pub actual_slippage_bps: Bps,
}

const DEFAULT_POST_TRADE_CAPACITY: usize = 500;

/// Pre-trade cost decomposition and post-trade actualization.
pub struct DynamicCostEstimator {
    maker_fee_bps: Bps,
    taker_fee_bps: Bps,
    impact_alpha: f64,
    impact_beta: f64,
    slippage: Arc<SlippageEstimator>,
    post_trade: Mutex<HashMap<(String, OrderKind), VecDeque<RealizedCost>>>,
}

impl DynamicCostEstimator {
    pub fn new(maker_fee_bps: Bps, taker_fee_bps: Bps, impact_alpha: f64, impact_beta: f64, slippage: Arc<SlippageEstimator>) -> Self {
        Self { maker_fee_bps, taker_fee_bps, impact_alpha, impact_beta, slippage, post_trade: Mutex::new(HashMap::new()) }
    }

    /// The shared `SlippageEstimator` backing this estimator's pre-trade
    /// `slippage_bps`, exposed so callers can feed realized fills back into
    /// it via `SlippageEstimator::record`.
    pub fn slippage_estimator(&self) -> &Arc<SlippageEstimator> {
        &self.slippage
    }

    /// `fee_bps` dispatches on `kind` (maker vs taker); `slippage_bps` comes
    /// from the shared `SlippageEstimator`, falling back to 0 bps (logged) on
    /// failure; `impact_bps = alpha * (size/liquidity)^beta * (1 + (1 -
    /// liquidity_score))`, clamped to `[0.5, 10]`.
    pub fn estimate_cost(&self, kind: OrderKind, side: Side, size: Size, snapshot: &MarketData) -> CostEstimate {
        let fee_bps = kind.fee_bps(self.maker_fee_bps, self.taker_fee_bps);

        let slippage_bps = Decimal::try_from(self.slippage.estimate(&snapshot.symbol, side, size)).unwrap_or_else(|_| {
            warn!(symbol = %snapshot.symbol, "slippage estimate conversion failed, falling back to 0 bps");
            Decimal::ZERO
        });

        let passive_levels = match side {
            Side::Buy => &snapshot.asks,
            Side::Sell => &snapshot.bids,
        };
        let liquidity: f64 = passive_levels.iter().take(5).map(|l| l.size.to_f64().unwrap_or(0.0)).sum();
        let size_f = size.to_f64().unwrap_or(0.0);

        let impact_bps_f = if liquidity > 0.0 {
            let liquidity_score = (liquidity / (liquidity + size_f)).clamp(0.0, 1.0);
            self.impact_alpha * (size_f / liquidity).powf(self.impact_beta) * (1.0 + (1.0 - liquidity_score))
        } else {
            10.0
        };
        let impact_bps = Decimal::try_from(impact_bps_f.clamp(0.5, 10.0)).unwrap_or(Decimal::ONE);

        let total_bps = fee_bps + slippage_bps + impact_bps;
        CostEstimate { fee_bps, slippage_bps, impact_bps, total_bps }
    }

    /// Records the realized breakdown for `(symbol, kind)` against the
    /// pre-trade estimate, for estimate-vs-actual drift monitoring.
    pub fn record(&self, symbol: &str, kind: OrderKind, estimate: CostEstimate, fill_price: Decimal, reference_price: Decimal) {
        if reference_price.is_zero() {
            return;
        }
        let actual_slippage_bps = ((fill_price - reference_price) / reference_price).abs() * Decimal::from(10_000);
        let mut guard = self.post_trade.lock();
        let entry = guard.entry((symbol.to_string(), kind)).or_insert_with(|| VecDeque::with_capacity(DEFAULT_POST_TRADE_CAPACITY));
        entry.push_back(RealizedCost { estimate, actual_slippage_bps });
        while entry.len() > DEFAULT_POST_TRADE_CAPACITY {
            entry.pop_front();
        }
    }
}
