use crate::types::{Price, Side, Size};
use parking_lot::Mutex;
use rust_decimal::prelude::ToPrimitive;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

const DEFAULT_CAPACITY: usize = 1000;
const DEFAULT_FALLBACK_BPS: f64 = 1.5;

#[derive(Debug, Clone, Copy)]
struct Observation {
    slippage_bps: f64,
    size: f64,
}

#[derive(Default)]
struct History {
    samples: VecDeque<Observation>,
}

/// Rolling estimate of expected slippage (bps) by `(symbol, side)`. Shared
/// across all per-symbol loops, so internally synchronized.
pub struct SlippageEstimator {
    capacity: usize,
    fallback_bps: f64,
    history: Mutex<HashMap<(String, Side), History>>,
}

impl SlippageEstimator {
    pub fn new(capacity: usize, fallback_bps: f64) -> Arc<Self> {
        Arc::new(Self { capacity, fallback_bps, history: Mutex::new(HashMap::new()) })
    }

    /// `median(recent) * size_factor(size)`. Returns the configured fallback
    /// when there is no history yet for this `(symbol, side)`.
    pub fn estimate(&self, symbol: &str, side: Side, size: Size) -> f64 {
        let guard = self.history.lock();
        let key = (symbol.to_string(), side);
        let Some(history) = guard.get(&key) else {
            return self.fallback_bps;
        };
        if history.samples.is_empty() {
            return self.fallback_bps;
        }
        let median_slippage = median(history.samples.iter().map(|o| o.slippage_bps));
        let median_size = median(history.samples.iter().map(|o| o.size));
        median_slippage * size_factor(size.to_f64().unwrap_or(0.0), median_size)
    }

    /// Appends an observed slippage sample (computed by the caller from
    /// `|fill_price - reference_price| / reference_price * 1e4`). History is
    /// trimmed to `capacity`, dropping the oldest sample.
    pub fn record(&self, symbol: &str, side: Side, fill_price: Price, reference_price: Price, size: Size) {
        if reference_price.is_zero() {
            return;
        }
        let slippage_bps = ((fill_price - reference_price) / reference_price).abs() * rust_decimal::Decimal::from(10_000);
        let slippage_bps = slippage_bps.to_f64().unwrap_or(0.0);
        let size = size.to_f64().unwrap_or(0.0);

        let mut guard = self.history.lock();
        let key = (symbol.to_string(), side);
        let history = guard.entry(key).or_default();
        history.samples.push_back(Observation { slippage_bps, size });
        while history.samples.len() > self.capacity {
            history.samples.pop_front();
        }
    }
}

/// Non-decreasing, bounded growth factor: identity at or below the median
/// observed size, linear growth up to a 2x cap at 10x median size.
fn size_factor(size: f64, median_size: f64) -> f64 {
    if median_size <= 0.0 {
        return 1.0;
    }
    let ratio = size / median_size;
    if ratio <= 1.0 {
        1.0
    } else {
        let capped_ratio = ratio.min(10.0);
        1.0 + (capped_ratio - 1.0) / 9.0
    }
}

fn median(values: impl Iterator<Item = f64>) -> f64 {
    let mut v: Vec<f64> = values.collect();
    if v.is_empty() {
        return 0.0;
    }
    v.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2.0
    } else {
        v[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_history_returns_fallback() {
        let estimator = SlippageEstimator::new(DEFAULT_CAPACITY, DEFAULT_FALLBACK_BPS);
        assert_eq!(estimator.estimate("ETH-PERP", Side::Buy, dec!(1)), DEFAULT_FALLBACK_BPS);
    }

    #[test]
    fn record_then_estimate_reflects_history() {
        let estimator = SlippageEstimator::new(DEFAULT_CAPACITY, DEFAULT_FALLBACK_BPS);
        estimator.record("ETH-PERP", Side::Buy, dec!(1500.1), dec!(1500.0), dec!(1));
        let est = estimator.estimate("ETH-PERP", Side::Buy, dec!(1));
        assert!(est > 0.0);
    }

    #[test]
    fn larger_size_yields_higher_or_equal_estimate() {
        let estimator = SlippageEstimator::new(DEFAULT_CAPACITY, DEFAULT_FALLBACK_BPS);
        for _ in 0..5 {
            estimator.record("ETH-PERP", Side::Buy, dec!(1500.1), dec!(1500.0), dec!(1));
        }
        let small = estimator.estimate("ETH-PERP", Side::Buy, dec!(1));
        let large = estimator.estimate("ETH-PERP", Side::Buy, dec!(10));
        assert!(large >= small);
    }

    #[test]
    fn capacity_is_bounded() {
        let estimator = SlippageEstimator::new(4, DEFAULT_FALLBACK_BPS);
        for i in 0..10 {
            estimator.record("ETH-PERP", Side::Buy, dec!(1500) + rust_decimal::Decimal::from(i), dec!(1500), dec!(1));
        }
        let guard = estimator.history.lock();
        assert_eq!(guard.get(&("ETH-PERP".to_string(), Side::Buy)).unwrap().samples.len(), 4);
    }
}
