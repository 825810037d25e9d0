use super::Signal;
use crate::data::MarketData;
use rust_decimal::prelude::ToPrimitive;

/// Order book imbalance: signed ratio of stacked bid vs ask volume across the
/// top `k` levels. Zero when the denominator is zero.
pub struct ObiSignal {
    pub k: usize,
}

impl Default for ObiSignal {
    fn default() -> Self {
        Self { k: 5 }
    }
}

impl Signal for ObiSignal {
    fn name(&self) -> &'static str {
        "obi"
    }

    fn evaluate(&self, snapshot: &MarketData) -> f64 {
        let bid_vol: f64 = snapshot.bids.iter().take(self.k).map(|l| l.size.to_f64().unwrap_or(0.0)).sum();
        let ask_vol: f64 = snapshot.asks.iter().take(self.k).map(|l| l.size.to_f64().unwrap_or(0.0)).sum();
        let denom = bid_vol + ask_vol;
        if denom <= 0.0 {
            return 0.0;
        }
        (bid_vol - ask_vol) / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Level;
    use rust_decimal_macros::dec;

    fn snapshot(bids: Vec<(f64, f64)>, asks: Vec<(f64, f64)>) -> MarketData {
        MarketData {
            symbol: "ETH-PERP".into(),
            ts_ms: 0,
            bids: bids.into_iter().map(|(p, s)| Level { price: rust_decimal::Decimal::try_from(p).unwrap(), size: rust_decimal::Decimal::try_from(s).unwrap() }).collect(),
            asks: asks.into_iter().map(|(p, s)| Level { price: rust_decimal::Decimal::try_from(p).unwrap(), size: rust_decimal::Decimal::try_from(s).unwrap() }).collect(),
            mid: dec!(1500),
            microprice: None,
            recent_trades: vec![],
        }
    }

    #[test]
    fn bounded_in_unit_interval() {
        let obi = ObiSignal::default();
        let snap = snapshot(vec![(1499.9, 10.0)], vec![(1500.1, 2.0)]);
        let v = obi.evaluate(&snap);
        assert!((-1.0..=1.0).contains(&v));
        assert!(v > 0.0);
    }

    #[test]
    fn zero_on_empty_book() {
        let obi = ObiSignal::default();
        let snap = snapshot(vec![], vec![]);
        assert_eq!(obi.evaluate(&snap), 0.0);
    }
}
