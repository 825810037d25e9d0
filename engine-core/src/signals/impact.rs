use super::Signal;
use crate::data::MarketData;
use crate::types::Side;
use rust_decimal::prelude::ToPrimitive;

/// Net taker pressure over the trade ring already trimmed to `W` ms by
/// `MarketDataHub`: `(buyVol - sellVol) / (buyVol + sellVol)`.
#[derive(Default)]
pub struct ImpactSignal;

impl Signal for ImpactSignal {
    fn name(&self) -> &'static str {
        "impact"
    }

    fn evaluate(&self, snapshot: &MarketData) -> f64 {
        let mut buy_vol = 0.0;
        let mut sell_vol = 0.0;
        for trade in &snapshot.recent_trades {
            let size = trade.size.to_f64().unwrap_or(0.0);
            match trade.side {
                Side::Buy => buy_vol += size,
                Side::Sell => sell_vol += size,
            }
        }
        let denom = buy_vol + sell_vol;
        if denom <= 0.0 {
            return 0.0;
        }
        (buy_vol - sell_vol) / denom
    }
}
