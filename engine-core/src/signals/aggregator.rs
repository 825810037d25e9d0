use super::{Confidence, ImpactSignal, MicropriceSignal, ObiSignal, Signal, SignalScore};
use crate::data::MarketData;
use serde::{Deserialize, Serialize};

/// Per-signal blend weights; expected to sum to ~1 (`Config::validate`
/// enforces this at load time).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalWeights {
    pub obi: f64,
    pub microprice: f64,
    pub impact: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self { obi: 0.5, microprice: 0.3, impact: 0.2 }
    }
}

impl SignalWeights {
    pub fn sum(&self) -> f64 {
        self.obi + self.microprice + self.impact
    }
}

/// Weighted sum of the individual signal values, clamped to `[-1, 1]`. The
/// per-signal components are preserved on the resulting `SignalScore` for
/// attribution and debugging, independent of the blend.
///
/// The aggregate is the weighted sum of *values*, not a magnitude-weighted
/// or sum-of-absolute-values quantity.
pub struct SignalAggregator {
    obi: ObiSignal,
    microprice: MicropriceSignal,
    impact: ImpactSignal,
    weights: SignalWeights,
}

impl SignalAggregator {
    pub fn new(weights: SignalWeights) -> Self {
        Self { obi: ObiSignal::default(), microprice: MicropriceSignal, impact: ImpactSignal, weights }
    }

    pub fn aggregate(&self, snapshot: &MarketData, ts_ms: i64) -> SignalScore {
        let obi = self.obi.evaluate(snapshot);
        let microprice = self.microprice.evaluate(snapshot);
        let impact = self.impact.evaluate(snapshot);

        let value = (self.weights.obi * obi + self.weights.microprice * microprice + self.weights.impact * impact)
            .clamp(-1.0, 1.0);

        SignalScore { value, confidence: Confidence::Low, components: vec![obi, microprice, impact], ts_ms }
    }
}
