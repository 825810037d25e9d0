//! Microstructure signal engine: pure functions of an immutable `MarketData`
//! snapshot returning a value in `[-1, 1]`, a weighted aggregator, and a
//! tercile classifier into {HIGH, MEDIUM, LOW} confidence bands.

pub mod obi;
pub mod microprice;
pub mod impact;
pub mod aggregator;
pub mod classifier;

pub use aggregator::{SignalAggregator, SignalWeights};
pub use classifier::{Classifier, Confidence};

use crate::data::MarketData;
use serde::{Deserialize, Serialize};

/// `{value, confidence, components, ts}`. `Clone` is how mutation is
/// expressed ("dataclass-with-replace"): attaching a confidence after
/// aggregation constructs a new `SignalScore` with that one field set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalScore {
    pub value: f64,
    pub confidence: Confidence,
    pub components: Vec<f64>,
    pub ts_ms: i64,
}

impl SignalScore {
    pub fn with_confidence(&self, confidence: Confidence) -> Self {
        Self { confidence, ..self.clone() }
    }
}

/// A single microstructure feature, pure and re-entrant over an immutable
/// snapshot.
pub trait Signal {
    fn name(&self) -> &'static str;
    fn evaluate(&self, snapshot: &MarketData) -> f64;
}

pub use impact::ImpactSignal;
pub use microprice::MicropriceSignal;
pub use obi::ObiSignal;
