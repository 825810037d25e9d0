use crate::signals::Confidence;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tracing::warn;

const DEFAULT_WINDOW: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRateHealth {
    Healthy,
    Degraded,
    Critical,
}

/// Thresholds differ by band: HIGH signals are expected to fill more often
/// than MEDIUM ones, since HIGH additionally gets an IOC fallback leg counted
/// separately (the maker-fill-rate numerator, not the fallback).
fn health_for(confidence: Confidence, rate: f64) -> FillRateHealth {
    let (healthy, degraded) = match confidence {
        Confidence::High => (0.80, 0.60),
        Confidence::Medium => (0.75, 0.60),
        Confidence::Low => (0.0, 0.0),
    };
    if rate >= healthy {
        FillRateHealth::Healthy
    } else if rate >= degraded {
        FillRateHealth::Degraded
    } else {
        FillRateHealth::Critical
    }
}

struct Window {
    window_size: usize,
    attempts: VecDeque<bool>,
}

impl Window {
    fn new(window_size: usize) -> Self {
        Self { window_size, attempts: VecDeque::with_capacity(window_size) }
    }

    fn push(&mut self, filled: bool) {
        if self.attempts.len() == self.window_size {
            self.attempts.pop_front();
        }
        self.attempts.push_back(filled);
    }

    fn rate(&self) -> Option<f64> {
        if self.attempts.is_empty() {
            return None;
        }
        let filled = self.attempts.iter().filter(|f| **f).count();
        Some(filled as f64 / self.attempts.len() as f64)
    }
}

/// Rolling fill-rate bookkeeping per confidence band.
/// A "filled" attempt is exactly the `ExecutionOutcome::filled` convention:
/// the maker leg completed in full inside its window. A critical reading
/// is an audit event only — it does not itself halt trading (that is
/// `RiskGate`'s job, driven by realized PnL, not fill quality).
pub struct FillRateMonitor {
    window_size: usize,
    windows: Mutex<HashMap<Confidence, Window>>,
}

impl FillRateMonitor {
    pub fn new(window_size: usize) -> Self {
        Self { window_size, windows: Mutex::new(HashMap::new()) }
    }

    pub fn record(&self, confidence: Confidence, filled: bool) {
        let mut windows = self.windows.lock();
        let window = windows.entry(confidence).or_insert_with(|| Window::new(self.window_size));
        window.push(filled);

        if let Some(rate) = window.rate() {
            if health_for(confidence, rate) == FillRateHealth::Critical {
                warn!(?confidence, rate, "fill rate critical");
            }
        }
    }

    pub fn fill_rate(&self, confidence: Confidence) -> Option<f64> {
        self.windows.lock().get(&confidence).and_then(Window::rate)
    }

    pub fn health(&self, confidence: Confidence) -> Option<FillRateHealth> {
        self.fill_rate(confidence).map(|rate| health_for(confidence, rate))
    }
}

impl Default for FillRateMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
