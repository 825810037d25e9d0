//! Prometheus metrics surface. No HTTP exporter lives in this crate — a
//! binary embedding the engine is responsible for serving `registry()`'s
//! output; scraping is ambient observability, not part of the trading core.

use prometheus::{Histogram, HistogramOpts, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};

pub struct MetricsRegistry {
    registry: Registry,
    pub orders_total: IntCounterVec,
    pub fills_total: IntCounterVec,
    pub rejections_total: IntCounterVec,
    pub fill_rate_pct: IntGaugeVec,
    pub halted: IntGauge,
    pub iteration_latency_ms: Histogram,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let orders_total = IntCounterVec::new(Opts::new("orders_total", "orders submitted by symbol and kind"), &["symbol", "kind"])?;
        let fills_total = IntCounterVec::new(Opts::new("fills_total", "fills received by symbol and side"), &["symbol", "side"])?;
        let rejections_total = IntCounterVec::new(Opts::new("rejections_total", "order rejections by reason"), &["reason"])?;
        let fill_rate_pct = IntGaugeVec::new(Opts::new("fill_rate_pct", "rolling fill rate by confidence band, in integer percent"), &["confidence"])?;
        let halted = IntGauge::new("halted", "1 if the risk halt latch is tripped, else 0")?;
        let iteration_latency_ms = Histogram::with_opts(HistogramOpts::new("iteration_latency_ms", "trading loop iteration latency in ms"))?;

        registry.register(Box::new(orders_total.clone()))?;
        registry.register(Box::new(fills_total.clone()))?;
        registry.register(Box::new(rejections_total.clone()))?;
        registry.register(Box::new(fill_rate_pct.clone()))?;
        registry.register(Box::new(halted.clone()))?;
        registry.register(Box::new(iteration_latency_ms.clone()))?;

        Ok(Self { registry, orders_total, fills_total, rejections_total, fill_rate_pct, halted, iteration_latency_ms })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_without_duplicate_metric_names() {
        let metrics = MetricsRegistry::new().unwrap();
        assert!(!metrics.registry().gather().is_empty());
    }
}
