//! Runtime TOML configuration. Every key here is a runtime value: risk
//! limits change per deployment, not per build.

pub mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

impl Config {
    /// Loads and validates a TOML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates without requiring a filesystem path; used by
    /// `--check-config`.
    pub fn parse(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw).context("parsing config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            anyhow::bail!("symbols must not be empty");
        }

        let weight_sum = self.signals.weights.sum();
        if (weight_sum - 1.0).abs() > 0.05 {
            anyhow::bail!("signals.weights must sum to ~1.0, got {weight_sum}");
        }

        if !(self.signals.thresholds.theta_1 > self.signals.thresholds.theta_2 && self.signals.thresholds.theta_2 > 0.0) {
            anyhow::bail!("signals.thresholds requires theta_1 > theta_2 > 0");
        }

        if self.execution.strategy != "ioc_only" && self.execution.strategy != "hybrid" {
            anyhow::bail!("execution.strategy must be 'ioc_only' or 'hybrid', got '{}'", self.execution.strategy);
        }

        if self.risk.max_position_usd <= rust_decimal::Decimal::ZERO {
            anyhow::bail!("risk.max_position_usd must be positive");
        }
        if !(0.0..=1.0).contains(&self.risk.max_single_loss_pct) {
            anyhow::bail!("risk.max_single_loss_pct must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.risk.max_daily_drawdown_pct) {
            anyhow::bail!("risk.max_daily_drawdown_pct must be in [0, 1]");
        }

        for threshold in [
            self.monitoring.fill_rate.alert_threshold_high,
            self.monitoring.fill_rate.alert_threshold_medium,
            self.monitoring.fill_rate.critical_threshold,
        ] {
            if !(0.0..=1.0).contains(&threshold) {
                anyhow::bail!("monitoring.fill_rate thresholds must be in [0, 1]");
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!("invalid logging.level '{}'", self.logging.level);
        }

        Ok(())
    }
}
