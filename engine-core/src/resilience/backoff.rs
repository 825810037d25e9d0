//! Exponential backoff for the market-data adapter's reconnect policy.

use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct BackoffConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub max_retries: Option<u32>,
    pub jitter_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_retries: None,
            jitter_factor: 0.2,
        }
    }
}

impl BackoffConfig {
    pub fn aggressive() -> Self {
        Self { initial_delay: Duration::from_millis(50), max_delay: Duration::from_secs(5), multiplier: 1.5, ..Self::default() }
    }

    pub fn conservative() -> Self {
        Self { initial_delay: Duration::from_secs(1), max_delay: Duration::from_secs(60), multiplier: 2.5, ..Self::default() }
    }

    pub fn unlimited() -> Self {
        Self { max_retries: None, ..Self::default() }
    }
}

/// Stateful exponential-backoff delay generator with jitter.
pub struct ExponentialBackoff {
    config: BackoffConfig,
    attempt: u32,
}

impl ExponentialBackoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config, attempt: 0 }
    }

    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    pub fn attempt_number(&self) -> u32 {
        self.attempt
    }

    pub fn can_retry(&self) -> bool {
        match self.config.max_retries {
            Some(max) => self.attempt < max,
            None => true,
        }
    }

    /// Computes the next delay and advances the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let base_ms = self.config.initial_delay.as_millis() as f64 * self.config.multiplier.powi(self.attempt as i32);
        let capped_ms = base_ms.min(self.config.max_delay.as_millis() as f64);
        let jitter = 1.0 + rand::thread_rng().gen_range(-self.config.jitter_factor..=self.config.jitter_factor);
        let delay_ms = (capped_ms * jitter).max(0.0) as u64;
        self.attempt = self.attempt.saturating_add(1);
        Duration::from_millis(delay_ms)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_and_caps() {
        let mut backoff = ExponentialBackoff::new(BackoffConfig { jitter_factor: 0.0, ..BackoffConfig::default() });
        let d0 = backoff.next_delay();
        let d1 = backoff.next_delay();
        assert!(d1 >= d0);
        for _ in 0..20 {
            backoff.next_delay();
        }
        assert!(backoff.next_delay() <= backoff.config().max_delay);
    }

    #[test]
    fn reset_returns_to_initial() {
        let mut backoff = ExponentialBackoff::new(BackoffConfig { jitter_factor: 0.0, ..BackoffConfig::default() });
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.attempt_number(), 0);
    }

    #[test]
    fn max_retries_is_honored() {
        let mut backoff = ExponentialBackoff::new(BackoffConfig { max_retries: Some(2), ..BackoffConfig::default() });
        assert!(backoff.can_retry());
        backoff.next_delay();
        backoff.next_delay();
        assert!(!backoff.can_retry());
    }
}
