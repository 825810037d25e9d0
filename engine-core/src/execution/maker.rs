use crate::data::ExchangeAdapter;
use crate::errors::EngineError;
use crate::signals::Confidence;
use crate::types::{Order, OrderKind, OrderStatus, Price, Side, Size};
use rand::random;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Places a limit order one tick inside the opposite side and waits up to a
/// confidence-dependent deadline, canceling on timeout.
pub struct ShallowMakerExecutor {
    adapter: Arc<dyn ExchangeAdapter>,
    tick: Price,
    timeout_high: Duration,
    timeout_medium: Duration,
    post_only: bool,
    poll_interval: Duration,
}

impl ShallowMakerExecutor {
    pub fn new(adapter: Arc<dyn ExchangeAdapter>, tick: Price, timeout_high: Duration, timeout_medium: Duration, post_only: bool) -> Self {
        Self { adapter, tick, timeout_high, timeout_medium, post_only, poll_interval: Duration::from_millis(100) }
    }

    fn timeout_for(&self, confidence: Confidence) -> Duration {
        timeout_for(confidence, self.timeout_high, self.timeout_medium)
    }

    /// Returns `Some(order)` on a full fill within the timeout. Returns
    /// `None` on expiry (the order is canceled; any partial fills already
    /// received still count toward position/attribution via the caller's
    /// fill stream) or on venue rejection (logged, no fallback attempted —
    /// the hybrid state machine decides whether to fall to IOC).
    pub async fn try_maker(
        &self,
        symbol: &str,
        side: Side,
        size: Size,
        confidence: Confidence,
        best_bid: Price,
        best_ask: Price,
        cancel: &CancellationToken,
    ) -> Result<Option<Order>, EngineError> {
        let price = match side {
            Side::Buy => best_bid + self.tick,
            Side::Sell => best_ask - self.tick,
        };

        let order_id = match self
            .adapter
            .place_order(symbol, side, OrderKind::Limit, price, size, self.post_only, random())
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!(symbol, %side, %price, error = %e, "maker order rejected");
                return Ok(None);
            }
        };

        let deadline = tokio::time::Instant::now() + self.timeout_for(confidence);

        loop {
            let order = self.adapter.get_order(order_id).await?;
            match order.status {
                OrderStatus::Filled => return Ok(Some(order)),
                OrderStatus::Rejected | OrderStatus::Canceled | OrderStatus::Expired => return Ok(None),
                _ if tokio::time::Instant::now() >= deadline => {
                    info!(symbol, %order_id, "maker timeout, canceling");
                    let _ = self.adapter.cancel_order(order_id).await;
                    return Ok(None);
                }
                _ => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.poll_interval) => continue,
                        _ = cancel.cancelled() => {
                            let _ = self.adapter.cancel_order(order_id).await;
                            return Ok(None);
                        }
                    }
                }
            }
        }
    }
}

fn timeout_for(confidence: Confidence, timeout_high: Duration, timeout_medium: Duration) -> Duration {
    match confidence {
        Confidence::High => timeout_high,
        _ => timeout_medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_dispatches_on_confidence() {
        let high = Duration::from_secs(5);
        let medium = Duration::from_secs(3);
        assert_eq!(timeout_for(Confidence::High, high, medium), high);
        assert_eq!(timeout_for(Confidence::Medium, high, medium), medium);
        assert_eq!(timeout_for(Confidence::Low, high, medium), medium);
    }
}
