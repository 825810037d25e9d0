use crate::data::ExchangeAdapter;
use crate::errors::EngineError;
use crate::types::{Order, OrderKind, Price, Side, Size};
use rand::random;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::warn;

/// Crosses the spread for an immediate fill-or-discard.
/// Terminal outcomes only: FILLED (possibly partial), CANCELED, REJECTED.
pub struct IocExecutor {
    adapter: Arc<dyn ExchangeAdapter>,
    max_cross_bps: Decimal,
}

impl IocExecutor {
    pub fn new(adapter: Arc<dyn ExchangeAdapter>, max_cross_bps: Decimal) -> Self {
        Self { adapter, max_cross_bps }
    }

    /// For BUY, crosses at `best_ask` (or further, capped by
    /// `max_cross_bps`); symmetric for SELL.
    pub async fn execute(&self, symbol: &str, side: Side, size: Size, best_bid: Price, best_ask: Price) -> Result<Order, EngineError> {
        let cap = self.max_cross_bps / Decimal::from(10_000);
        let price = match side {
            Side::Buy => best_ask * (Decimal::ONE + cap),
            Side::Sell => best_bid * (Decimal::ONE - cap),
        };

        let order_id = self
            .adapter
            .place_order(symbol, side, OrderKind::Ioc, price, size, false, random())
            .await
            .map_err(|e| {
                warn!(symbol, %side, error = %e, "ioc order rejected at submission");
                e
            })?;

        let order = self.adapter.get_order(order_id).await?;
        if !order.status.is_terminal() {
            // IOC orders are terminal by construction at the venue; a
            // non-terminal status here means the adapter hasn't caught up
            // yet. Re-fetch once rather than looping indefinitely — IOC is
            // meant to be a single round trip.
            return self.adapter.get_order(order_id).await.map_err(Into::into);
        }
        Ok(order)
    }
}
