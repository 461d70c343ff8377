use crate::api::{with_timeout, BrokerGateway};
use crate::models::{OrderRequest, OrderResult, OrderSide, PriceLevels, Timeframe};
use crate::{BotError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Fetches quotes and submits orders through the broker gateway
///
/// Each `execute` call sends exactly one order and never retries. A rejected
/// order comes back as an unsuccessful [`OrderResult`], not as an error.
pub struct OrderExecutor {
    gateway: Arc<dyn BrokerGateway>,
    call_timeout: Duration,
}

impl OrderExecutor {
    pub fn new(gateway: Arc<dyn BrokerGateway>, call_timeout: Duration) -> Self {
        Self {
            gateway,
            call_timeout,
        }
    }

    /// Latest close for `symbol`; fails with `MarketDataUnavailable` when the broker has none
    pub async fn latest_price(&self, symbol: &str, timeframe: Timeframe) -> Result<f64> {
        let quote = with_timeout(
            "latest_price",
            self.call_timeout,
            self.gateway.latest_price(symbol, timeframe),
        )
        .await?;

        match quote {
            Some(price) => {
                tracing::info!(symbol, price, timeframe = %timeframe, "Fetched latest price");
                Ok(price)
            }
            None => {
                tracing::error!("Failed to retrieve rates for {}", symbol);
                Err(BotError::MarketDataUnavailable {
                    symbol: symbol.to_string(),
                })
            }
        }
    }

    /// Submit one order at the planned levels and interpret the outcome code
    pub async fn execute(
        &self,
        side: OrderSide,
        symbol: &str,
        levels: PriceLevels,
        volume: f64,
    ) -> Result<OrderResult> {
        let request = OrderRequest::new(symbol, side, volume, levels)?;

        tracing::info!(
            "Placing order: {} {} {} @ {:.4}, TP={:.4}",
            side,
            request.volume,
            request.symbol,
            request.entry_price,
            request.take_profit
        );

        let code = with_timeout(
            "submit_order",
            self.call_timeout,
            self.gateway.submit_order(&request),
        )
        .await?;

        let result = OrderResult::from_code(code);
        if result.success {
            tracing::info!(
                "Trade successful: {} at {:.4}, TP={:.4}",
                side,
                request.entry_price,
                request.take_profit
            );
        } else {
            tracing::error!("Trade failed: {}", code);
        }

        Ok(result)
    }
}
