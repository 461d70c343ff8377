use super::BrokerGateway;
use crate::models::{OrderRequest, OutcomeCode, Timeframe};
use crate::Result;
use async_trait::async_trait;

/// Gateway wrapper that never sends orders
///
/// Login and quotes go to the wrapped gateway so the run sees real prices;
/// orders are logged and reported as done.
pub struct DryRunGateway<G> {
    inner: G,
}

impl<G: BrokerGateway> DryRunGateway<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<G: BrokerGateway> BrokerGateway for DryRunGateway<G> {
    async fn login(&self, account_id: u64, password: &str, server: &str) -> Result<()> {
        self.inner.login(account_id, password, server).await
    }

    async fn latest_price(&self, symbol: &str, timeframe: Timeframe) -> Result<Option<f64>> {
        self.inner.latest_price(symbol, timeframe).await
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OutcomeCode> {
        tracing::warn!(
            symbol = %order.symbol,
            side = %order.side,
            volume = order.volume,
            price = order.entry_price,
            tp = order.take_profit,
            "DRY RUN - order not sent"
        );
        Ok(OutcomeCode::DONE)
    }

    fn name(&self) -> &str {
        "DryRun"
    }
}
