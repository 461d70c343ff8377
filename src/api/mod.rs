// External collaborators: broker connectivity and news retrieval
pub mod broker;
pub mod dry_run;
pub mod news;
pub mod newsapi;

pub use broker::{BrokerGateway, RestBrokerGateway};
pub use dry_run::DryRunGateway;
pub use news::{stock_query, NewsSource, StaticNewsSource};
pub use newsapi::NewsApiClient;

use crate::{BotError, Result};
use std::future::Future;
use std::time::Duration;

/// Await an external call, turning expiry into [`BotError::Timeout`]
pub async fn with_timeout<T, F>(operation: &'static str, timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(BotError::Timeout { operation, timeout }),
    }
}
