use crate::models::{OrderRequest, OrderSide, OutcomeCode, Timeframe};
use crate::{BotError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::RwLock;

pub const DEFAULT_BROKER_URL: &str = "http://127.0.0.1:8228";

/// Brokerage account connectivity consumed by the pipeline
#[async_trait]
pub trait BrokerGateway: Send + Sync {
    /// Open a session for the account
    ///
    /// Fails with [`BotError::GatewayInit`] when the terminal is unreachable or
    /// rejects the credentials.
    async fn login(&self, account_id: u64, password: &str, server: &str) -> Result<()>;

    /// Close of the most recent bar, `None` when the broker has no data
    async fn latest_price(&self, symbol: &str, timeframe: Timeframe) -> Result<Option<f64>>;

    /// Submit one order and return the broker's outcome code
    async fn submit_order(&self, order: &OrderRequest) -> Result<OutcomeCode>;

    /// Get gateway name
    fn name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    account: u64,
    password: &'a str,
    server: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct Bar {
    #[serde(default)]
    #[allow(dead_code)]
    time: i64,
    close: f64,
}

#[derive(Debug, Serialize)]
struct OrderPayload<'a> {
    action: &'static str,
    symbol: &'a str,
    volume: f64,
    #[serde(rename = "type")]
    order_type: OrderSide,
    price: f64,
    tp: f64,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    retcode: u32,
    #[serde(default)]
    comment: Option<String>,
}

/// JSON bridge to a MetaTrader-style trading terminal
///
/// Endpoints:
/// - `POST /login` -> `{ "token": ... }`
/// - `POST /symbols/{symbol}/select`
/// - `GET /rates/{symbol}?timeframe=M1&count=1` -> `[{ "time", "close", ... }]`
/// - `POST /orders` -> `{ "retcode": 10009, "comment": ... }`
pub struct RestBrokerGateway {
    client: Client,
    base_url: String,
    session: RwLock<Option<String>>,
}

impl RestBrokerGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: RwLock::new(None),
        })
    }

    async fn token(&self) -> Result<String> {
        self.session
            .read()
            .await
            .clone()
            .ok_or_else(|| BotError::Gateway("no active session, call login first".to_string()))
    }

    /// Add `symbol` to the terminal's market watch; `false` when the symbol is unknown
    async fn select_symbol(&self, symbol: &str, token: &str) -> Result<bool> {
        let url = format!("{}/symbols/{}/select", self.base_url, symbol);
        let response = self.client.post(&url).bearer_auth(token).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::warn!("Symbol {} not found on the terminal", symbol);
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(BotError::Gateway(format!(
                "symbol select for {} failed with status {}",
                symbol,
                response.status()
            )));
        }
        Ok(true)
    }
}

#[async_trait]
impl BrokerGateway for RestBrokerGateway {
    async fn login(&self, account_id: u64, password: &str, server: &str) -> Result<()> {
        let url = format!("{}/login", self.base_url);
        let body = LoginRequest {
            account: account_id,
            password,
            server,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::GatewayInit(format!("terminal unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(BotError::GatewayInit(format!(
                "login rejected with status {}: {}",
                status, detail
            )));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| BotError::GatewayInit(format!("malformed login response: {}", e)))?;

        *self.session.write().await = Some(login.token);
        tracing::info!("Logged in to account {} successfully.", account_id);
        Ok(())
    }

    async fn latest_price(&self, symbol: &str, timeframe: Timeframe) -> Result<Option<f64>> {
        let token = self.token().await?;
        if !self.select_symbol(symbol, &token).await? {
            return Ok(None);
        }

        let url = format!("{}/rates/{}", self.base_url, symbol);
        let response = self
            .client
            .get(&url)
            .query(&[("timeframe", timeframe.as_str()), ("count", "1")])
            .bearer_auth(&token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(BotError::Gateway(format!(
                "rates request for {} failed with status {}",
                symbol,
                response.status()
            )));
        }

        let bars: Vec<Bar> = response.json().await?;
        Ok(bars.first().map(|bar| bar.close))
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OutcomeCode> {
        let token = self.token().await?;
        let url = format!("{}/orders", self.base_url);
        let payload = OrderPayload {
            action: "deal",
            symbol: &order.symbol,
            volume: order.volume,
            order_type: order.side,
            price: order.entry_price,
            tp: order.take_profit,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BotError::Gateway(format!(
                "order submission failed with status {}",
                response.status()
            )));
        }

        let result: OrderResponse = response.json().await?;
        if let Some(comment) = result.comment.as_deref().filter(|c| !c.is_empty()) {
            tracing::debug!(retcode = result.retcode, "Broker comment: {}", comment);
        }
        Ok(OutcomeCode(result.retcode))
    }

    fn name(&self) -> &str {
        "RestBroker"
    }
}
