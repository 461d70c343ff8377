use std::time::Duration;

/// Every fault a pipeline run can raise.
///
/// Order rejections are not here: a non-done outcome code is reported through
/// [`crate::models::OrderResult`] and never aborts a run.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("broker gateway initialization failed: {0}")]
    GatewayInit(String),

    #[error("no market data available for {symbol}")]
    MarketDataUnavailable { symbol: String },

    #[error("invalid price {price}: must be positive and finite")]
    InvalidPrice { price: f64 },

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("{operation} timed out after {}s", timeout.as_secs_f64())]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("broker gateway error: {0}")]
    Gateway(String),

    #[error("news source error: {0}")]
    News(String),

    #[error("notification failed: {0}")]
    Notify(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<config::ConfigError> for BotError {
    fn from(err: config::ConfigError) -> Self {
        BotError::Config(err.to_string())
    }
}

impl BotError {
    /// Short machine-friendly label used in log fields and notification subjects
    pub fn kind(&self) -> &'static str {
        match self {
            BotError::GatewayInit(_) => "gateway_init",
            BotError::MarketDataUnavailable { .. } => "market_data_unavailable",
            BotError::InvalidPrice { .. } => "invalid_price",
            BotError::InvalidOrder(_) => "invalid_order",
            BotError::Timeout { .. } => "timeout",
            BotError::Gateway(_) => "gateway",
            BotError::News(_) => "news",
            BotError::Notify(_) => "notify",
            BotError::Config(_) => "config",
            BotError::Http(_) => "http",
        }
    }
}
