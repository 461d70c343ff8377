use crate::{BotError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A news article as delivered by a news source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl Article {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            source: None,
            published_at: None,
        }
    }
}

/// Sentiment of a single article
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Polarity {
    Negative,
    Neutral,
    Positive,
}

impl Polarity {
    pub fn value(self) -> i8 {
        match self {
            Polarity::Negative => -1,
            Polarity::Neutral => 0,
            Polarity::Positive => 1,
        }
    }
}

/// Trading decision derived from aggregate news polarity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradeDecision {
    Buy,
    Sell,
    Hold,
}

impl TradeDecision {
    /// Threshold rule: strictly above `threshold` buys, strictly below `-threshold` sells
    pub fn from_polarity(polarity: i64, threshold: f64) -> Self {
        let polarity = polarity as f64;
        if polarity > threshold {
            TradeDecision::Buy
        } else if polarity < -threshold {
            TradeDecision::Sell
        } else {
            TradeDecision::Hold
        }
    }

    /// The order side to trade, `None` for Hold
    pub fn side(self) -> Option<OrderSide> {
        match self {
            TradeDecision::Buy => Some(OrderSide::Buy),
            TradeDecision::Sell => Some(OrderSide::Sell),
            TradeDecision::Hold => None,
        }
    }
}

impl fmt::Display for TradeDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeDecision::Buy => "Buy",
            TradeDecision::Sell => "Sell",
            TradeDecision::Hold => "Hold",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => f.write_str("Buy"),
            OrderSide::Sell => f.write_str("Sell"),
        }
    }
}

/// Bar timeframe used when asking the broker for the latest price
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Timeframe {
    #[default]
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "M1" => Ok(Timeframe::M1),
            "M5" => Ok(Timeframe::M5),
            "M15" => Ok(Timeframe::M15),
            "M30" => Ok(Timeframe::M30),
            "H1" => Ok(Timeframe::H1),
            "H4" => Ok(Timeframe::H4),
            "D1" => Ok(Timeframe::D1),
            other => Err(format!("unknown timeframe '{}'", other)),
        }
    }
}

/// Entry and take-profit levels for one order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceLevels {
    pub entry_price: f64,
    pub take_profit: f64,
}

/// Typed order payload handed to the broker gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub volume: f64,
    pub entry_price: f64,
    pub take_profit: f64,
}

impl OrderRequest {
    /// Build a request from planned levels, rejecting payloads the broker cannot accept
    pub fn new(symbol: &str, side: OrderSide, volume: f64, levels: PriceLevels) -> Result<Self> {
        let request = Self {
            symbol: symbol.trim().to_string(),
            side,
            volume,
            entry_price: levels.entry_price,
            take_profit: levels.take_profit,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbol.is_empty() {
            return Err(BotError::InvalidOrder("symbol is empty".into()));
        }
        if !self.volume.is_finite() || self.volume <= 0.0 {
            return Err(BotError::InvalidOrder(format!(
                "volume must be positive, got {}",
                self.volume
            )));
        }
        if !self.entry_price.is_finite() || self.entry_price <= 0.0 {
            return Err(BotError::InvalidOrder(format!(
                "entry price must be positive, got {}",
                self.entry_price
            )));
        }
        if !self.take_profit.is_finite() || self.take_profit <= 0.0 {
            return Err(BotError::InvalidOrder(format!(
                "take-profit must be positive, got {}",
                self.take_profit
            )));
        }
        Ok(())
    }
}

/// Status code returned by the broker for an order submission
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OutcomeCode(pub u32);

impl OutcomeCode {
    pub const REQUOTE: OutcomeCode = OutcomeCode(10004);
    pub const REJECT: OutcomeCode = OutcomeCode(10006);
    pub const DONE: OutcomeCode = OutcomeCode(10009);
    pub const ERROR: OutcomeCode = OutcomeCode(10011);
    pub const INVALID: OutcomeCode = OutcomeCode(10013);
    pub const INVALID_VOLUME: OutcomeCode = OutcomeCode(10014);
    pub const INVALID_PRICE: OutcomeCode = OutcomeCode(10015);
    pub const INVALID_STOPS: OutcomeCode = OutcomeCode(10016);
    pub const MARKET_CLOSED: OutcomeCode = OutcomeCode(10018);
    pub const NO_MONEY: OutcomeCode = OutcomeCode(10019);

    pub fn is_done(self) -> bool {
        self == Self::DONE
    }

    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::REQUOTE => "requote",
            Self::REJECT => "rejected",
            Self::DONE => "done",
            Self::ERROR => "processing error",
            Self::INVALID => "invalid request",
            Self::INVALID_VOLUME => "invalid volume",
            Self::INVALID_PRICE => "invalid price",
            Self::INVALID_STOPS => "invalid stops",
            Self::MARKET_CLOSED => "market closed",
            Self::NO_MONEY => "insufficient funds",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", self.0, name),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Interpreted result of an order submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderResult {
    pub success: bool,
    pub code: OutcomeCode,
    pub error_detail: Option<String>,
}

impl OrderResult {
    pub fn from_code(code: OutcomeCode) -> Self {
        if code.is_done() {
            Self {
                success: true,
                code,
                error_detail: None,
            }
        } else {
            Self {
                success: false,
                code,
                error_detail: Some(code.to_string()),
            }
        }
    }
}
