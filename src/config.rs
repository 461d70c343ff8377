use crate::api::broker::DEFAULT_BROKER_URL;
use crate::api::newsapi::NEWSAPI_BASE;
use crate::models::Timeframe;
use crate::strategy::DEFAULT_THRESHOLD;
use crate::{BotError, Result};
use config::builder::{ConfigBuilder, DefaultState};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LOG_FILE: &str = "trade_bot.log";
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Broker session settings
#[derive(Clone)]
pub struct BrokerConfig {
    pub url: String,
    pub account_id: u64,
    pub password: String,
    pub server: String,
}

impl fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("url", &self.url)
            .field("account_id", &self.account_id)
            .field("password", &"***")
            .field("server", &self.server)
            .finish()
    }
}

/// SMTP notification settings
#[derive(Clone)]
pub struct EmailConfig {
    pub address: String,
    pub password: String,
    pub recipient: String,
    pub smtp_host: String,
    pub smtp_port: u16,
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("address", &self.address)
            .field("password", &"***")
            .field("recipient", &self.recipient)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .finish()
    }
}

#[derive(Clone)]
pub struct NewsConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub page_size: u32,
}

impl fmt::Debug for NewsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .finish()
    }
}

/// Parameters of one trading run
#[derive(Debug, Clone, PartialEq)]
pub struct TradingConfig {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub volume: f64,
    /// Loaded and range-checked; sizing uses the fixed `volume`
    pub risk_percentage: f64,
    pub take_profit_percent: f64,
    pub entry_discount_percent: f64,
    pub decision_threshold: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            symbol: "AAPL".to_string(),
            timeframe: Timeframe::M1,
            volume: 0.1,
            risk_percentage: 2.0,
            take_profit_percent: 10.0,
            entry_discount_percent: 2.0,
            decision_threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl TradingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(BotError::Config("SYMBOL must not be empty".into()));
        }
        if !self.volume.is_finite() || self.volume <= 0.0 {
            return Err(BotError::Config(format!(
                "VOLUME must be positive, got {}",
                self.volume
            )));
        }
        if !self.risk_percentage.is_finite()
            || self.risk_percentage <= 0.0
            || self.risk_percentage > 100.0
        {
            return Err(BotError::Config(format!(
                "RISK_PERCENTAGE must be in (0, 100], got {}",
                self.risk_percentage
            )));
        }
        if !self.take_profit_percent.is_finite() || self.take_profit_percent < 0.0 {
            return Err(BotError::Config(format!(
                "TAKE_PROFIT_PERCENT must be >= 0, got {}",
                self.take_profit_percent
            )));
        }
        if !self.entry_discount_percent.is_finite()
            || self.entry_discount_percent < 0.0
            || self.entry_discount_percent >= 100.0
        {
            return Err(BotError::Config(format!(
                "ENTRY_DISCOUNT_PERCENT must be in [0, 100), got {}",
                self.entry_discount_percent
            )));
        }
        if !self.decision_threshold.is_finite() || self.decision_threshold < 0.0 {
            return Err(BotError::Config(format!(
                "DECISION_THRESHOLD must be >= 0, got {}",
                self.decision_threshold
            )));
        }
        Ok(())
    }
}

/// Everything the process needs, built once at startup and passed down
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub broker: BrokerConfig,
    pub email: Option<EmailConfig>,
    pub news: NewsConfig,
    pub trading: TradingConfig,
    pub call_timeout: Duration,
    pub log_file: Option<PathBuf>,
}

// Flat view of the environment; variable names match the keys lowercased
#[derive(Debug, Deserialize)]
struct EnvSettings {
    account_number: Option<u64>,
    password: Option<String>,
    server: Option<String>,
    broker_url: String,

    email_address: Option<String>,
    email_password: Option<String>,
    recipient_email: Option<String>,
    smtp_host: String,
    smtp_port: u16,

    news_api_key: Option<String>,
    news_api_url: String,
    news_page_size: u32,

    symbol: String,
    timeframe: String,
    volume: f64,
    risk_percentage: f64,
    take_profit_percent: f64,
    entry_discount_percent: f64,
    decision_threshold: f64,

    call_timeout_secs: u64,
    log_file: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// Defaults shared by the full config and the failure-reporting subset
fn alert_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>> {
    Ok(builder
        .set_default("smtp_host", "smtp.gmail.com")?
        .set_default("smtp_port", 587)?
        .set_default("log_file", DEFAULT_LOG_FILE)?)
}

fn email_config(
    address: Option<String>,
    password: Option<String>,
    recipient: Option<String>,
    smtp_host: String,
    smtp_port: u16,
) -> Result<Option<EmailConfig>> {
    match (non_empty(address), non_empty(password), non_empty(recipient)) {
        (Some(address), Some(password), Some(recipient)) => Ok(Some(EmailConfig {
            address,
            password,
            recipient,
            smtp_host,
            smtp_port,
        })),
        (None, None, None) => Ok(None),
        _ => Err(BotError::Config(
            "EMAIL_ADDRESS, EMAIL_PASSWORD and RECIPIENT_EMAIL must be set together".into(),
        )),
    }
}

/// Where failures go: the log file and, when configured, email
///
/// Loaded separately from [`BotConfig`] so a broken trading or broker
/// configuration can still be logged and reported.
#[derive(Debug, Clone)]
pub struct AlertConfig {
    pub email: Option<EmailConfig>,
    pub log_file: Option<PathBuf>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            email: None,
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AlertSettings {
    email_address: Option<String>,
    email_password: Option<String>,
    recipient_email: Option<String>,
    smtp_host: String,
    smtp_port: u16,
    log_file: String,
}

impl AlertConfig {
    /// Load `.env` (if present) and read the alert settings; never fails
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_environment(config::Environment::default())
    }

    pub fn from_vars(vars: config::Map<String, String>) -> Self {
        Self::from_environment(config::Environment::default().source(Some(vars)))
    }

    fn from_environment(env: config::Environment) -> Self {
        let settings: AlertSettings = match Self::load(env) {
            Ok(settings) => settings,
            Err(_) => return Self::default(),
        };

        Self {
            email: email_config(
                settings.email_address,
                settings.email_password,
                settings.recipient_email,
                settings.smtp_host,
                settings.smtp_port,
            )
            .ok()
            .flatten(),
            log_file: non_empty(Some(settings.log_file)).map(PathBuf::from),
        }
    }

    fn load(env: config::Environment) -> Result<AlertSettings> {
        Ok(alert_defaults(config::Config::builder())?
            .add_source(env)
            .build()?
            .try_deserialize()?)
    }
}

impl BotConfig {
    /// Load `.env` (if present) and read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_environment(config::Environment::default())
    }

    /// Build from an explicit variable map instead of the process environment
    pub fn from_vars(vars: config::Map<String, String>) -> Result<Self> {
        Self::from_environment(config::Environment::default().source(Some(vars)))
    }

    fn from_environment(env: config::Environment) -> Result<Self> {
        let settings: EnvSettings = alert_defaults(config::Config::builder())?
            .set_default("broker_url", DEFAULT_BROKER_URL)?
            .set_default("news_api_url", NEWSAPI_BASE)?
            .set_default("news_page_size", 20)?
            .set_default("symbol", "AAPL")?
            .set_default("timeframe", "M1")?
            .set_default("volume", 0.1)?
            .set_default("risk_percentage", 2.0)?
            .set_default("take_profit_percent", 10.0)?
            .set_default("entry_discount_percent", 2.0)?
            .set_default("decision_threshold", DEFAULT_THRESHOLD)?
            .set_default("call_timeout_secs", DEFAULT_CALL_TIMEOUT.as_secs())?
            .add_source(env)
            .build()?
            .try_deserialize()?;

        Self::from_settings(settings)
    }

    fn from_settings(s: EnvSettings) -> Result<Self> {
        let account_id = s
            .account_number
            .ok_or_else(|| BotError::Config("ACCOUNT_NUMBER is required".into()))?;
        let password = non_empty(s.password)
            .ok_or_else(|| BotError::Config("PASSWORD is required".into()))?;
        let server =
            non_empty(s.server).ok_or_else(|| BotError::Config("SERVER is required".into()))?;

        let email = email_config(
            s.email_address,
            s.email_password,
            s.recipient_email,
            s.smtp_host,
            s.smtp_port,
        )?;

        let timeframe = s.timeframe.parse::<Timeframe>().map_err(BotError::Config)?;

        let trading = TradingConfig {
            symbol: s.symbol.trim().to_uppercase(),
            timeframe,
            volume: s.volume,
            risk_percentage: s.risk_percentage,
            take_profit_percent: s.take_profit_percent,
            entry_discount_percent: s.entry_discount_percent,
            decision_threshold: s.decision_threshold,
        };
        trading.validate()?;

        if s.call_timeout_secs == 0 {
            return Err(BotError::Config("CALL_TIMEOUT_SECS must be > 0".into()));
        }

        Ok(Self {
            broker: BrokerConfig {
                url: s.broker_url,
                account_id,
                password,
                server,
            },
            email,
            news: NewsConfig {
                api_key: non_empty(s.news_api_key),
                base_url: s.news_api_url,
                page_size: s.news_page_size,
            },
            trading,
            call_timeout: Duration::from_secs(s.call_timeout_secs),
            log_file: non_empty(Some(s.log_file)).map(PathBuf::from),
        })
    }
}
