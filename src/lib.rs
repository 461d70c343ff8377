//! News-sentiment trading agent
//!
//! ```text
//! NewsSource -> SentimentScorer -> DecisionEngine -> PricePlanner -> OrderExecutor -> BrokerGateway
//!                                                                          |
//!                                          Coordinator (run failures) -> Notifier
//! ```

// Core modules
pub mod api;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod sentiment;
pub mod strategy;

// Re-export commonly used types
pub use crate::config::BotConfig;
pub use error::BotError;
pub use models::*;
pub use pipeline::{report_startup_failure, Coordinator, PipelineState, RunOutcome};

// Error handling
pub type Result<T> = std::result::Result<T, BotError>;
