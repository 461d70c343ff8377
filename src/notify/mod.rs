// Failure notifications
pub mod email;

pub use email::EmailNotifier;

use crate::config::EmailConfig;
use crate::Result;
use async_trait::async_trait;

pub const ERROR_SUBJECT: &str = "Trade Bot Error";

/// Delivers a message to the operator
///
/// Delivery is best-effort: callers log a returned error and carry on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, body: &str) -> Result<()>;

    fn name(&self) -> &str;
}

/// Notifier used when no delivery channel is configured
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        tracing::warn!(subject, "Notification (no channel configured): {}", body);
        Ok(())
    }

    fn name(&self) -> &str {
        "Log"
    }
}

/// Email when configured and valid, otherwise log only
pub fn notifier_for(email: Option<&EmailConfig>) -> Box<dyn Notifier> {
    match email.map(EmailNotifier::new) {
        Some(Ok(notifier)) => Box::new(notifier),
        Some(Err(e)) => {
            tracing::warn!("Email notifier unavailable, failures will only be logged: {}", e);
            Box::new(LogNotifier)
        }
        None => {
            tracing::warn!("Email not configured, failures will only be logged");
            Box::new(LogNotifier)
        }
    }
}
