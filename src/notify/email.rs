use super::Notifier;
use crate::config::EmailConfig;
use crate::{BotError, Result};
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Plain-text email over SMTP with STARTTLS
pub struct EmailNotifier {
    from: Mailbox,
    to: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let from: Mailbox = config
            .address
            .parse()
            .map_err(|e| BotError::Config(format!("invalid EMAIL_ADDRESS: {}", e)))?;
        let to: Mailbox = config
            .recipient
            .parse()
            .map_err(|e| BotError::Config(format!("invalid RECIPIENT_EMAIL: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| BotError::Config(format!("invalid SMTP host: {}", e)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.address.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { from, to, transport })
    }

    fn build_message(&self, subject: &str, body: &str) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| BotError::Notify(format!("failed to build email: {}", e)))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        let message = self.build_message(subject, body)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| BotError::Notify(format!("smtp delivery failed: {}", e)))?;

        tracing::info!("Email sent to {}: {}", self.to, subject);
        Ok(())
    }

    fn name(&self) -> &str {
        "Email"
    }
}
