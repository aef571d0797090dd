//! Email service for sending finance and dispute alerts.
//!
//! Uses `lettre` for SMTP transport.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;

use crate::config::EmailConfig;

/// Email service errors.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    BuildError(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendError(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for sending plain-text alert emails.
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new email service.
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Creates an SMTP transport.
    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| EmailError::SendError(e.to_string()))?
            .port(self.config.smtp_port);

        let builder = if self.config.smtp_username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            ))
        };

        Ok(builder.build())
    }

    /// Builds a plain-text message addressed to every recipient.
    fn build_message(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<Message, EmailError> {
        if recipients.is_empty() {
            return Err(EmailError::InvalidAddress("no recipients".to_string()));
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);
        let mut builder = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?,
            )
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);

        for recipient in recipients {
            builder = builder.to(recipient
                .parse()
                .map_err(|e| EmailError::InvalidAddress(format!("{recipient}: {e}")))?);
        }

        builder
            .body(body.to_string())
            .map_err(|e| EmailError::BuildError(e.to_string()))
    }

    /// Sends one plain-text email to a list of recipients.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be built or sent.
    pub async fn send_email(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        let message = self.build_message(recipients, subject, body)?;
        let transport = self.create_transport()?;
        transport
            .send(message)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        Ok(())
    }
}
