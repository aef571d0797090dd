//! Notification sink that emails alerts over SMTP.

use async_trait::async_trait;
use ledgerkeep_core::notify::{
    DisputeAlert, LedgerVerificationAlert, NotificationSink, NotifyError, ReconciliationAlert,
};
use ledgerkeep_shared::config::AlertConfig;
use ledgerkeep_shared::{EmailError, EmailService};
use tracing::debug;

/// Sends dispute alerts to the dispute desk and everything else to finance.
#[derive(Clone)]
pub struct EmailNotifier {
    email: EmailService,
    finance_recipients: Vec<String>,
    dispute_recipients: Vec<String>,
}

impl EmailNotifier {
    /// Creates a notifier routing alerts per `alerts`.
    #[must_use]
    pub fn new(email: EmailService, alerts: &AlertConfig) -> Self {
        Self {
            email,
            finance_recipients: alerts.finance_recipients.clone(),
            dispute_recipients: alerts.dispute_recipients.clone(),
        }
    }

    async fn deliver(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        if recipients.is_empty() {
            return Err(NotifyError::Unavailable(format!(
                "no recipients configured for {subject:?}"
            )));
        }
        self.email
            .send_email(recipients, subject, body)
            .await
            .map_err(delivery_error)?;
        debug!(recipients = recipients.len(), subject, "Alert emailed");
        Ok(())
    }
}

fn delivery_error(err: EmailError) -> NotifyError {
    NotifyError::Delivery(err.to_string())
}

#[async_trait]
impl NotificationSink for EmailNotifier {
    async fn send_dispute_alert(&self, alert: &DisputeAlert) -> Result<(), NotifyError> {
        self.deliver(&self.dispute_recipients, &alert.subject(), &alert.body())
            .await
    }

    async fn send_reconciliation_alert(&self, alert: &ReconciliationAlert) -> Result<(), NotifyError> {
        self.deliver(&self.finance_recipients, &alert.subject(), &alert.body())
            .await
    }

    async fn send_ledger_verification_alert(
        &self,
        alert: &LedgerVerificationAlert,
    ) -> Result<(), NotifyError> {
        self.deliver(&self.finance_recipients, &alert.subject(), &alert.body())
            .await
    }
}
