//! Notification sink that only writes structured log events.
//!
//! Used when no SMTP server is configured.

use async_trait::async_trait;
use tracing::{info, warn};

use super::{
    DisputeAlert, LedgerVerificationAlert, NotificationSink, NotifyError, ReconciliationAlert,
};

/// Writes every alert to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotifier;

#[async_trait]
impl NotificationSink for LoggingNotifier {
    async fn send_dispute_alert(&self, alert: &DisputeAlert) -> Result<(), NotifyError> {
        info!(
            kind = alert.kind.as_str(),
            provider = %alert.dispute.provider,
            dispute_id = %alert.dispute.provider_dispute_id,
            status = %alert.dispute.status,
            amount = %alert.dispute.amount,
            "{}",
            alert.subject()
        );
        Ok(())
    }

    async fn send_reconciliation_alert(&self, alert: &ReconciliationAlert) -> Result<(), NotifyError> {
        info!(
            job_id = %alert.job.job_id,
            provider = %alert.job.provider,
            status = %alert.job.status,
            matched = alert.job.matched_count,
            discrepancies = alert.job.discrepancy_count,
            "{}",
            alert.subject()
        );
        Ok(())
    }

    async fn send_ledger_verification_alert(
        &self,
        alert: &LedgerVerificationAlert,
    ) -> Result<(), NotifyError> {
        if alert.passed {
            info!(details = alert.details.len(), "{}", alert.subject());
        } else {
            warn!(details = ?alert.details, "{}", alert.subject());
        }
        Ok(())
    }
}
