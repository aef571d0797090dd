//! Outbound alerts and support tickets.
//!
//! Both sinks are fire-and-forget from the caller's point of view: a
//! failure is logged and never undoes the ledger or dispute change that
//! triggered it.

pub mod alert;
pub mod logging;
pub mod ticket;

use async_trait::async_trait;
use thiserror::Error;

pub use alert::{DisputeAlert, DisputeAlertKind, LedgerVerificationAlert, ReconciliationAlert};
pub use logging::LoggingNotifier;
pub use ticket::{NewTicket, TicketCategory, TicketId, TicketPriority};

/// Alert or ticket delivery failure.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Message could not be built or sent.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// Sink is not reachable or not configured.
    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

impl NotifyError {
    /// Returns the error code for logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Delivery(_) => "NOTIFY_DELIVERY_FAILED",
            Self::Unavailable(_) => "NOTIFY_UNAVAILABLE",
        }
    }
}

/// Destination for operational alerts.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Dispute created, updated or closed.
    async fn send_dispute_alert(&self, alert: &DisputeAlert) -> Result<(), NotifyError>;

    /// Reconciliation job summary.
    async fn send_reconciliation_alert(&self, alert: &ReconciliationAlert) -> Result<(), NotifyError>;

    /// Verification check failure or nightly summary.
    async fn send_ledger_verification_alert(
        &self,
        alert: &LedgerVerificationAlert,
    ) -> Result<(), NotifyError>;
}

/// Destination for support tickets.
#[async_trait]
pub trait TicketSink: Send + Sync {
    /// Opens a ticket and returns its ID.
    async fn create_ticket(&self, ticket: NewTicket) -> Result<TicketId, NotifyError>;
}
