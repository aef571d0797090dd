//! Dispute error types.

use ledgerkeep_shared::AppError;
use thiserror::Error;

use super::types::DisputeStatus;
use crate::ledger::LedgerError;
use crate::persistence::StoreError;

/// Errors that can occur while handling disputes.
#[derive(Debug, Error)]
pub enum DisputeError {
    /// Fund movement rejected by the ledger.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Dispute or transaction store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No dispute with this provider ID.
    #[error("Dispute not found: {0}")]
    NotFound(String),

    /// Operation not allowed in the current status.
    #[error("Cannot move dispute from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: DisputeStatus,
        /// Requested status.
        to: DisputeStatus,
    },
}

impl DisputeError {
    /// Returns the error code for logs and alerts.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::NotFound(_) => "DISPUTE_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_DISPUTE_TRANSITION",
        }
    }
}

impl From<DisputeError> for AppError {
    fn from(err: DisputeError) -> Self {
        match err {
            DisputeError::Ledger(e) => e.into(),
            DisputeError::Store(e) => e.into(),
            DisputeError::NotFound(_) => Self::NotFound(err.to_string()),
            DisputeError::InvalidTransition { .. } => Self::BusinessRule(err.to_string()),
        }
    }
}
