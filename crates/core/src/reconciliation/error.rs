//! Reconciliation error types.

use chrono::NaiveDate;
use ledgerkeep_shared::AppError;
use ledgerkeep_shared::types::DiscrepancyId;
use thiserror::Error;

use super::types::ReconciliationStatus;
use crate::payment::GatewayError;
use crate::persistence::StoreError;

/// Errors that can occur during reconciliation.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// Provider feed could not be fetched.
    #[error("External fetch failed: {0}")]
    ExternalFetch(#[from] GatewayError),

    /// Store read or write failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Job not found.
    #[error("Reconciliation job not found: {0}")]
    JobNotFound(String),

    /// Discrepancy not found.
    #[error("Discrepancy not found: {0}")]
    DiscrepancyNotFound(DiscrepancyId),

    /// Discrepancy already resolved.
    #[error("Discrepancy already resolved: {0}")]
    AlreadyResolved(DiscrepancyId),

    /// Job status change not allowed.
    #[error("Cannot move reconciliation job from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: ReconciliationStatus,
        /// Requested status.
        to: ReconciliationStatus,
    },

    /// Range ends before it starts.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange {
        /// First day.
        start: NaiveDate,
        /// Last day.
        end: NaiveDate,
    },
}

impl ReconciliationError {
    /// Returns the error code for logs and alerts.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ExternalFetch(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::JobNotFound(_) => "JOB_NOT_FOUND",
            Self::DiscrepancyNotFound(_) => "DISCREPANCY_NOT_FOUND",
            Self::AlreadyResolved(_) => "DISCREPANCY_ALREADY_RESOLVED",
            Self::InvalidTransition { .. } => "INVALID_JOB_TRANSITION",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
        }
    }
}

impl From<ReconciliationError> for AppError {
    fn from(err: ReconciliationError) -> Self {
        match err {
            ReconciliationError::ExternalFetch(e) => e.into(),
            ReconciliationError::Store(e) => e.into(),
            ReconciliationError::JobNotFound(_) | ReconciliationError::DiscrepancyNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            ReconciliationError::AlreadyResolved(_) | ReconciliationError::InvalidTransition { .. } => {
                Self::BusinessRule(err.to_string())
            }
            ReconciliationError::InvalidDateRange { .. } => Self::Validation(err.to_string()),
        }
    }
}
