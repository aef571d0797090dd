//! Ledger error types.
//!
//! Invariant violations (unbalanced postings, non-positive amounts) are hard
//! failures raised to the immediate caller and never corrected silently.

use ledgerkeep_shared::AppError;
use ledgerkeep_shared::types::PostingId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Posting has no entries.
    #[error("Posting must have at least one entry")]
    EmptyPosting,

    /// Posting does not balance in one currency.
    #[error("Posting is not balanced in {currency}. Debit: {debit}, Credit: {credit}")]
    UnbalancedPosting {
        /// Currency whose entries do not balance.
        currency: String,
        /// Total debit amount in that currency.
        debit: Decimal,
        /// Total credit amount in that currency.
        credit: Decimal,
    },

    /// Entry amount is zero or negative.
    #[error("Entry amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// Entry has no currency code.
    #[error("Entry currency must be a three-letter ISO code, got {0:?}")]
    InvalidCurrency(String),

    // ========== State Errors ==========
    /// Posting not found.
    #[error("Posting not found: {0}")]
    PostingNotFound(PostingId),

    // ========== Concurrency Errors ==========
    /// Another writer advanced a running balance first.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Storage Errors ==========
    /// Backing store failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Returns the error code for logs and alerts.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyPosting => "EMPTY_POSTING",
            Self::UnbalancedPosting { .. } => "UNBALANCED_POSTING",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidCurrency(_) => "INVALID_CURRENCY",
            Self::PostingNotFound(_) => "POSTING_NOT_FOUND",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::EmptyPosting
            | LedgerError::UnbalancedPosting { .. }
            | LedgerError::InvalidAmount(_)
            | LedgerError::InvalidCurrency(_) => Self::Validation(err.to_string()),
            LedgerError::PostingNotFound(_) => Self::NotFound(err.to_string()),
            LedgerError::ConcurrentModification => Self::Conflict(err.to_string()),
            LedgerError::Storage(_) => Self::Database(err.to_string()),
        }
    }
}
