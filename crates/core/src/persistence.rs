//! Errors shared by every persistence trait outside the ledger.

use ledgerkeep_shared::AppError;
use thiserror::Error;

/// Failure reported by a transaction, reconciliation or dispute store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Row not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity name.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Unique constraint or optimistic check failed.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Backing store failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Shorthand for [`StoreError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns the error code for logs and alerts.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Backend(_) => "STORAGE_ERROR",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::Conflict(_) => Self::Conflict(err.to_string()),
            StoreError::Backend(_) => Self::Database(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = StoreError::not_found("Dispute", "dp_1");
        assert_eq!(err.to_string(), "Dispute not found: dp_1");
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = StoreError::Backend("pool closed".into()).into();
        assert_eq!(app.error_code(), "DATABASE_ERROR");
    }
}
