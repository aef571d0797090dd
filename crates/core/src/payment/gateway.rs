//! Contract for fetching provider settlement feeds.

use async_trait::async_trait;
use chrono::NaiveDate;
use ledgerkeep_shared::AppError;
use thiserror::Error;

use super::provider::PaymentProvider;
use super::transaction::ProviderTransaction;

/// Provider API failure.
///
/// Gateways surface failures as errors, never as empty feeds.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No endpoint configured for the provider.
    #[error("Provider {0} is not configured")]
    NotConfigured(PaymentProvider),

    /// Transport failure.
    #[error("Request to {provider} failed: {message}")]
    Request {
        /// Provider called.
        provider: PaymentProvider,
        /// Underlying error.
        message: String,
    },

    /// Call exceeded the configured timeout.
    #[error("Request to {0} timed out")]
    Timeout(PaymentProvider),

    /// Provider answered with a non-success status.
    #[error("{provider} responded with HTTP {status}: {body}")]
    UnexpectedStatus {
        /// Provider called.
        provider: PaymentProvider,
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// Response body could not be decoded.
    #[error("Could not decode {provider} response: {message}")]
    Decode {
        /// Provider called.
        provider: PaymentProvider,
        /// Decoder message.
        message: String,
    },
}

impl GatewayError {
    /// Returns the error code for logs and alerts.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotConfigured(_) => "PROVIDER_NOT_CONFIGURED",
            Self::Request { .. } => "PROVIDER_REQUEST_FAILED",
            Self::Timeout(_) => "PROVIDER_TIMEOUT",
            Self::UnexpectedStatus { .. } => "PROVIDER_HTTP_ERROR",
            Self::Decode { .. } => "PROVIDER_DECODE_ERROR",
        }
    }

    /// Returns true if retrying the call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Request { .. } | Self::Timeout(_) => true,
            Self::UnexpectedStatus { status, .. } => *status >= 500 || *status == 429,
            Self::NotConfigured(_) | Self::Decode { .. } => false,
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotConfigured(_) => Self::Configuration(err.to_string()),
            _ => Self::ExternalService(err.to_string()),
        }
    }
}

/// Source of provider settlement feeds.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Transactions the provider recorded on one calendar day (UTC).
    async fn fetch_transactions_by_date(
        &self,
        provider: PaymentProvider,
        date: NaiveDate,
    ) -> Result<Vec<ProviderTransaction>, GatewayError> {
        self.fetch_transactions_by_date_range(provider, date, date).await
    }

    /// Transactions the provider recorded from `start` through `end`, inclusive.
    async fn fetch_transactions_by_date_range(
        &self,
        provider: PaymentProvider,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ProviderTransaction>, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(GatewayError::Timeout(PaymentProvider::Stripe).is_retryable());
        assert!(
            GatewayError::UnexpectedStatus {
                provider: PaymentProvider::Nagad,
                status: 503,
                body: String::new(),
            }
            .is_retryable()
        );
        assert!(
            !GatewayError::UnexpectedStatus {
                provider: PaymentProvider::Nagad,
                status: 401,
                body: String::new(),
            }
            .is_retryable()
        );
        assert!(!GatewayError::NotConfigured(PaymentProvider::Bkash).is_retryable());
    }

    #[test]
    fn test_display_names_provider() {
        let err = GatewayError::Timeout(PaymentProvider::Bkash);
        assert_eq!(err.to_string(), "Request to BKASH timed out");
        assert_eq!(err.error_code(), "PROVIDER_TIMEOUT");
    }
}
