//! Internal payment transaction records and provider feed lines.

use chrono::{DateTime, NaiveDate, Utc};
use ledgerkeep_shared::types::PaymentTransactionId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::provider::PaymentProvider;

/// Kind of money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Customer payment.
    Payment,
    /// Refund to the customer.
    Refund,
    /// Funds pulled back by the provider.
    Chargeback,
    /// Manual adjustment.
    Adjustment,
}

impl TransactionType {
    /// Returns the string representation stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Payment => "PAYMENT",
            Self::Refund => "REFUND",
            Self::Chargeback => "CHARGEBACK",
            Self::Adjustment => "ADJUSTMENT",
        }
    }

    /// Parses the stored representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PAYMENT" => Some(Self::Payment),
            "REFUND" => Some(Self::Refund),
            "CHARGEBACK" => Some(Self::Chargeback),
            "ADJUSTMENT" => Some(Self::Adjustment),
            _ => None,
        }
    }
}

/// Lifecycle status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Awaiting settlement.
    Pending,
    /// Settled.
    Success,
    /// Declined or errored.
    Failed,
    /// Cancelled before settlement.
    Cancelled,
    /// Settled and under dispute.
    Disputed,
}

impl TransactionStatus {
    /// Returns the string representation stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Disputed => "DISPUTED",
        }
    }

    /// Parses the stored representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "SUCCESS" => Some(Self::Success),
            "FAILED" => Some(Self::Failed),
            "CANCELLED" => Some(Self::Cancelled),
            "DISPUTED" => Some(Self::Disputed),
            _ => None,
        }
    }

    /// Status as a provider would report it.
    ///
    /// Providers keep reporting a disputed payment as settled.
    #[must_use]
    pub const fn settlement_view(self) -> Self {
        match self {
            Self::Disputed => Self::Success,
            other => other,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internally recorded payment transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Row identifier.
    pub id: PaymentTransactionId,
    /// ID shared with the provider.
    pub transaction_id: String,
    /// Provider that processed the payment.
    pub provider: PaymentProvider,
    /// Kind of movement.
    pub transaction_type: TransactionType,
    /// Current status.
    pub status: TransactionStatus,
    /// Gross amount.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Fee withheld by the provider.
    pub provider_fee: Decimal,
    /// Commission retained by the platform.
    pub platform_fee: Decimal,
    /// Marketplace order.
    pub order_id: Option<String>,
    /// Whether reconciliation matched this transaction cleanly.
    pub reconciled: bool,
    /// When it was reconciled.
    pub reconciled_at: Option<DateTime<Utc>>,
    /// Provider dispute ID, once disputed.
    pub dispute_id: Option<String>,
    /// Original payment a refund belongs to.
    pub refunded_transaction_id: Option<String>,
    /// When the transaction was recorded.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Creates a pending payment with no fees.
    #[must_use]
    pub fn payment(
        transaction_id: impl Into<String>,
        provider: PaymentProvider,
        amount: Decimal,
        currency: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PaymentTransactionId::new(),
            transaction_id: transaction_id.into(),
            provider,
            transaction_type: TransactionType::Payment,
            status: TransactionStatus::Pending,
            amount,
            currency: currency.into(),
            provider_fee: Decimal::ZERO,
            platform_fee: Decimal::ZERO,
            order_id: None,
            reconciled: false,
            reconciled_at: None,
            dispute_id: None,
            refunded_transaction_id: None,
            created_at,
        }
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    /// Calendar date of the transaction in UTC.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    /// Marks the transaction reconciled; the first timestamp wins.
    pub fn mark_reconciled(&mut self, at: DateTime<Utc>) {
        if !self.reconciled {
            self.reconciled = true;
            self.reconciled_at = Some(at);
        }
    }

    /// Marks the transaction disputed and links the dispute.
    pub fn mark_disputed(&mut self, dispute_id: &str) {
        self.status = TransactionStatus::Disputed;
        self.dispute_id = Some(dispute_id.to_string());
    }
}

/// One line of a provider's settlement feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderTransaction {
    /// ID shared with the internal record.
    pub transaction_id: String,
    /// Amount as reported by the provider.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Provider-native status string.
    pub status: String,
    /// Free text.
    #[serde(default)]
    pub description: Option<String>,
    /// When the provider recorded the transaction.
    pub timestamp: DateTime<Utc>,
    /// Raw extra fields.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl ProviderTransaction {
    /// Calendar date of the provider record in UTC.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_mark_reconciled_keeps_first_timestamp() {
        let created = Utc::now();
        let mut txn = Transaction::payment("T1", PaymentProvider::Stripe, dec!(10), "USD", created);
        let first = created + chrono::Duration::minutes(1);
        txn.mark_reconciled(first);
        txn.mark_reconciled(first + chrono::Duration::hours(1));

        assert!(txn.reconciled);
        assert_eq!(txn.reconciled_at, Some(first));
    }

    #[test]
    fn test_mark_disputed() {
        let mut txn = Transaction::payment("T1", PaymentProvider::Bkash, dec!(10), "BDT", Utc::now())
            .with_status(TransactionStatus::Success);
        txn.mark_disputed("dp_1");

        assert_eq!(txn.status, TransactionStatus::Disputed);
        assert_eq!(txn.status.settlement_view(), TransactionStatus::Success);
        assert_eq!(txn.dispute_id.as_deref(), Some("dp_1"));
    }

    #[test]
    fn test_provider_transaction_deserializes_without_optionals() {
        let json = r#"{
            "transaction_id": "pi_1",
            "amount": "12.50",
            "currency": "USD",
            "status": "succeeded",
            "timestamp": "2026-03-02T10:00:00Z"
        }"#;
        let txn: ProviderTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(txn.amount, dec!(12.50));
        assert!(txn.metadata.is_none());
        assert_eq!(txn.date(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(TransactionStatus::parse("disputed"), Some(TransactionStatus::Disputed));
        assert_eq!(TransactionType::parse("REFUND"), Some(TransactionType::Refund));
        assert_eq!(TransactionStatus::parse("bogus"), None);
    }
}
