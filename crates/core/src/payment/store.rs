//! Read and annotate access to internal payment transactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::provider::PaymentProvider;
use super::transaction::Transaction;
use crate::persistence::StoreError;

/// Store of internally recorded payment transactions.
///
/// Transactions are created by the payment flow; the ledger core only reads
/// them and sets the reconciled and disputed annotations.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Looks up a transaction by its shared ID.
    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Transaction>, StoreError>;

    /// Transactions of a provider created in `[start, end)`.
    async fn find_by_provider_and_date_range(
        &self,
        provider: PaymentProvider,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// Marks transactions reconciled. Returns how many were newly marked.
    async fn mark_reconciled(
        &self,
        transaction_ids: &[String],
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Sets status DISPUTED and links the provider dispute ID.
    async fn mark_disputed(&self, transaction_id: &str, dispute_id: &str) -> Result<(), StoreError>;
}
