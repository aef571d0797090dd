//! Persistence contract for disputes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::types::Dispute;
use crate::payment::PaymentProvider;
use crate::persistence::StoreError;

/// Store of disputes. Disputes are never deleted.
#[async_trait]
pub trait DisputeRepository: Send + Sync {
    /// Looks up a dispute by provider and provider-side ID.
    async fn find_by_provider_dispute_id(
        &self,
        provider: PaymentProvider,
        provider_dispute_id: &str,
    ) -> Result<Option<Dispute>, StoreError>;

    /// Inserts a new dispute; `Conflict` if the provider ID exists.
    async fn insert(&self, dispute: &Dispute) -> Result<(), StoreError>;

    /// Overwrites a dispute if its stored `version` still equals
    /// `dispute.version`, and returns it as stored with the version bumped.
    ///
    /// `Conflict` when another writer updated it first, `NotFound` when it
    /// does not exist.
    async fn update(&self, dispute: &Dispute) -> Result<Dispute, StoreError>;

    /// Disputes in EVIDENCE_REQUIRED whose deadline is before `now`.
    async fn find_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Dispute>, StoreError>;
}
