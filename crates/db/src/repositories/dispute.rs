//! Dispute repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ledgerkeep_core::dispute::{
    Dispute, DisputeReason, DisputeRepository, DisputeStatus, DisputeType,
};
use ledgerkeep_core::payment::PaymentProvider;
use ledgerkeep_core::persistence::StoreError;
use ledgerkeep_shared::types::DisputeId;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::convert::{parse_column, store_error, to_db, to_db_opt, to_utc, to_utc_opt};
use crate::entities::disputes;

/// Store of provider disputes, keyed by (provider, provider dispute ID).
#[derive(Debug, Clone)]
pub struct ProviderDisputeRepository {
    db: DatabaseConnection,
}

impl ProviderDisputeRepository {
    /// Creates a new dispute repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DisputeRepository for ProviderDisputeRepository {
    async fn find_by_provider_dispute_id(
        &self,
        provider: PaymentProvider,
        provider_dispute_id: &str,
    ) -> Result<Option<Dispute>, StoreError> {
        disputes::Entity::find()
            .filter(disputes::Column::Provider.eq(provider.as_str()))
            .filter(disputes::Column::ProviderDisputeId.eq(provider_dispute_id))
            .one(&self.db)
            .await
            .map_err(store_error)?
            .map(dispute_from_model)
            .transpose()
    }

    async fn insert(&self, dispute: &Dispute) -> Result<(), StoreError> {
        active_model(dispute)
            .insert(&self.db)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn update(&self, dispute: &Dispute) -> Result<Dispute, StoreError> {
        let next = Dispute {
            version: dispute.version + 1,
            ..dispute.clone()
        };
        let result = disputes::Entity::update_many()
            .set(active_model(&next))
            .filter(disputes::Column::Id.eq(dispute.id.into_inner()))
            .filter(disputes::Column::Version.eq(dispute.version))
            .exec(&self.db)
            .await
            .map_err(store_error)?;
        if result.rows_affected == 1 {
            return Ok(next);
        }

        let stored = disputes::Entity::find_by_id(dispute.id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_error)?;
        match stored {
            Some(row) => Err(StoreError::Conflict(format!(
                "dispute {} is at version {}, not {}",
                dispute.provider_dispute_id, row.version, dispute.version
            ))),
            None => Err(StoreError::not_found("Dispute", dispute.id)),
        }
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Dispute>, StoreError> {
        disputes::Entity::find()
            .filter(disputes::Column::Status.eq(DisputeStatus::EvidenceRequired.as_str()))
            .filter(disputes::Column::EvidenceDueBy.lt(to_db(now)))
            .order_by_asc(disputes::Column::EvidenceDueBy)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(dispute_from_model)
            .collect()
    }
}

fn active_model(d: &Dispute) -> disputes::ActiveModel {
    disputes::ActiveModel {
        id: Set(d.id.into_inner()),
        provider_dispute_id: Set(d.provider_dispute_id.clone()),
        provider: Set(d.provider.as_str().to_string()),
        transaction_id: Set(d.transaction_id.clone()),
        dispute_type: Set(d.dispute_type.as_str().to_string()),
        status: Set(d.status.as_str().to_string()),
        reason: Set(d.reason.as_str().to_string()),
        amount: Set(d.amount),
        fee: Set(d.fee),
        currency: Set(d.currency.clone()),
        evidence_due_by: Set(to_db_opt(d.evidence_due_by)),
        evidence_submitted: Set(d.evidence_submitted),
        evidence_submitted_at: Set(to_db_opt(d.evidence_submitted_at)),
        funds_frozen: Set(d.funds_frozen),
        funds_frozen_at: Set(to_db_opt(d.funds_frozen_at)),
        funds_released_at: Set(to_db_opt(d.funds_released_at)),
        admin_notified: Set(d.admin_notified),
        admin_notified_at: Set(to_db_opt(d.admin_notified_at)),
        provider_notified: Set(d.provider_notified),
        provider_notified_at: Set(to_db_opt(d.provider_notified_at)),
        resolution_notes: Set(d.resolution_notes.clone()),
        internal_notes: Set(d.internal_notes.clone()),
        received_at: Set(to_db(d.received_at)),
        resolved_at: Set(to_db_opt(d.resolved_at)),
        updated_at: Set(to_db(d.updated_at)),
        version: Set(d.version),
    }
}

fn dispute_from_model(row: disputes::Model) -> Result<Dispute, StoreError> {
    Ok(Dispute {
        id: DisputeId::from_uuid(row.id),
        provider: parse_column("provider", &row.provider, PaymentProvider::parse)?,
        dispute_type: parse_column("dispute_type", &row.dispute_type, DisputeType::parse)?,
        status: parse_column("status", &row.status, DisputeStatus::parse)?,
        reason: DisputeReason::parse_or_other(&row.reason),
        provider_dispute_id: row.provider_dispute_id,
        transaction_id: row.transaction_id,
        amount: row.amount,
        fee: row.fee,
        currency: row.currency,
        evidence_due_by: to_utc_opt(row.evidence_due_by),
        evidence_submitted: row.evidence_submitted,
        evidence_submitted_at: to_utc_opt(row.evidence_submitted_at),
        funds_frozen: row.funds_frozen,
        funds_frozen_at: to_utc_opt(row.funds_frozen_at),
        funds_released_at: to_utc_opt(row.funds_released_at),
        admin_notified: row.admin_notified,
        admin_notified_at: to_utc_opt(row.admin_notified_at),
        provider_notified: row.provider_notified,
        provider_notified_at: to_utc_opt(row.provider_notified_at),
        resolution_notes: row.resolution_notes,
        internal_notes: row.internal_notes,
        received_at: to_utc(row.received_at),
        resolved_at: to_utc_opt(row.resolved_at),
        updated_at: to_utc(row.updated_at),
        version: row.version,
    })
}
