//! Reconciliation job and discrepancy repository.

use async_trait::async_trait;
use ledgerkeep_core::payment::PaymentProvider;
use ledgerkeep_core::persistence::StoreError;
use ledgerkeep_core::reconciliation::{
    Discrepancy, DiscrepancySeverity, DiscrepancyType, ReconciliationJob,
    ReconciliationRepository, ReconciliationStatus, ReconciliationTrigger,
};
use ledgerkeep_shared::types::{DiscrepancyId, ReconciliationJobId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

use super::convert::{
    parse_column, store_error, to_db, to_db_opt, to_i64, to_u64, to_utc, to_utc_opt,
};
use crate::entities::{reconciliation_discrepancies, reconciliation_jobs};

/// Store of reconciliation jobs and their discrepancies.
#[derive(Debug, Clone)]
pub struct ReconciliationJobRepository {
    db: DatabaseConnection,
}

impl ReconciliationJobRepository {
    /// Creates a new reconciliation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Deletes a job; its discrepancies go with it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no job has this ID.
    pub async fn delete_job(&self, job_id: &str) -> Result<(), StoreError> {
        let result = reconciliation_jobs::Entity::delete_many()
            .filter(reconciliation_jobs::Column::JobId.eq(job_id))
            .exec(&self.db)
            .await
            .map_err(store_error)?;
        if result.rows_affected == 0 {
            return Err(StoreError::not_found("ReconciliationJob", job_id));
        }
        Ok(())
    }
}

#[async_trait]
impl ReconciliationRepository for ReconciliationJobRepository {
    async fn insert_job(&self, job: &ReconciliationJob) -> Result<(), StoreError> {
        job_active_model(job)
            .insert(&self.db)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn update_job(&self, job: &ReconciliationJob) -> Result<(), StoreError> {
        job_active_model(job)
            .update(&self.db)
            .await
            .map_err(|e| missing_row(e, "ReconciliationJob", &job.job_id))?;
        Ok(())
    }

    async fn finish_job(&self, job: &ReconciliationJob) -> Result<bool, StoreError> {
        let result = reconciliation_jobs::Entity::update_many()
            .set(job_active_model(job))
            .filter(reconciliation_jobs::Column::Id.eq(job.id.into_inner()))
            .filter(
                reconciliation_jobs::Column::Status.ne(ReconciliationStatus::Cancelled.as_str()),
            )
            .exec(&self.db)
            .await
            .map_err(store_error)?;
        if result.rows_affected == 1 {
            return Ok(true);
        }
        match self.find_job(&job.job_id).await? {
            Some(_) => Ok(false),
            None => Err(StoreError::not_found("ReconciliationJob", &job.job_id)),
        }
    }

    async fn find_job(&self, job_id: &str) -> Result<Option<ReconciliationJob>, StoreError> {
        reconciliation_jobs::Entity::find()
            .filter(reconciliation_jobs::Column::JobId.eq(job_id))
            .one(&self.db)
            .await
            .map_err(store_error)?
            .map(job_from_model)
            .transpose()
    }

    async fn insert_discrepancy(&self, discrepancy: &Discrepancy) -> Result<(), StoreError> {
        discrepancy_active_model(discrepancy)
            .insert(&self.db)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn update_discrepancy(&self, discrepancy: &Discrepancy) -> Result<(), StoreError> {
        discrepancy_active_model(discrepancy)
            .update(&self.db)
            .await
            .map_err(|e| missing_row(e, "Discrepancy", discrepancy.id))?;
        Ok(())
    }

    async fn find_discrepancy(&self, id: DiscrepancyId) -> Result<Option<Discrepancy>, StoreError> {
        reconciliation_discrepancies::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_error)?
            .map(discrepancy_from_model)
            .transpose()
    }

    async fn discrepancies_for_job(&self, job_id: &str) -> Result<Vec<Discrepancy>, StoreError> {
        reconciliation_discrepancies::Entity::find()
            .filter(reconciliation_discrepancies::Column::JobId.eq(job_id))
            .order_by_asc(reconciliation_discrepancies::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(discrepancy_from_model)
            .collect()
    }

    async fn unresolved_discrepancies(&self) -> Result<Vec<Discrepancy>, StoreError> {
        let mut discrepancies = reconciliation_discrepancies::Entity::find()
            .filter(reconciliation_discrepancies::Column::Resolved.eq(false))
            .order_by_asc(reconciliation_discrepancies::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(discrepancy_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        // Severity is stored as text, so order in Rust rather than by column.
        discrepancies.sort_by(|a, b| b.severity.cmp(&a.severity));
        Ok(discrepancies)
    }
}

fn missing_row(err: DbErr, entity: &'static str, id: impl ToString) -> StoreError {
    match err {
        DbErr::RecordNotUpdated => StoreError::not_found(entity, id),
        other => store_error(other),
    }
}

fn job_active_model(job: &ReconciliationJob) -> reconciliation_jobs::ActiveModel {
    reconciliation_jobs::ActiveModel {
        id: Set(job.id.into_inner()),
        job_id: Set(job.job_id.clone()),
        provider: Set(job.provider.as_str().to_string()),
        trigger_type: Set(job.trigger.as_str().to_string()),
        start_date: Set(job.start_date),
        end_date: Set(job.end_date),
        status: Set(job.status.as_str().to_string()),
        provider_transaction_count: Set(to_i64(job.provider_transaction_count)),
        internal_transaction_count: Set(to_i64(job.internal_transaction_count)),
        matched_count: Set(to_i64(job.matched_count)),
        discrepancy_count: Set(to_i64(job.discrepancy_count)),
        provider_total: Set(job.provider_total),
        internal_total: Set(job.internal_total),
        total_difference: Set(job.total_difference),
        error_message: Set(job.error_message.clone()),
        started_at: Set(to_db_opt(job.started_at)),
        completed_at: Set(to_db_opt(job.completed_at)),
        created_at: Set(to_db(job.created_at)),
    }
}

fn job_from_model(row: reconciliation_jobs::Model) -> Result<ReconciliationJob, StoreError> {
    Ok(ReconciliationJob {
        id: ReconciliationJobId::from_uuid(row.id),
        provider: parse_column("provider", &row.provider, PaymentProvider::parse)?,
        trigger: parse_column("trigger_type", &row.trigger_type, ReconciliationTrigger::parse)?,
        status: parse_column("status", &row.status, ReconciliationStatus::parse)?,
        job_id: row.job_id,
        start_date: row.start_date,
        end_date: row.end_date,
        provider_transaction_count: to_u64(row.provider_transaction_count),
        internal_transaction_count: to_u64(row.internal_transaction_count),
        matched_count: to_u64(row.matched_count),
        discrepancy_count: to_u64(row.discrepancy_count),
        provider_total: row.provider_total,
        internal_total: row.internal_total,
        total_difference: row.total_difference,
        error_message: row.error_message,
        started_at: to_utc_opt(row.started_at),
        completed_at: to_utc_opt(row.completed_at),
        created_at: to_utc(row.created_at),
    })
}

fn discrepancy_active_model(d: &Discrepancy) -> reconciliation_discrepancies::ActiveModel {
    reconciliation_discrepancies::ActiveModel {
        id: Set(d.id.into_inner()),
        job_id: Set(d.job_id.clone()),
        discrepancy_type: Set(d.discrepancy_type.as_str().to_string()),
        severity: Set(d.severity.as_str().to_string()),
        transaction_id: Set(d.transaction_id.clone()),
        provider_transaction_id: Set(d.provider_transaction_id.clone()),
        internal_transaction_id: Set(d.internal_transaction_id.clone()),
        provider_amount: Set(d.provider_amount),
        internal_amount: Set(d.internal_amount),
        amount_difference: Set(d.amount_difference),
        provider_status: Set(d.provider_status.clone()),
        internal_status: Set(d.internal_status.clone()),
        provider_date: Set(d.provider_date),
        internal_date: Set(d.internal_date),
        provider_payload: Set(d.provider_payload.clone()),
        internal_payload: Set(d.internal_payload.clone()),
        description: Set(d.description.clone()),
        resolved: Set(d.resolved),
        resolved_by: Set(d.resolved_by.clone()),
        resolution_notes: Set(d.resolution_notes.clone()),
        resolved_at: Set(to_db_opt(d.resolved_at)),
        ticket_id: Set(d.ticket_id.clone()),
        created_at: Set(to_db(d.created_at)),
    }
}

fn discrepancy_from_model(
    row: reconciliation_discrepancies::Model,
) -> Result<Discrepancy, StoreError> {
    Ok(Discrepancy {
        id: DiscrepancyId::from_uuid(row.id),
        discrepancy_type: parse_column(
            "discrepancy_type",
            &row.discrepancy_type,
            DiscrepancyType::parse,
        )?,
        severity: parse_column("severity", &row.severity, DiscrepancySeverity::parse)?,
        job_id: row.job_id,
        transaction_id: row.transaction_id,
        provider_transaction_id: row.provider_transaction_id,
        internal_transaction_id: row.internal_transaction_id,
        provider_amount: row.provider_amount,
        internal_amount: row.internal_amount,
        amount_difference: row.amount_difference,
        provider_status: row.provider_status,
        internal_status: row.internal_status,
        provider_date: row.provider_date,
        internal_date: row.internal_date,
        provider_payload: row.provider_payload,
        internal_payload: row.internal_payload,
        description: row.description,
        resolved: row.resolved,
        resolved_by: row.resolved_by,
        resolution_notes: row.resolution_notes,
        resolved_at: to_utc_opt(row.resolved_at),
        ticket_id: row.ticket_id,
        created_at: to_utc(row.created_at),
    })
}
