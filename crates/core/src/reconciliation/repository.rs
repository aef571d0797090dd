//! Persistence contract for jobs and discrepancies.

use async_trait::async_trait;
use ledgerkeep_shared::types::DiscrepancyId;

use super::types::{Discrepancy, ReconciliationJob};
use crate::persistence::StoreError;

/// Store of reconciliation jobs and their discrepancies.
///
/// Deleting a job deletes its discrepancies.
#[async_trait]
pub trait ReconciliationRepository: Send + Sync {
    /// Inserts a new job.
    async fn insert_job(&self, job: &ReconciliationJob) -> Result<(), StoreError>;

    /// Overwrites a job's status, counters and timestamps.
    async fn update_job(&self, job: &ReconciliationJob) -> Result<(), StoreError>;

    /// Saves a finished run unless the stored job was cancelled meanwhile.
    ///
    /// Returns false, having written nothing, when it was cancelled.
    async fn finish_job(&self, job: &ReconciliationJob) -> Result<bool, StoreError>;

    /// Looks up a job by its human-readable ID.
    async fn find_job(&self, job_id: &str) -> Result<Option<ReconciliationJob>, StoreError>;

    /// Inserts a discrepancy under its job.
    async fn insert_discrepancy(&self, discrepancy: &Discrepancy) -> Result<(), StoreError>;

    /// Overwrites a discrepancy's resolution and ticket fields.
    async fn update_discrepancy(&self, discrepancy: &Discrepancy) -> Result<(), StoreError>;

    /// Looks up a discrepancy.
    async fn find_discrepancy(&self, id: DiscrepancyId) -> Result<Option<Discrepancy>, StoreError>;

    /// Discrepancies of one job, oldest first.
    async fn discrepancies_for_job(&self, job_id: &str) -> Result<Vec<Discrepancy>, StoreError>;

    /// Every unresolved discrepancy, most severe first.
    async fn unresolved_discrepancies(&self) -> Result<Vec<Discrepancy>, StoreError>;
}
