//! Reconciliation job orchestration.

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use futures::future::join_all;
use ledgerkeep_shared::types::DiscrepancyId;
use tracing::{error, info, instrument, warn};

use super::error::ReconciliationError;
use super::matcher::compare_feeds;
use super::repository::ReconciliationRepository;
use super::types::{Discrepancy, ReconciliationJob, ReconciliationTrigger};
use crate::notify::{
    NewTicket, NotificationSink, ReconciliationAlert, TicketCategory, TicketPriority, TicketSink,
};
use crate::payment::{PaymentGateway, PaymentProvider, TransactionStore};

/// Compares provider feeds with internal transactions and records the
/// differences.
pub struct ReconciliationEngine {
    gateway: Arc<dyn PaymentGateway>,
    transactions: Arc<dyn TransactionStore>,
    repository: Arc<dyn ReconciliationRepository>,
    notifier: Arc<dyn NotificationSink>,
    tickets: Arc<dyn TicketSink>,
}

impl ReconciliationEngine {
    /// Creates an engine over its collaborators.
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        transactions: Arc<dyn TransactionStore>,
        repository: Arc<dyn ReconciliationRepository>,
        notifier: Arc<dyn NotificationSink>,
        tickets: Arc<dyn TicketSink>,
    ) -> Self {
        Self {
            gateway,
            transactions,
            repository,
            notifier,
            tickets,
        }
    }

    /// Runs one job per provider for `date`, concurrently.
    ///
    /// Never fails: a provider whose job cannot even be recorded is logged
    /// and left out of the result.
    #[instrument(skip(self))]
    pub async fn run_daily_reconciliation(&self, date: NaiveDate) -> Vec<ReconciliationJob> {
        let runs = PaymentProvider::ALL
            .into_iter()
            .map(|provider| self.run_job(provider, ReconciliationTrigger::Daily, date, date));

        join_all(runs)
            .await
            .into_iter()
            .zip(PaymentProvider::ALL)
            .filter_map(|(result, provider)| match result {
                Ok(job) => Some(job),
                Err(e) => {
                    error!(%provider, error = %e, "Could not record reconciliation job");
                    None
                }
            })
            .collect()
    }

    /// Runs a `MANUAL-` job for one provider and an inclusive date range.
    #[instrument(skip(self))]
    pub async fn run_manual_reconciliation(
        &self,
        provider: PaymentProvider,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ReconciliationJob, ReconciliationError> {
        if start > end {
            return Err(ReconciliationError::InvalidDateRange { start, end });
        }
        self.run_job(provider, ReconciliationTrigger::Manual, start, end)
            .await
    }

    /// Creates, runs and finalizes one job.
    ///
    /// Fetch and store failures after the job is recorded end in FAILED
    /// rather than an error. A job cancelled while it ran stays CANCELLED.
    /// A summary alert is sent in every case.
    async fn run_job(
        &self,
        provider: PaymentProvider,
        trigger: ReconciliationTrigger,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ReconciliationJob, ReconciliationError> {
        let mut job = ReconciliationJob::new(provider, trigger, start, end, Utc::now());
        self.repository.insert_job(&job).await?;

        job.start(Utc::now())?;
        self.repository.update_job(&job).await?;
        info!(job_id = %job.job_id, %provider, %start, %end, "Reconciliation started");

        match self.reconcile_provider(&mut job).await {
            Ok(found) => {
                job.complete(Utc::now())?;
                info!(
                    job_id = %job.job_id,
                    discrepancies = found,
                    matched = job.matched_count,
                    "Reconciliation completed"
                );
            }
            Err(e) => {
                error!(job_id = %job.job_id, error = %e, "Reconciliation failed");
                job.fail(e.to_string(), Utc::now())?;
            }
        }

        match self.repository.finish_job(&job).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(job_id = %job.job_id, "Reconciliation job was cancelled while running");
                match self.repository.find_job(&job.job_id).await {
                    Ok(Some(stored)) => job = stored,
                    Ok(None) => {}
                    Err(e) => error!(job_id = %job.job_id, error = %e, "Could not reload cancelled job"),
                }
            }
            Err(e) => error!(job_id = %job.job_id, error = %e, "Could not save final job state"),
        }

        if let Err(e) = self
            .notifier
            .send_reconciliation_alert(&ReconciliationAlert::new(&job))
            .await
        {
            warn!(job_id = %job.job_id, error = %e, "Reconciliation summary not delivered");
        }

        Ok(job)
    }

    /// Reconciles the job's provider and range, updating its counters.
    ///
    /// Returns the number of discrepancies recorded.
    pub async fn reconcile_provider(
        &self,
        job: &mut ReconciliationJob,
    ) -> Result<u64, ReconciliationError> {
        let provider = job.provider;
        let provider_txns = if job.start_date == job.end_date {
            self.gateway
                .fetch_transactions_by_date(provider, job.start_date)
                .await?
        } else {
            self.gateway
                .fetch_transactions_by_date_range(provider, job.start_date, job.end_date)
                .await?
        };

        let (window_start, window_end) = utc_window(job.start_date, job.end_date);
        let internal_txns = self
            .transactions
            .find_by_provider_and_date_range(provider, window_start, window_end)
            .await?;

        let outcome = compare_feeds(&job.job_id, provider, &provider_txns, &internal_txns, Utc::now());

        for discrepancy in &outcome.discrepancies {
            self.record_discrepancy(job, discrepancy.clone()).await?;
        }

        if !outcome.clean_matches.is_empty() {
            self.transactions
                .mark_reconciled(&outcome.clean_matches, Utc::now())
                .await?;
        }

        let found = outcome.discrepancies.len() as u64;
        job.provider_transaction_count = provider_txns.len() as u64;
        job.internal_transaction_count = internal_txns.len() as u64;
        job.matched_count = job
            .internal_transaction_count
            .saturating_sub(outcome.missing_provider_count() as u64);
        job.discrepancy_count = found;
        job.provider_total = outcome.provider_total;
        job.internal_total = outcome.internal_total;
        job.total_difference = outcome.provider_total - outcome.internal_total;

        Ok(found)
    }

    async fn record_discrepancy(
        &self,
        job: &ReconciliationJob,
        mut discrepancy: Discrepancy,
    ) -> Result<(), ReconciliationError> {
        if discrepancy.severity.requires_ticket() {
            let ticket = NewTicket {
                subject: format!(
                    "[{}] {} {} for {}",
                    discrepancy.severity,
                    job.provider,
                    discrepancy.discrepancy_type,
                    discrepancy.transaction_id
                ),
                description: format!(
                    "Job: {}\nProvider: {}\nSeverity: {}\n{}",
                    job.job_id, job.provider, discrepancy.severity, discrepancy.description
                ),
                priority: TicketPriority::from_severity(discrepancy.severity),
                category: TicketCategory::Reconciliation,
            };
            match self.tickets.create_ticket(ticket).await {
                Ok(id) => discrepancy.ticket_id = Some(id.0),
                Err(e) => warn!(
                    job_id = %job.job_id,
                    transaction_id = %discrepancy.transaction_id,
                    error = %e,
                    "Could not open discrepancy ticket"
                ),
            }
        }

        self.repository.insert_discrepancy(&discrepancy).await?;
        Ok(())
    }

    /// Cancels a job that has not finished.
    pub async fn cancel_job(&self, job_id: &str) -> Result<ReconciliationJob, ReconciliationError> {
        let mut job = self
            .repository
            .find_job(job_id)
            .await?
            .ok_or_else(|| ReconciliationError::JobNotFound(job_id.to_string()))?;
        job.cancel(Utc::now())?;
        self.repository.update_job(&job).await?;
        info!(job_id, "Reconciliation job cancelled");
        Ok(job)
    }

    /// Marks a discrepancy resolved.
    pub async fn resolve_discrepancy(
        &self,
        id: DiscrepancyId,
        resolver: &str,
        notes: Option<String>,
    ) -> Result<Discrepancy, ReconciliationError> {
        let mut discrepancy = self
            .repository
            .find_discrepancy(id)
            .await?
            .ok_or(ReconciliationError::DiscrepancyNotFound(id))?;
        discrepancy.resolve(resolver, notes, Utc::now())?;
        self.repository.update_discrepancy(&discrepancy).await?;
        info!(%id, resolver, "Discrepancy resolved");
        Ok(discrepancy)
    }

    /// Every unresolved discrepancy, most severe first.
    pub async fn unresolved_discrepancies(&self) -> Result<Vec<Discrepancy>, ReconciliationError> {
        Ok(self.repository.unresolved_discrepancies().await?)
    }

    /// Discrepancies recorded by one job.
    pub async fn discrepancies_for_job(
        &self,
        job_id: &str,
    ) -> Result<Vec<Discrepancy>, ReconciliationError> {
        Ok(self.repository.discrepancies_for_job(job_id).await?)
    }
}

/// `[start 00:00 UTC, end + 1 day 00:00 UTC)`.
#[must_use]
pub fn utc_window(start: NaiveDate, end: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let next = end.checked_add_days(Days::new(1)).unwrap_or(end);
    (
        start.and_time(chrono::NaiveTime::MIN).and_utc(),
        next.and_time(chrono::NaiveTime::MIN).and_utc(),
    )
}
