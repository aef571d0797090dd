//! In-memory collaborators that record every call.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use ledgerkeep_shared::types::{DiscrepancyId, LedgerEntryId, PostingId};
use rust_decimal::Decimal;

use crate::dispute::{Dispute, DisputeRepository};
use crate::ledger::{
    AccountType, EntryType, InMemoryLedgerStore, LedgerEntry, LedgerEntryDraft, LedgerError,
    LedgerSnapshot, LedgerStore, MaintainedBalance, PostingReceipt,
};
use crate::notify::{
    DisputeAlert, LedgerVerificationAlert, NewTicket, NotificationSink, NotifyError,
    ReconciliationAlert, TicketId, TicketSink,
};
use crate::payment::{
    GatewayError, PaymentGateway, PaymentProvider, ProviderTransaction, Transaction,
    TransactionStore,
};
use crate::persistence::StoreError;
use crate::reconciliation::{
    Discrepancy, ReconciliationJob, ReconciliationRepository, ReconciliationStatus,
};

#[derive(Default)]
pub struct FakeGateway {
    feeds: Mutex<HashMap<PaymentProvider, Vec<ProviderTransaction>>>,
    failing: Mutex<HashMap<PaymentProvider, String>>,
    pub calls: Mutex<Vec<(PaymentProvider, NaiveDate, NaiveDate)>>,
}

impl FakeGateway {
    pub fn with_feed(self, provider: PaymentProvider, lines: Vec<ProviderTransaction>) -> Self {
        self.feeds.lock().unwrap().insert(provider, lines);
        self
    }

    pub fn failing(self, provider: PaymentProvider, message: &str) -> Self {
        self.failing.lock().unwrap().insert(provider, message.to_string());
        self
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn fetch_transactions_by_date_range(
        &self,
        provider: PaymentProvider,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ProviderTransaction>, GatewayError> {
        self.calls.lock().unwrap().push((provider, start, end));
        if let Some(message) = self.failing.lock().unwrap().get(&provider) {
            return Err(GatewayError::Request {
                provider,
                message: message.clone(),
            });
        }
        Ok(self
            .feeds
            .lock()
            .unwrap()
            .get(&provider)
            .cloned()
            .unwrap_or_default())
    }
}

/// Fails the next `n` writes with a storage error, then behaves like the
/// wrapped in-memory store.
#[derive(Default)]
pub struct FlakyLedger {
    pub inner: InMemoryLedgerStore,
    failures: AtomicU32,
}

impl FlakyLedger {
    pub fn failing_writes(n: u32) -> Self {
        let ledger = Self::default();
        ledger.failures.store(n, Ordering::SeqCst);
        ledger
    }

    fn write_allowed(&self) -> Result<(), LedgerError> {
        let failed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match failed {
            Ok(_) => Err(LedgerError::Storage("connection reset".into())),
            Err(_) => Ok(()),
        }
    }
}

#[async_trait]
impl LedgerStore for FlakyLedger {
    async fn post(&self, drafts: Vec<LedgerEntryDraft>) -> Result<PostingReceipt, LedgerError> {
        self.write_allowed()?;
        self.inner.post(drafts).await
    }

    async fn post_once(
        &self,
        key: &str,
        drafts: Vec<LedgerEntryDraft>,
    ) -> Result<PostingReceipt, LedgerError> {
        self.write_allowed()?;
        self.inner.post_once(key, drafts).await
    }

    async fn balance_of(&self, account_type: AccountType) -> Result<Decimal, LedgerError> {
        self.inner.balance_of(account_type).await
    }

    async fn entries_for_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.inner.entries_for_transaction(transaction_id).await
    }

    async fn entries_for_posting(
        &self,
        posting_id: PostingId,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.inner.entries_for_posting(posting_id).await
    }

    async fn all_entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.inner.all_entries().await
    }

    async fn maintained_balances(&self) -> Result<Vec<MaintainedBalance>, LedgerError> {
        self.inner.maintained_balances().await
    }

    async fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        self.inner.snapshot().await
    }

    async fn mark_verified(
        &self,
        ids: &[LedgerEntryId],
        verifier: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, LedgerError> {
        self.inner.mark_verified(ids, verifier, at).await
    }
}

/// Ledger where another writer lands a balanced posting before every
/// individual read. Only `snapshot` sees one consistent state.
#[derive(Default)]
pub struct BusyLedger {
    pub inner: InMemoryLedgerStore,
}

impl BusyLedger {
    async fn concurrent_write(&self) -> Result<(), LedgerError> {
        let day = Utc::now().date_naive();
        self.inner
            .post(vec![
                LedgerEntryDraft::new(AccountType::Cash, EntryType::Debit, Decimal::ONE, "USD", "sale", day),
                LedgerEntryDraft::new(
                    AccountType::VendorPayable,
                    EntryType::Credit,
                    Decimal::ONE,
                    "USD",
                    "sale",
                    day,
                ),
            ])
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl LedgerStore for BusyLedger {
    async fn post(&self, drafts: Vec<LedgerEntryDraft>) -> Result<PostingReceipt, LedgerError> {
        self.inner.post(drafts).await
    }

    async fn post_once(
        &self,
        key: &str,
        drafts: Vec<LedgerEntryDraft>,
    ) -> Result<PostingReceipt, LedgerError> {
        self.inner.post_once(key, drafts).await
    }

    async fn balance_of(&self, account_type: AccountType) -> Result<Decimal, LedgerError> {
        self.concurrent_write().await?;
        self.inner.balance_of(account_type).await
    }

    async fn entries_for_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.inner.entries_for_transaction(transaction_id).await
    }

    async fn entries_for_posting(
        &self,
        posting_id: PostingId,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.inner.entries_for_posting(posting_id).await
    }

    async fn all_entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.concurrent_write().await?;
        self.inner.all_entries().await
    }

    async fn maintained_balances(&self) -> Result<Vec<MaintainedBalance>, LedgerError> {
        self.concurrent_write().await?;
        self.inner.maintained_balances().await
    }

    async fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        self.inner.snapshot().await
    }

    async fn mark_verified(
        &self,
        ids: &[LedgerEntryId],
        verifier: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, LedgerError> {
        self.inner.mark_verified(ids, verifier, at).await
    }
}

#[derive(Default)]
pub struct InMemoryTransactionStore {
    rows: Mutex<Vec<Transaction>>,
}

impl InMemoryTransactionStore {
    pub fn with(self, txn: Transaction) -> Self {
        self.rows.lock().unwrap().push(txn);
        self
    }

    pub fn get(&self, transaction_id: &str) -> Option<Transaction> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.transaction_id == transaction_id)
            .cloned()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Transaction>, StoreError> {
        Ok(self.get(transaction_id))
    }

    async fn find_by_provider_and_date_range(
        &self,
        provider: PaymentProvider,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.provider == provider && t.created_at >= start && t.created_at < end)
            .cloned()
            .collect())
    }

    async fn mark_reconciled(
        &self,
        transaction_ids: &[String],
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut count = 0;
        for txn in self.rows.lock().unwrap().iter_mut() {
            if transaction_ids.contains(&txn.transaction_id) && !txn.reconciled {
                txn.mark_reconciled(at);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn mark_disputed(&self, transaction_id: &str, dispute_id: &str) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let txn = rows
            .iter_mut()
            .find(|t| t.transaction_id == transaction_id)
            .ok_or_else(|| StoreError::not_found("Transaction", transaction_id))?;
        txn.mark_disputed(dispute_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryReconciliationRepository {
    pub jobs: Mutex<Vec<ReconciliationJob>>,
    pub discrepancies: Mutex<Vec<Discrepancy>>,
}

#[async_trait]
impl ReconciliationRepository for InMemoryReconciliationRepository {
    async fn insert_job(&self, job: &ReconciliationJob) -> Result<(), StoreError> {
        self.jobs.lock().unwrap().push(job.clone());
        Ok(())
    }

    async fn update_job(&self, job: &ReconciliationJob) -> Result<(), StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        let slot = jobs
            .iter_mut()
            .find(|j| j.id == job.id)
            .ok_or_else(|| StoreError::not_found("ReconciliationJob", &job.job_id))?;
        *slot = job.clone();
        Ok(())
    }

    async fn finish_job(&self, job: &ReconciliationJob) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        let slot = jobs
            .iter_mut()
            .find(|j| j.id == job.id)
            .ok_or_else(|| StoreError::not_found("ReconciliationJob", &job.job_id))?;
        if slot.status == ReconciliationStatus::Cancelled {
            return Ok(false);
        }
        *slot = job.clone();
        Ok(true)
    }

    async fn find_job(&self, job_id: &str) -> Result<Option<ReconciliationJob>, StoreError> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .find(|j| j.job_id == job_id)
            .cloned())
    }

    async fn insert_discrepancy(&self, discrepancy: &Discrepancy) -> Result<(), StoreError> {
        self.discrepancies.lock().unwrap().push(discrepancy.clone());
        Ok(())
    }

    async fn update_discrepancy(&self, discrepancy: &Discrepancy) -> Result<(), StoreError> {
        let mut rows = self.discrepancies.lock().unwrap();
        let slot = rows
            .iter_mut()
            .find(|d| d.id == discrepancy.id)
            .ok_or_else(|| StoreError::not_found("Discrepancy", discrepancy.id))?;
        *slot = discrepancy.clone();
        Ok(())
    }

    async fn find_discrepancy(&self, id: DiscrepancyId) -> Result<Option<Discrepancy>, StoreError> {
        Ok(self
            .discrepancies
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .cloned())
    }

    async fn discrepancies_for_job(&self, job_id: &str) -> Result<Vec<Discrepancy>, StoreError> {
        Ok(self
            .discrepancies
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn unresolved_discrepancies(&self) -> Result<Vec<Discrepancy>, StoreError> {
        let mut rows: Vec<Discrepancy> = self
            .discrepancies
            .lock()
            .unwrap()
            .iter()
            .filter(|d| !d.resolved)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.severity.cmp(&a.severity));
        Ok(rows)
    }
}

#[derive(Default)]
pub struct InMemoryDisputeRepository {
    pub rows: Mutex<Vec<Dispute>>,
}

impl InMemoryDisputeRepository {
    pub fn get(&self, provider_dispute_id: &str) -> Option<Dispute> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.provider_dispute_id == provider_dispute_id)
            .cloned()
    }
}

#[async_trait]
impl DisputeRepository for InMemoryDisputeRepository {
    async fn find_by_provider_dispute_id(
        &self,
        provider: PaymentProvider,
        provider_dispute_id: &str,
    ) -> Result<Option<Dispute>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.provider == provider && d.provider_dispute_id == provider_dispute_id)
            .cloned())
    }

    async fn insert(&self, dispute: &Dispute) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|d| d.provider == dispute.provider && d.provider_dispute_id == dispute.provider_dispute_id)
        {
            return Err(StoreError::Conflict(dispute.provider_dispute_id.clone()));
        }
        rows.push(dispute.clone());
        Ok(())
    }

    async fn update(&self, dispute: &Dispute) -> Result<Dispute, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let slot = rows
            .iter_mut()
            .find(|d| d.id == dispute.id)
            .ok_or_else(|| StoreError::not_found("Dispute", dispute.id))?;
        if slot.version != dispute.version {
            return Err(StoreError::Conflict(format!(
                "dispute {} is at version {}, not {}",
                dispute.provider_dispute_id, slot.version, dispute.version
            )));
        }
        *slot = Dispute {
            version: dispute.version + 1,
            ..dispute.clone()
        };
        Ok(slot.clone())
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Dispute>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.is_overdue(now))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub disputes: Mutex<Vec<DisputeAlert>>,
    pub reconciliations: Mutex<Vec<ReconciliationAlert>>,
    pub verifications: Mutex<Vec<LedgerVerificationAlert>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }

    fn outcome(&self) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(NotifyError::Unavailable("smtp down".into()))
        } else {
            Ok(())
        }
    }

    pub fn verification_titles(&self) -> Vec<String> {
        self.verifications
            .lock()
            .unwrap()
            .iter()
            .map(|a| a.title.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn send_dispute_alert(&self, alert: &DisputeAlert) -> Result<(), NotifyError> {
        self.disputes.lock().unwrap().push(alert.clone());
        self.outcome()
    }

    async fn send_reconciliation_alert(&self, alert: &ReconciliationAlert) -> Result<(), NotifyError> {
        self.reconciliations.lock().unwrap().push(alert.clone());
        self.outcome()
    }

    async fn send_ledger_verification_alert(
        &self,
        alert: &LedgerVerificationAlert,
    ) -> Result<(), NotifyError> {
        self.verifications.lock().unwrap().push(alert.clone());
        self.outcome()
    }
}

#[derive(Default)]
pub struct RecordingTicketSink {
    pub tickets: Mutex<Vec<NewTicket>>,
    next: AtomicU64,
}

impl RecordingTicketSink {
    pub fn subjects(&self) -> Vec<String> {
        self.tickets
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.subject.clone())
            .collect()
    }
}

#[async_trait]
impl TicketSink for RecordingTicketSink {
    async fn create_ticket(&self, ticket: NewTicket) -> Result<TicketId, NotifyError> {
        self.tickets.lock().unwrap().push(ticket);
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TicketId(format!("TKT-{n}")))
    }
}
