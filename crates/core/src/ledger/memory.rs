//! In-process ledger store.
//!
//! Postings are validated first and then appended under a single write
//! lock, so balance readers never see a partial posting.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ledgerkeep_shared::types::{LedgerEntryId, PostingId};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::debug;

use super::account::AccountType;
use super::balance::{BalanceKey, BalanceSnapshot, MaintainedBalance, RunningBalance};
use super::entry::{LedgerEntry, LedgerEntryDraft};
use super::error::LedgerError;
use super::store::{LedgerSnapshot, LedgerStore, PostingReceipt};
use super::validation::validate_posting;

#[derive(Debug, Default)]
struct Inner {
    entries: Vec<LedgerEntry>,
    running: HashMap<BalanceKey, RunningBalance>,
    posting_keys: HashMap<String, PostingId>,
}

impl Inner {
    fn write(&mut self, drafts: Vec<LedgerEntryDraft>) -> PostingReceipt {
        let posting_id = PostingId::new();
        let now = Utc::now();
        let entries = drafts
            .into_iter()
            .map(|draft| self.append(posting_id, draft, now))
            .collect();
        PostingReceipt {
            posting_id,
            entries,
            replayed: false,
        }
    }

    fn posting(&self, posting_id: PostingId) -> Vec<LedgerEntry> {
        self.entries
            .iter()
            .filter(|e| e.posting_id == posting_id)
            .cloned()
            .collect()
    }

    fn balance_of(&self, account_type: AccountType) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.account_type == account_type)
            .map(LedgerEntry::signed_amount)
            .sum()
    }

    fn maintained(&self) -> Vec<MaintainedBalance> {
        let mut balances: Vec<MaintainedBalance> = self
            .running
            .iter()
            .map(|((account_type, currency), balance)| MaintainedBalance {
                account_type: *account_type,
                currency: currency.clone(),
                balance: *balance,
            })
            .collect();
        balances.sort_by(|a, b| {
            (a.account_type, &a.currency).cmp(&(b.account_type, &b.currency))
        });
        balances
    }

    fn append(&mut self, posting_id: PostingId, draft: LedgerEntryDraft, now: DateTime<Utc>) -> LedgerEntry {
        let currency = draft.currency.to_uppercase();
        let key = (draft.account_type, currency.clone());
        let change = draft.account_type.balance_change(draft.entry_type, draft.amount);
        let running = RunningBalance::advance(self.running.get(&key), change);
        self.running.insert(key, running);

        let entry = LedgerEntry {
            id: LedgerEntryId::new(),
            posting_id,
            transaction_id: draft.transaction_id,
            order_id: draft.order_id,
            account_type: draft.account_type,
            entry_type: draft.entry_type,
            amount: draft.amount,
            currency,
            description: draft.description,
            reference: draft.reference,
            metadata: draft.metadata,
            verified: false,
            verified_by: None,
            verified_at: None,
            effective_date: draft.effective_date,
            account_version: running.account_version,
            previous_balance: running.previous_balance,
            current_balance: running.current_balance,
            created_at: now,
            updated_at: now,
        };
        self.entries.push(entry.clone());
        entry
    }
}

/// Ledger store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    inner: RwLock<Inner>,
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Returns true if nothing has been posted.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    /// Appends entries without validation, as a corrupted import would.
    #[cfg(test)]
    pub(crate) async fn insert_unchecked(&self, drafts: Vec<LedgerEntryDraft>) -> PostingId {
        let posting_id = PostingId::new();
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        for draft in drafts {
            inner.append(posting_id, draft, now);
        }
        posting_id
    }

    /// Overwrites a maintained running balance.
    #[cfg(test)]
    pub(crate) async fn set_running_balance(&self, key: BalanceKey, balance: Decimal) {
        let mut inner = self.inner.write().await;
        let entry = inner
            .running
            .entry(key)
            .or_insert_with(|| RunningBalance::first_entry(Decimal::ZERO));
        entry.current_balance = balance;
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn post(&self, drafts: Vec<LedgerEntryDraft>) -> Result<PostingReceipt, LedgerError> {
        validate_posting(&drafts)?;

        let receipt = self.inner.write().await.write(drafts);
        debug!(posting_id = %receipt.posting_id, entries = receipt.entries.len(), "Posting written");
        Ok(receipt)
    }

    async fn post_once(
        &self,
        key: &str,
        drafts: Vec<LedgerEntryDraft>,
    ) -> Result<PostingReceipt, LedgerError> {
        validate_posting(&drafts)?;

        let mut inner = self.inner.write().await;
        if let Some(&posting_id) = inner.posting_keys.get(key) {
            debug!(key, %posting_id, "Posting key already used");
            return Ok(PostingReceipt {
                posting_id,
                entries: inner.posting(posting_id),
                replayed: true,
            });
        }
        let receipt = inner.write(drafts);
        inner.posting_keys.insert(key.to_string(), receipt.posting_id);
        debug!(key, posting_id = %receipt.posting_id, "Posting written");
        Ok(receipt)
    }

    async fn balance_of(&self, account_type: AccountType) -> Result<Decimal, LedgerError> {
        Ok(self.inner.read().await.balance_of(account_type))
    }

    async fn entries_for_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let inner = self.inner.read().await;
        Ok(inner
            .entries
            .iter()
            .filter(|e| e.transaction_id.as_deref() == Some(transaction_id))
            .cloned()
            .collect())
    }

    async fn entries_for_posting(
        &self,
        posting_id: PostingId,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        Ok(self.inner.read().await.posting(posting_id))
    }

    async fn all_entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        Ok(self.inner.read().await.entries.clone())
    }

    async fn maintained_balances(&self) -> Result<Vec<MaintainedBalance>, LedgerError> {
        Ok(self.inner.read().await.maintained())
    }

    async fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        let inner = self.inner.read().await;
        let reported: BalanceSnapshot = AccountType::ALL
            .into_iter()
            .map(|account| (account, inner.balance_of(account)))
            .collect();
        Ok(LedgerSnapshot {
            entries: inner.entries.clone(),
            reported,
            maintained: inner.maintained(),
        })
    }

    async fn mark_verified(
        &self,
        ids: &[LedgerEntryId],
        verifier: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, LedgerError> {
        let mut inner = self.inner.write().await;
        let mut count = 0;
        for entry in inner.entries.iter_mut().filter(|e| ids.contains(&e.id)) {
            if !entry.verified {
                entry.mark_verified(verifier, at);
                count += 1;
            }
        }
        Ok(count)
    }
}
