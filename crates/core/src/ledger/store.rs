//! Ledger store contract.
//!
//! The ledger store is the single shared mutable resource of the core.
//! Implementations must make [`LedgerStore::post`] atomic with respect to
//! concurrent readers: a reader never observes half of a posting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ledgerkeep_shared::types::{LedgerEntryId, PostingId};
use rust_decimal::Decimal;

use super::account::AccountType;
use super::balance::{BalanceSnapshot, MaintainedBalance};
use super::entry::{LedgerEntry, LedgerEntryDraft};
use super::error::LedgerError;

/// Result of a successful posting.
#[derive(Debug, Clone)]
pub struct PostingReceipt {
    /// Correlation key shared by the written entries.
    pub posting_id: PostingId,
    /// The written entries, in draft order.
    pub entries: Vec<LedgerEntry>,
    /// The posting key was already used; nothing new was written and
    /// `entries` are the ones stored the first time.
    pub replayed: bool,
}

/// Everything the nightly verification reads, taken from one consistent
/// view of the ledger.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    /// Every entry, oldest first.
    pub entries: Vec<LedgerEntry>,
    /// Store-reported signed balance of every account type.
    pub reported: BalanceSnapshot,
    /// Latest running balance of every (account, currency) pair.
    pub maintained: Vec<MaintainedBalance>,
}

/// Append-only store of double-entry postings.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Atomically writes a balanced set of drafts under one new posting ID.
    ///
    /// Implementations validate with
    /// [`validate_posting`](super::validation::validate_posting) before
    /// writing anything.
    async fn post(&self, drafts: Vec<LedgerEntryDraft>) -> Result<PostingReceipt, LedgerError>;

    /// Like [`post`](Self::post), but writes at most one posting per `key`.
    ///
    /// A repeated key writes nothing, whatever the drafts, and returns the
    /// entries stored under it with `replayed` set. The key and the entries
    /// commit together.
    async fn post_once(
        &self,
        key: &str,
        drafts: Vec<LedgerEntryDraft>,
    ) -> Result<PostingReceipt, LedgerError>;

    /// Sum of signed amounts of every entry of an account type.
    async fn balance_of(&self, account_type: AccountType) -> Result<Decimal, LedgerError>;

    /// Entries linked to a shared payment transaction ID.
    async fn entries_for_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Entries of one posting.
    async fn entries_for_posting(
        &self,
        posting_id: PostingId,
    ) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Every entry, oldest first.
    async fn all_entries(&self) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Latest running balance of every (account, currency) pair.
    async fn maintained_balances(&self) -> Result<Vec<MaintainedBalance>, LedgerError>;

    /// Entries, reported balances and running balances as of one instant.
    /// No posting is half-visible and none lands between the reads.
    async fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError>;

    /// Stamps entries as verified. Returns how many were newly verified.
    async fn mark_verified(
        &self,
        ids: &[LedgerEntryId],
        verifier: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, LedgerError>;
}
