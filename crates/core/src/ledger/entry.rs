//! Ledger entry domain types.

use chrono::{DateTime, NaiveDate, Utc};
use ledgerkeep_shared::types::{LedgerEntryId, PostingId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::account::AccountType;

/// Type of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    /// Debit entry (increases assets/expenses/reserves, decreases liabilities/revenue).
    Debit,
    /// Credit entry (decreases assets/expenses/reserves, increases liabilities/revenue).
    Credit,
}

impl EntryType {
    /// Returns the opposite entry type.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }

    /// Returns the string representation stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }

    /// Parses an entry type from its stored representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DEBIT" => Some(Self::Debit),
            "CREDIT" => Some(Self::Credit),
            _ => None,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of a posting before it has been written.
///
/// Drafts carry everything a stored entry does except identity,
/// timestamps and running-balance bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntryDraft {
    /// Shared payment transaction ID this entry relates to.
    pub transaction_id: Option<String>,
    /// Marketplace order this entry relates to.
    pub order_id: Option<String>,
    /// The account affected by this entry.
    pub account_type: AccountType,
    /// Whether this is a debit or credit.
    pub entry_type: EntryType,
    /// Amount, always positive.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Human-readable description.
    pub description: String,
    /// External reference (dispute ID, job ID, ...).
    pub reference: Option<String>,
    /// Free-form metadata.
    pub metadata: Option<serde_json::Value>,
    /// Accounting date of the entry.
    pub effective_date: NaiveDate,
}

impl LedgerEntryDraft {
    /// Creates a draft with the required fields; optional links start empty.
    #[must_use]
    pub fn new(
        account_type: AccountType,
        entry_type: EntryType,
        amount: Decimal,
        currency: impl Into<String>,
        description: impl Into<String>,
        effective_date: NaiveDate,
    ) -> Self {
        Self {
            transaction_id: None,
            order_id: None,
            account_type,
            entry_type,
            amount,
            currency: currency.into(),
            description: description.into(),
            reference: None,
            metadata: None,
            effective_date,
        }
    }

    /// Links the draft to a payment transaction.
    #[must_use]
    pub fn with_transaction(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    /// Sets the external reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Attaches metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        signed(self.entry_type, self.amount)
    }
}

/// A single stored ledger entry.
///
/// Entries are append-only: the only mutation ever applied is
/// [`LedgerEntry::mark_verified`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier for this entry.
    pub id: LedgerEntryId,
    /// Correlation key shared by all entries of one posting.
    pub posting_id: PostingId,
    /// Shared payment transaction ID this entry relates to.
    pub transaction_id: Option<String>,
    /// Marketplace order this entry relates to.
    pub order_id: Option<String>,
    /// The account affected by this entry.
    pub account_type: AccountType,
    /// Whether this is a debit or credit.
    pub entry_type: EntryType,
    /// Amount, always positive.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Human-readable description.
    pub description: String,
    /// External reference.
    pub reference: Option<String>,
    /// Free-form metadata.
    pub metadata: Option<serde_json::Value>,
    /// Whether the nightly sweep has verified this entry.
    pub verified: bool,
    /// Who verified the entry.
    pub verified_by: Option<String>,
    /// When the entry was verified.
    pub verified_at: Option<DateTime<Utc>>,
    /// Accounting date of the entry.
    pub effective_date: NaiveDate,
    /// Per (account, currency) counter, incremented by every entry.
    pub account_version: i64,
    /// Normal balance of the (account, currency) before this entry.
    pub previous_balance: Decimal,
    /// Normal balance of the (account, currency) after this entry.
    pub current_balance: Decimal,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
    /// When the entry was last touched (verification only).
    pub updated_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        signed(self.entry_type, self.amount)
    }

    /// Stamps verification fields; the entry is otherwise unchanged.
    pub fn mark_verified(&mut self, verifier: &str, at: DateTime<Utc>) {
        if self.verified {
            return;
        }
        self.verified = true;
        self.verified_by = Some(verifier.to_string());
        self.verified_at = Some(at);
        self.updated_at = at;
    }

    /// Returns true if `other` is this entry's counter-entry.
    #[must_use]
    pub fn is_counter_entry_of(&self, other: &Self) -> bool {
        self.posting_id == other.posting_id
            && self.entry_type == other.entry_type.opposite()
            && self.amount == other.amount
            && self.currency == other.currency
    }
}

fn signed(entry_type: EntryType, amount: Decimal) -> Decimal {
    match entry_type {
        EntryType::Debit => amount,
        EntryType::Credit => -amount,
    }
}
