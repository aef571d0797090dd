//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Account taxonomy and normal-balance rules
//! - Ledger entries (debits and credits)
//! - Posting validation
//! - Running and recomputed balances
//! - Standard postings for payments and disputes
//! - The store contract and an in-memory store

pub mod account;
pub mod balance;
pub mod entry;
pub mod error;
pub mod memory;
pub mod posting;
pub mod store;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use account::{AccountCategory, AccountType};
pub use balance::{
    AccountBalance, BalanceKey, BalanceSnapshot, MaintainedBalance, RunningBalance,
    recompute_balances, recompute_normal_balances, snapshot_from,
};
pub use entry::{EntryType, LedgerEntry, LedgerEntryDraft};
pub use error::LedgerError;
pub use memory::InMemoryLedgerStore;
pub use posting::{DisputeFunds, PaymentCapture, PostingBuilder};
pub use store::{LedgerSnapshot, LedgerStore, PostingReceipt};
pub use validation::{CurrencyTotals, validate_posting};
