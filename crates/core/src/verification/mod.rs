//! Nightly ledger integrity sweep.
//!
//! Three independent checks:
//! - account balances recomputed from raw entries match the store
//! - every entry has a counter-entry in its posting
//! - every posting balances per currency

pub mod checks;
pub mod service;
pub mod types;


pub use checks::{UnbalancedGroup, balance_divergences, orphaned_entries, unbalanced_groups};
pub use service::{LedgerVerificationService, NIGHTLY_VERIFIER, SUMMARY_TITLE};
pub use types::{CheckResult, VerificationCheck, VerificationReport};
