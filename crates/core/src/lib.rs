//! Core business logic for Ledgerkeep.
//!
//! This crate contains the marketplace ledger core with ZERO web or database
//! dependencies. Storage, provider feeds and alert delivery sit behind the
//! traits defined here; `ledgerkeep-db` and `ledgerkeep-integrations`
//! implement them.
//!
//! # Modules
//!
//! - `ledger` - Double-entry bookkeeping, posting builders and the ledger store
//! - `payment` - Payment transactions, providers and the provider gateway
//! - `reconciliation` - Provider feed reconciliation and discrepancy severity
//! - `dispute` - Dispute state machine and fund freeze/release/chargeback
//! - `verification` - Nightly ledger integrity sweep
//! - `notify` - Alert and support ticket sinks
//! - `persistence` - Errors shared by the store traits

pub mod dispute;
pub mod ledger;
pub mod notify;
pub mod payment;
pub mod persistence;
pub mod reconciliation;
pub mod verification;

#[cfg(test)]
mod testing;
