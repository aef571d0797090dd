//! `SeaORM` entity definitions.
//!
//! Enum-like columns are stored as their uppercase string form and parsed
//! back with the domain type's `parse`.

pub mod disputes;
pub mod ledger_entries;
pub mod ledger_posting_keys;
pub mod payment_transactions;
pub mod reconciliation_discrepancies;
pub mod reconciliation_jobs;
pub mod support_tickets;

pub mod prelude {
    //! Entity re-exports.
    pub use super::disputes::Entity as Disputes;
    pub use super::ledger_entries::Entity as LedgerEntries;
    pub use super::ledger_posting_keys::Entity as LedgerPostingKeys;
    pub use super::payment_transactions::Entity as PaymentTransactions;
    pub use super::reconciliation_discrepancies::Entity as ReconciliationDiscrepancies;
    pub use super::reconciliation_jobs::Entity as ReconciliationJobs;
    pub use super::support_tickets::Entity as SupportTickets;
}
