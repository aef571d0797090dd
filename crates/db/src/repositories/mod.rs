//! Repository abstractions for data access.
//!
//! Each repository implements one of the store traits from
//! `ledgerkeep-core`, hiding the `SeaORM` implementation details from the
//! domain services.

mod convert;

pub mod dispute;
pub mod ledger;
pub mod payment;
pub mod reconciliation;
pub mod ticket;

pub use dispute::ProviderDisputeRepository;
pub use ledger::{LedgerRepository, MAX_POST_ATTEMPTS};
pub use payment::PaymentTransactionRepository;
pub use reconciliation::ReconciliationJobRepository;
pub use ticket::SupportTicketRepository;
