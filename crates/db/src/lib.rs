//! Database layer with `SeaORM` entities and Postgres-backed stores.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Implementations of the ledger, transaction, reconciliation and dispute
//!   store traits from `ledgerkeep-core`
//! - A support ticket sink
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    LedgerRepository, PaymentTransactionRepository, ProviderDisputeRepository,
    ReconciliationJobRepository, SupportTicketRepository,
};

use ledgerkeep_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
