//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_ledger;
mod m20260301_000002_payments_disputes;
mod m20260301_000003_reconciliation;
mod m20260301_000004_support_tickets;
mod m20260315_000005_posting_keys;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_ledger::Migration),
            Box::new(m20260301_000002_payments_disputes::Migration),
            Box::new(m20260301_000003_reconciliation::Migration),
            Box::new(m20260301_000004_support_tickets::Migration),
            Box::new(m20260315_000005_posting_keys::Migration),
        ]
    }
}
