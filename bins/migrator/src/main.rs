//! Database migration runner for Ledgerkeep.
//!
//! Usage:
//!   migrator up      - Apply pending migrations (ledger, transactions, reconciliation, disputes, tickets)
//!   migrator down    - Roll back the last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-apply every migration
//!
//! Reads `DATABASE_URL`, from the environment or `.env`.

use ledgerkeep_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // sets up its own tracing
    cli::run_cli(Migrator).await;
}
