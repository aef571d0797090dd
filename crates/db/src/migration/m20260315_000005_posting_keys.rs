//! Posting keys and dispute versions migration.
//!
//! `ledger_posting_keys` records the posting written under a caller's
//! key; its primary key is what turns a second writer into a conflict.
//! `disputes.version` backs the optimistic check on dispute updates.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(POSTING_KEYS_SQL).await?;
        db.execute_unprepared("ALTER TABLE disputes ADD COLUMN version BIGINT NOT NULL DEFAULT 1;")
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("ALTER TABLE disputes DROP COLUMN IF EXISTS version;")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS ledger_posting_keys CASCADE;")
            .await?;
        Ok(())
    }
}

const POSTING_KEYS_SQL: &str = r"
CREATE TABLE ledger_posting_keys (
    posting_key VARCHAR(200) PRIMARY KEY,
    posting_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_posting_keys_posting ON ledger_posting_keys(posting_id);
";
