//! Ledger migration.
//!
//! Creates the append-only ledger_entries table. Amounts are always
//! positive; the direction lives in entry_type. Running balances are
//! versioned per (account_type, currency) and the unique version index is
//! what rejects a concurrent writer.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(LEDGER_ENTRIES_SQL).await?;
        db.execute_unprepared(APPEND_ONLY_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TRIGGER IF EXISTS trg_ledger_entries_append_only ON ledger_entries;
             DROP FUNCTION IF EXISTS ledger_entries_append_only();
             DROP TABLE IF EXISTS ledger_entries CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const LEDGER_ENTRIES_SQL: &str = r"
CREATE TABLE ledger_entries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    posting_id UUID NOT NULL,
    transaction_id VARCHAR(100),
    order_id VARCHAR(100),
    account_type VARCHAR(40) NOT NULL,
    entry_type VARCHAR(6) NOT NULL,
    amount NUMERIC(28, 8) NOT NULL,
    currency CHAR(3) NOT NULL,
    description VARCHAR(500) NOT NULL,
    reference VARCHAR(255),
    metadata JSONB,
    verified BOOLEAN NOT NULL DEFAULT false,
    verified_by VARCHAR(100),
    verified_at TIMESTAMPTZ,
    effective_date DATE NOT NULL,
    account_version BIGINT NOT NULL,
    previous_balance NUMERIC(28, 8) NOT NULL,
    current_balance NUMERIC(28, 8) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_le_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_le_entry_type CHECK (entry_type IN ('DEBIT', 'CREDIT')),
    CONSTRAINT chk_le_account_type CHECK (account_type IN (
        'CASH', 'PROVIDER_RECEIVABLE', 'VENDOR_PAYABLE', 'CUSTOMER_REFUND_PAYABLE',
        'PLATFORM_COMMISSION', 'PROCESSING_FEES', 'CHARGEBACK_LOSS', 'DISPUTE_RESERVE'
    )),
    CONSTRAINT chk_le_account_version CHECK (account_version >= 1)
);

-- Optimistic lock: two writers cannot claim the same version
CREATE UNIQUE INDEX uq_le_account_version
    ON ledger_entries(account_type, currency, account_version);

CREATE INDEX idx_le_posting ON ledger_entries(posting_id);
CREATE INDEX idx_le_transaction ON ledger_entries(transaction_id) WHERE transaction_id IS NOT NULL;
CREATE INDEX idx_le_account ON ledger_entries(account_type, currency);
CREATE INDEX idx_le_unverified ON ledger_entries(created_at) WHERE verified = false;
";

const APPEND_ONLY_SQL: &str = r"
-- Entries are never deleted and only the verification columns may change
CREATE OR REPLACE FUNCTION ledger_entries_append_only()
RETURNS TRIGGER AS $$
BEGIN
    IF TG_OP = 'DELETE' THEN
        RAISE EXCEPTION 'ledger_entries is append-only';
    END IF;
    IF NEW.posting_id <> OLD.posting_id
        OR NEW.account_type <> OLD.account_type
        OR NEW.entry_type <> OLD.entry_type
        OR NEW.amount <> OLD.amount
        OR NEW.currency <> OLD.currency
        OR NEW.account_version <> OLD.account_version
        OR NEW.current_balance <> OLD.current_balance THEN
        RAISE EXCEPTION 'ledger entry % is immutable', OLD.id;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_ledger_entries_append_only
    BEFORE UPDATE OR DELETE ON ledger_entries
    FOR EACH ROW EXECUTE FUNCTION ledger_entries_append_only();
";
