//! Payment transactions and disputes migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(PAYMENT_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(DISPUTES_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS disputes CASCADE;")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS payment_transactions CASCADE;")
            .await?;
        Ok(())
    }
}

const PAYMENT_TRANSACTIONS_SQL: &str = r"
CREATE TABLE payment_transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    transaction_id VARCHAR(100) NOT NULL UNIQUE,
    provider VARCHAR(10) NOT NULL,
    transaction_type VARCHAR(12) NOT NULL,
    status VARCHAR(10) NOT NULL,
    amount NUMERIC(28, 8) NOT NULL,
    currency CHAR(3) NOT NULL,
    provider_fee NUMERIC(28, 8) NOT NULL DEFAULT 0,
    platform_fee NUMERIC(28, 8) NOT NULL DEFAULT 0,
    order_id VARCHAR(100),
    reconciled BOOLEAN NOT NULL DEFAULT false,
    reconciled_at TIMESTAMPTZ,
    dispute_id VARCHAR(100),
    refunded_transaction_id VARCHAR(100),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_pt_provider CHECK (provider IN ('STRIPE', 'BKASH', 'NAGAD')),
    CONSTRAINT chk_pt_status CHECK (
        status IN ('PENDING', 'SUCCESS', 'FAILED', 'CANCELLED', 'DISPUTED')
    ),
    CONSTRAINT chk_pt_reconciled_at CHECK (reconciled = false OR reconciled_at IS NOT NULL)
);

-- Reconciliation window scans
CREATE INDEX idx_pt_provider_created ON payment_transactions(provider, created_at);
CREATE INDEX idx_pt_unreconciled ON payment_transactions(provider, created_at) WHERE reconciled = false;
";

const DISPUTES_SQL: &str = r"
CREATE TABLE disputes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    provider_dispute_id VARCHAR(100) NOT NULL,
    provider VARCHAR(10) NOT NULL,
    transaction_id VARCHAR(100) NOT NULL,
    dispute_type VARCHAR(12) NOT NULL,
    status VARCHAR(20) NOT NULL,
    reason VARCHAR(30) NOT NULL,
    amount NUMERIC(28, 8) NOT NULL,
    fee NUMERIC(28, 8) NOT NULL DEFAULT 0,
    currency CHAR(3) NOT NULL,
    evidence_due_by TIMESTAMPTZ,
    evidence_submitted BOOLEAN NOT NULL DEFAULT false,
    evidence_submitted_at TIMESTAMPTZ,
    funds_frozen BOOLEAN NOT NULL DEFAULT false,
    funds_frozen_at TIMESTAMPTZ,
    funds_released_at TIMESTAMPTZ,
    admin_notified BOOLEAN NOT NULL DEFAULT false,
    admin_notified_at TIMESTAMPTZ,
    provider_notified BOOLEAN NOT NULL DEFAULT false,
    provider_notified_at TIMESTAMPTZ,
    resolution_notes TEXT,
    internal_notes TEXT,
    received_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    resolved_at TIMESTAMPTZ,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (provider, provider_dispute_id),
    CONSTRAINT chk_disputes_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_disputes_frozen_at CHECK (funds_frozen = false OR funds_frozen_at IS NOT NULL)
);

CREATE INDEX idx_disputes_transaction ON disputes(transaction_id);
CREATE INDEX idx_disputes_overdue ON disputes(evidence_due_by) WHERE status = 'EVIDENCE_REQUIRED';
";
