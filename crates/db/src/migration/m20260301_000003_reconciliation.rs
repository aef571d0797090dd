//! Reconciliation jobs and discrepancies migration.
//!
//! Discrepancies belong to their job and go with it.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(RECONCILIATION_JOBS_SQL).await?;
        db.execute_unprepared(RECONCILIATION_DISCREPANCIES_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS reconciliation_discrepancies CASCADE;")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS reconciliation_jobs CASCADE;")
            .await?;
        Ok(())
    }
}

const RECONCILIATION_JOBS_SQL: &str = r"
CREATE TABLE reconciliation_jobs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    job_id VARCHAR(80) NOT NULL UNIQUE,
    provider VARCHAR(10) NOT NULL,
    trigger_type VARCHAR(10) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    status VARCHAR(30) NOT NULL,
    provider_transaction_count BIGINT NOT NULL DEFAULT 0,
    internal_transaction_count BIGINT NOT NULL DEFAULT 0,
    matched_count BIGINT NOT NULL DEFAULT 0,
    discrepancy_count BIGINT NOT NULL DEFAULT 0,
    provider_total NUMERIC(28, 8) NOT NULL DEFAULT 0,
    internal_total NUMERIC(28, 8) NOT NULL DEFAULT 0,
    total_difference NUMERIC(28, 8) NOT NULL DEFAULT 0,
    error_message TEXT,
    started_at TIMESTAMPTZ,
    completed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_rj_date_range CHECK (end_date >= start_date),
    CONSTRAINT chk_rj_trigger CHECK (trigger_type IN ('DAILY', 'MANUAL'))
);

CREATE INDEX idx_rj_provider_dates ON reconciliation_jobs(provider, start_date DESC);
";

const RECONCILIATION_DISCREPANCIES_SQL: &str = r"
CREATE TABLE reconciliation_discrepancies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    job_id VARCHAR(80) NOT NULL REFERENCES reconciliation_jobs(job_id) ON DELETE CASCADE,
    discrepancy_type VARCHAR(30) NOT NULL,
    severity VARCHAR(10) NOT NULL,
    transaction_id VARCHAR(100) NOT NULL,
    provider_transaction_id VARCHAR(100),
    internal_transaction_id VARCHAR(100),
    provider_amount NUMERIC(28, 8),
    internal_amount NUMERIC(28, 8),
    amount_difference NUMERIC(28, 8),
    provider_status VARCHAR(40),
    internal_status VARCHAR(40),
    provider_date DATE,
    internal_date DATE,
    provider_payload JSONB,
    internal_payload JSONB,
    description TEXT NOT NULL,
    resolved BOOLEAN NOT NULL DEFAULT false,
    resolved_by VARCHAR(100),
    resolution_notes TEXT,
    resolved_at TIMESTAMPTZ,
    ticket_id VARCHAR(40),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_rd_severity CHECK (severity IN ('LOW', 'MEDIUM', 'HIGH', 'CRITICAL')),
    CONSTRAINT chk_rd_resolution CHECK (resolved = false OR resolved_at IS NOT NULL)
);

CREATE INDEX idx_rd_job ON reconciliation_discrepancies(job_id);
CREATE INDEX idx_rd_unresolved ON reconciliation_discrepancies(created_at) WHERE resolved = false;
";
