//! Support tickets migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(SUPPORT_TICKETS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS support_tickets CASCADE;
             DROP SEQUENCE IF EXISTS support_ticket_number_seq;",
        )
        .await?;
        Ok(())
    }
}

const SUPPORT_TICKETS_SQL: &str = r"
CREATE SEQUENCE support_ticket_number_seq START 1000;

CREATE TABLE support_tickets (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    ticket_number VARCHAR(40) NOT NULL UNIQUE
        DEFAULT ('TKT-' || nextval('support_ticket_number_seq')),
    subject VARCHAR(500) NOT NULL,
    description TEXT NOT NULL,
    priority VARCHAR(10) NOT NULL,
    category VARCHAR(20) NOT NULL,
    status VARCHAR(12) NOT NULL DEFAULT 'OPEN',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_st_priority CHECK (priority IN ('LOW', 'MEDIUM', 'HIGH', 'URGENT')),
    CONSTRAINT chk_st_status CHECK (status IN ('OPEN', 'IN_PROGRESS', 'RESOLVED', 'CLOSED'))
);

CREATE INDEX idx_st_open ON support_tickets(priority, created_at) WHERE status = 'OPEN';
";
