//! Support tickets stored in Postgres.

use async_trait::async_trait;
use chrono::Utc;
use ledgerkeep_core::notify::{NewTicket, NotifyError, TicketId, TicketSink};
use sea_orm::{ActiveModelTrait, DatabaseConnection, NotSet, Set};
use tracing::info;
use uuid::Uuid;

use super::convert::to_db;
use crate::entities::support_tickets;

/// Status of a freshly opened ticket.
pub const OPEN_STATUS: &str = "OPEN";

/// Ticket sink writing to the `support_tickets` table.
///
/// Ticket numbers come from the table's sequence default (`TKT-<n>`).
#[derive(Debug, Clone)]
pub struct SupportTicketRepository {
    db: DatabaseConnection,
}

impl SupportTicketRepository {
    /// Creates a new ticket repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TicketSink for SupportTicketRepository {
    async fn create_ticket(&self, ticket: NewTicket) -> Result<TicketId, NotifyError> {
        let now = to_db(Utc::now());
        let model = support_tickets::ActiveModel {
            id: Set(Uuid::now_v7()),
            ticket_number: NotSet,
            subject: Set(ticket.subject),
            description: Set(ticket.description),
            priority: Set(ticket.priority.as_str().to_string()),
            category: Set(ticket.category.as_str().to_string()),
            status: Set(OPEN_STATUS.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        info!(
            ticket = %model.ticket_number,
            priority = %model.priority,
            category = %model.category,
            "Support ticket opened"
        );
        Ok(TicketId(model.ticket_number))
    }
}
