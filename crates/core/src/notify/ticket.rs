//! Support ticket types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::reconciliation::DiscrepancySeverity;

/// Identifier returned by the ticket system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub String);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ticket urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketPriority {
    /// Whenever convenient.
    Low,
    /// Within a few days.
    Medium,
    /// Same day.
    High,
    /// Immediately.
    Urgent,
}

impl TicketPriority {
    /// Returns the string representation stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }

    /// Parses the stored representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "URGENT" => Some(Self::Urgent),
            _ => None,
        }
    }

    /// Priority for a discrepancy ticket.
    #[must_use]
    pub const fn from_severity(severity: DiscrepancySeverity) -> Self {
        match severity {
            DiscrepancySeverity::Low => Self::Low,
            DiscrepancySeverity::Medium => Self::Medium,
            DiscrepancySeverity::High => Self::High,
            DiscrepancySeverity::Critical => Self::Urgent,
        }
    }
}

/// Team queue a ticket lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketCategory {
    /// Provider feed mismatches.
    Reconciliation,
    /// Disputes and chargebacks.
    Dispute,
    /// Ledger consistency failures.
    LedgerIntegrity,
}

impl TicketCategory {
    /// Returns the string representation stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reconciliation => "RECONCILIATION",
            Self::Dispute => "DISPUTE",
            Self::LedgerIntegrity => "LEDGER_INTEGRITY",
        }
    }

    /// Parses the stored representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RECONCILIATION" => Some(Self::Reconciliation),
            "DISPUTE" => Some(Self::Dispute),
            "LEDGER_INTEGRITY" => Some(Self::LedgerIntegrity),
            _ => None,
        }
    }
}

/// A ticket to open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    /// One-line summary.
    pub subject: String,
    /// Full description.
    pub description: String,
    /// Urgency.
    pub priority: TicketPriority,
    /// Queue.
    pub category: TicketCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_from_severity() {
        assert_eq!(
            TicketPriority::from_severity(DiscrepancySeverity::Critical),
            TicketPriority::Urgent
        );
        assert_eq!(
            TicketPriority::from_severity(DiscrepancySeverity::High),
            TicketPriority::High
        );
    }

    #[test]
    fn test_category_parse() {
        for category in [
            TicketCategory::Reconciliation,
            TicketCategory::Dispute,
            TicketCategory::LedgerIntegrity,
        ] {
            assert_eq!(TicketCategory::parse(category.as_str()), Some(category));
        }
    }
}
