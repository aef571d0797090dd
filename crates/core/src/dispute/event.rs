//! Inbound dispute events, already parsed from provider webhooks.
//!
//! Native status, reason and type strings are kept as received and mapped
//! by [`super::mapping`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::payment::PaymentProvider;

/// Provider opened a dispute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisputeCreated {
    /// Provider that raised it.
    pub provider: PaymentProvider,
    /// Provider-side dispute ID.
    pub provider_dispute_id: String,
    /// Disputed transaction (shared ID).
    pub transaction_id: String,
    /// Native dispute type.
    pub native_type: String,
    /// Native reason.
    pub native_reason: String,
    /// Disputed amount.
    pub amount: Decimal,
    /// Dispute fee.
    #[serde(default)]
    pub fee: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Evidence deadline.
    #[serde(default)]
    pub evidence_due_by: Option<DateTime<Utc>>,
}

/// Provider changed a dispute's status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisputeUpdated {
    /// Provider.
    pub provider: PaymentProvider,
    /// Provider-side dispute ID.
    pub provider_dispute_id: String,
    /// Native status.
    pub native_status: String,
    /// New evidence deadline, if the provider sent one.
    #[serde(default)]
    pub evidence_due_by: Option<DateTime<Utc>>,
}

/// Provider decided a dispute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisputeClosed {
    /// Provider.
    pub provider: PaymentProvider,
    /// Provider-side dispute ID.
    pub provider_dispute_id: String,
    /// Native outcome status.
    pub native_status: String,
    /// Provider's explanation.
    #[serde(default)]
    pub resolution_notes: Option<String>,
}

/// Any dispute webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DisputeEvent {
    /// New dispute.
    Created(DisputeCreated),
    /// Status change.
    Updated(DisputeUpdated),
    /// Decision.
    Closed(DisputeClosed),
}

impl DisputeEvent {
    /// Provider that sent the event.
    #[must_use]
    pub const fn provider(&self) -> PaymentProvider {
        match self {
            Self::Created(e) => e.provider,
            Self::Updated(e) => e.provider,
            Self::Closed(e) => e.provider,
        }
    }

    /// Provider-side dispute ID.
    #[must_use]
    pub fn provider_dispute_id(&self) -> &str {
        match self {
            Self::Created(e) => &e.provider_dispute_id,
            Self::Updated(e) => &e.provider_dispute_id,
            Self::Closed(e) => &e.provider_dispute_id,
        }
    }
}
