//! Dispute and chargeback lifecycle.
//!
//! Provider webhooks arrive as [`DisputeEvent`]s. The [`DisputeManager`]
//! maps each provider's vocabulary onto one state machine and moves the
//! disputed amount between cash and the dispute reserve:
//!
//! - created: freeze (debit `DISPUTE_RESERVE`, credit `CASH`)
//! - won: release (debit `CASH`, credit `DISPUTE_RESERVE`)
//! - lost or accepted: chargeback (debit `CHARGEBACK_LOSS`, credit `DISPUTE_RESERVE`)

pub mod error;
pub mod event;
pub mod manager;
pub mod mapping;
pub mod repository;
pub mod types;


pub use error::DisputeError;
pub use event::{DisputeClosed, DisputeCreated, DisputeEvent, DisputeUpdated};
pub use manager::{DisputeManager, DisputeOutcome, HIGH_VALUE_DISPUTE_AMOUNT};
pub use mapping::{map_reason, map_status, map_type};
pub use repository::DisputeRepository;
pub use types::{Dispute, DisputeReason, DisputeStatus, DisputeType};
