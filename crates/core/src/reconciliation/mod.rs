//! Provider feed reconciliation.
//!
//! Each job compares one provider's settlement feed for a date range against
//! the internal transactions of the same window, classifies every mismatch
//! by type and severity, and opens support tickets for the serious ones.

pub mod engine;
pub mod error;
pub mod matcher;
pub mod repository;
pub mod severity;
pub mod types;


pub use engine::{ReconciliationEngine, utc_window};
pub use error::ReconciliationError;
pub use matcher::{MatchOutcome, compare_feeds};
pub use repository::ReconciliationRepository;
pub use severity::determine_severity;
pub use types::{
    Discrepancy, DiscrepancySeverity, DiscrepancyType, ReconciliationJob, ReconciliationStatus,
    ReconciliationTrigger,
};
