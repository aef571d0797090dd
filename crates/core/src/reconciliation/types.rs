//! Reconciliation job and discrepancy types.

use chrono::{DateTime, NaiveDate, Utc};
use ledgerkeep_shared::types::{DiscrepancyId, ReconciliationJobId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ReconciliationError;
use crate::payment::PaymentProvider;

/// Job lifecycle status.
///
/// `PENDING -> PROCESSING -> {COMPLETED, COMPLETED_WITH_DISCREPANCIES, FAILED, CANCELLED}`,
/// with `CANCELLED` also reachable from `PENDING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconciliationStatus {
    /// Created, not started.
    Pending,
    /// Running.
    Processing,
    /// Finished with no discrepancies.
    Completed,
    /// Finished and found discrepancies.
    CompletedWithDiscrepancies,
    /// Aborted by an error.
    Failed,
    /// Cancelled by an operator.
    Cancelled,
}

impl ReconciliationStatus {
    /// Returns the string representation stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::CompletedWithDiscrepancies => "COMPLETED_WITH_DISCREPANCIES",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses the stored representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "PROCESSING" => Some(Self::Processing),
            "COMPLETED" => Some(Self::Completed),
            "COMPLETED_WITH_DISCREPANCIES" => Some(Self::CompletedWithDiscrepancies),
            "FAILED" => Some(Self::Failed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending | Self::Processing)
    }

    /// Returns true if moving to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Processing | Self::Cancelled),
            Self::Processing => next.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What started a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconciliationTrigger {
    /// Scheduled daily run.
    Daily,
    /// Operator request.
    Manual,
}

impl ReconciliationTrigger {
    /// Returns the string representation stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Manual => "MANUAL",
        }
    }

    /// Parses the stored representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DAILY" => Some(Self::Daily),
            "MANUAL" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// One reconciliation run for one provider and date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationJob {
    /// Row identifier.
    pub id: ReconciliationJobId,
    /// Human-readable job ID; manual jobs start with `MANUAL-`.
    pub job_id: String,
    /// Provider reconciled.
    pub provider: PaymentProvider,
    /// What started the job.
    pub trigger: ReconciliationTrigger,
    /// First day covered.
    pub start_date: NaiveDate,
    /// Last day covered, inclusive.
    pub end_date: NaiveDate,
    /// Lifecycle status.
    pub status: ReconciliationStatus,
    /// Lines in the provider feed.
    pub provider_transaction_count: u64,
    /// Internal transactions in the window.
    pub internal_transaction_count: u64,
    /// Internal transactions the provider also reported.
    pub matched_count: u64,
    /// Discrepancies recorded.
    pub discrepancy_count: u64,
    /// Sum of provider amounts.
    pub provider_total: Decimal,
    /// Sum of internal amounts.
    pub internal_total: Decimal,
    /// `provider_total - internal_total`.
    pub total_difference: Decimal,
    /// Failure message.
    pub error_message: Option<String>,
    /// When processing began.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
}

impl ReconciliationJob {
    /// Creates a pending job.
    #[must_use]
    pub fn new(
        provider: PaymentProvider,
        trigger: ReconciliationTrigger,
        start_date: NaiveDate,
        end_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        let id = ReconciliationJobId::new();
        let simple = id.0.simple().to_string();
        let suffix = simple.get(24..).unwrap_or(&simple);
        let job_id = match trigger {
            ReconciliationTrigger::Daily => {
                format!("RECON-{provider}-{}-{suffix}", start_date.format("%Y%m%d"))
            }
            ReconciliationTrigger::Manual => format!(
                "MANUAL-{provider}-{}-{}-{suffix}",
                start_date.format("%Y%m%d"),
                end_date.format("%Y%m%d")
            ),
        };

        Self {
            id,
            job_id,
            provider,
            trigger,
            start_date,
            end_date,
            status: ReconciliationStatus::Pending,
            provider_transaction_count: 0,
            internal_transaction_count: 0,
            matched_count: 0,
            discrepancy_count: 0,
            provider_total: Decimal::ZERO,
            internal_total: Decimal::ZERO,
            total_difference: Decimal::ZERO,
            error_message: None,
            started_at: None,
            completed_at: None,
            created_at: now,
        }
    }

    fn transition(&mut self, next: ReconciliationStatus) -> Result<(), ReconciliationError> {
        if !self.status.can_transition_to(next) {
            return Err(ReconciliationError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// PENDING -> PROCESSING; stamps `started_at`.
    pub fn start(&mut self, at: DateTime<Utc>) -> Result<(), ReconciliationError> {
        self.transition(ReconciliationStatus::Processing)?;
        self.started_at = Some(at);
        Ok(())
    }

    /// PROCESSING -> COMPLETED or COMPLETED_WITH_DISCREPANCIES, depending
    /// on `discrepancy_count`; stamps `completed_at`.
    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<(), ReconciliationError> {
        let next = if self.discrepancy_count > 0 {
            ReconciliationStatus::CompletedWithDiscrepancies
        } else {
            ReconciliationStatus::Completed
        };
        self.transition(next)?;
        self.completed_at = Some(at);
        Ok(())
    }

    /// PROCESSING -> FAILED with a message; stamps `completed_at`.
    pub fn fail(&mut self, message: impl Into<String>, at: DateTime<Utc>) -> Result<(), ReconciliationError> {
        self.transition(ReconciliationStatus::Failed)?;
        self.error_message = Some(message.into());
        self.completed_at = Some(at);
        Ok(())
    }

    /// PENDING or PROCESSING -> CANCELLED; stamps `completed_at`.
    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<(), ReconciliationError> {
        self.transition(ReconciliationStatus::Cancelled)?;
        self.completed_at = Some(at);
        Ok(())
    }
}

/// Kind of mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancyType {
    /// Provider reported a transaction with no internal record.
    #[serde(alias = "MISSING_TRANSACTION")]
    MissingInternal,
    /// Internal record the provider did not report.
    #[serde(alias = "EXTRA_TRANSACTION")]
    MissingProvider,
    /// Amounts differ after rounding.
    AmountMismatch,
    /// Normalized statuses differ.
    StatusMismatch,
    /// Dates more than one day apart.
    DateMismatch,
    /// Currencies differ.
    CurrencyMismatch,
    /// Provider feed repeats an ID.
    DuplicateTransaction,
    /// Provider line is unusable.
    InvalidTransaction,
}

impl DiscrepancyType {
    /// Returns the string representation stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingInternal => "MISSING_INTERNAL",
            Self::MissingProvider => "MISSING_PROVIDER",
            Self::AmountMismatch => "AMOUNT_MISMATCH",
            Self::StatusMismatch => "STATUS_MISMATCH",
            Self::DateMismatch => "DATE_MISMATCH",
            Self::CurrencyMismatch => "CURRENCY_MISMATCH",
            Self::DuplicateTransaction => "DUPLICATE_TRANSACTION",
            Self::InvalidTransaction => "INVALID_TRANSACTION",
        }
    }

    /// Parses the stored representation, accepting the legacy names.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MISSING_INTERNAL" | "MISSING_TRANSACTION" => Some(Self::MissingInternal),
            "MISSING_PROVIDER" | "EXTRA_TRANSACTION" => Some(Self::MissingProvider),
            "AMOUNT_MISMATCH" => Some(Self::AmountMismatch),
            "STATUS_MISMATCH" => Some(Self::StatusMismatch),
            "DATE_MISMATCH" => Some(Self::DateMismatch),
            "CURRENCY_MISMATCH" => Some(Self::CurrencyMismatch),
            "DUPLICATE_TRANSACTION" => Some(Self::DuplicateTransaction),
            "INVALID_TRANSACTION" => Some(Self::InvalidTransaction),
            _ => None,
        }
    }

    /// One side has no record at all.
    #[must_use]
    pub const fn is_missing(self) -> bool {
        matches!(self, Self::MissingInternal | Self::MissingProvider)
    }
}

impl fmt::Display for DiscrepancyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrepancy severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancySeverity {
    /// Informational.
    Low,
    /// Needs review.
    Medium,
    /// Needs a ticket.
    High,
    /// Needs a ticket urgently.
    Critical,
}

impl DiscrepancySeverity {
    /// Returns the string representation stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Parses the stored representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }

    /// HIGH and CRITICAL discrepancies open a support ticket.
    #[must_use]
    pub const fn requires_ticket(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

impl fmt::Display for DiscrepancySeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected mismatch belonging to a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    /// Row identifier.
    pub id: DiscrepancyId,
    /// Owning job's human-readable ID.
    pub job_id: String,
    /// Kind of mismatch.
    pub discrepancy_type: DiscrepancyType,
    /// Severity.
    pub severity: DiscrepancySeverity,
    /// Shared transaction ID (may be blank for invalid provider lines).
    pub transaction_id: String,
    /// Provider-side ID, when the provider reported it.
    pub provider_transaction_id: Option<String>,
    /// Internal ID, when recorded internally.
    pub internal_transaction_id: Option<String>,
    /// Provider amount.
    pub provider_amount: Option<Decimal>,
    /// Internal amount.
    pub internal_amount: Option<Decimal>,
    /// Absolute difference, or the known amount for missing records.
    pub amount_difference: Option<Decimal>,
    /// Provider-native status.
    pub provider_status: Option<String>,
    /// Internal status.
    pub internal_status: Option<String>,
    /// Provider date.
    pub provider_date: Option<NaiveDate>,
    /// Internal date.
    pub internal_date: Option<NaiveDate>,
    /// Raw provider line.
    pub provider_payload: Option<serde_json::Value>,
    /// Raw internal record.
    pub internal_payload: Option<serde_json::Value>,
    /// Human-readable summary.
    pub description: String,
    /// Whether someone resolved it.
    pub resolved: bool,
    /// Who resolved it.
    pub resolved_by: Option<String>,
    /// Resolution notes.
    pub resolution_notes: Option<String>,
    /// When it was resolved.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Linked support ticket.
    pub ticket_id: Option<String>,
    /// When it was recorded.
    pub created_at: DateTime<Utc>,
}

impl Discrepancy {
    /// Creates an unresolved discrepancy with both sides empty.
    #[must_use]
    pub fn new(
        job_id: impl Into<String>,
        discrepancy_type: DiscrepancyType,
        transaction_id: impl Into<String>,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DiscrepancyId::new(),
            job_id: job_id.into(),
            discrepancy_type,
            severity: DiscrepancySeverity::Low,
            transaction_id: transaction_id.into(),
            provider_transaction_id: None,
            internal_transaction_id: None,
            provider_amount: None,
            internal_amount: None,
            amount_difference: None,
            provider_status: None,
            internal_status: None,
            provider_date: None,
            internal_date: None,
            provider_payload: None,
            internal_payload: None,
            description: description.into(),
            resolved: false,
            resolved_by: None,
            resolution_notes: None,
            resolved_at: None,
            ticket_id: None,
            created_at: now,
        }
    }

    /// Marks the discrepancy resolved.
    pub fn resolve(
        &mut self,
        resolver: &str,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), ReconciliationError> {
        if self.resolved {
            return Err(ReconciliationError::AlreadyResolved(self.id));
        }
        self.resolved = true;
        self.resolved_by = Some(resolver.to_string());
        self.resolution_notes = notes;
        self.resolved_at = Some(at);
        Ok(())
    }
}
