//! Dispute domain types and state transitions.
//!
//! Timestamp side effects live in the `with_*` transition functions only;
//! fields are never stamped anywhere else.

use chrono::{DateTime, Utc};
use ledgerkeep_shared::types::DisputeId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::payment::PaymentProvider;

/// Kind of dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeType {
    /// Funds pulled back by the issuer.
    Chargeback,
    /// Pre-dispute question from the issuer.
    Inquiry,
    /// Request for transaction documents.
    Retrieval,
    /// Fraud claim.
    Fraud,
}

impl DisputeType {
    /// Returns the string representation stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chargeback => "CHARGEBACK",
            Self::Inquiry => "INQUIRY",
            Self::Retrieval => "RETRIEVAL",
            Self::Fraud => "FRAUD",
        }
    }

    /// Parses the stored representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CHARGEBACK" => Some(Self::Chargeback),
            "INQUIRY" => Some(Self::Inquiry),
            "RETRIEVAL" => Some(Self::Retrieval),
            "FRAUD" => Some(Self::Fraud),
            _ => None,
        }
    }
}

/// Dispute lifecycle status.
///
/// ```text
/// RECEIVED -> UNDER_REVIEW -> EVIDENCE_REQUIRED <-> EVIDENCE_SUBMITTED
///          -> {WON, LOST, ACCEPTED} -> CLOSED
/// EVIDENCE_REQUIRED -> EXPIRED (deadline passed) -> {WON, LOST, ACCEPTED, CLOSED}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeStatus {
    /// Just received from the provider.
    Received,
    /// Being looked at; the default for unknown provider statuses.
    UnderReview,
    /// Provider awaits merchant evidence.
    EvidenceRequired,
    /// Evidence sent, awaiting decision.
    EvidenceSubmitted,
    /// Decided for the merchant.
    Won,
    /// Decided for the customer.
    Lost,
    /// Merchant accepted the dispute.
    Accepted,
    /// Evidence deadline passed.
    Expired,
    /// Archived.
    Closed,
}

impl DisputeStatus {
    /// Returns the string representation stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::UnderReview => "UNDER_REVIEW",
            Self::EvidenceRequired => "EVIDENCE_REQUIRED",
            Self::EvidenceSubmitted => "EVIDENCE_SUBMITTED",
            Self::Won => "WON",
            Self::Lost => "LOST",
            Self::Accepted => "ACCEPTED",
            Self::Expired => "EXPIRED",
            Self::Closed => "CLOSED",
        }
    }

    /// Parses the stored representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RECEIVED" => Some(Self::Received),
            "UNDER_REVIEW" => Some(Self::UnderReview),
            "EVIDENCE_REQUIRED" => Some(Self::EvidenceRequired),
            "EVIDENCE_SUBMITTED" => Some(Self::EvidenceSubmitted),
            "WON" => Some(Self::Won),
            "LOST" => Some(Self::Lost),
            "ACCEPTED" => Some(Self::Accepted),
            "EXPIRED" => Some(Self::Expired),
            "CLOSED" => Some(Self::Closed),
            _ => None,
        }
    }

    /// WON, LOST or ACCEPTED.
    #[must_use]
    pub const fn is_resolution(self) -> bool {
        matches!(self, Self::Won | Self::Lost | Self::Accepted)
    }

    /// Decided or archived; only archiving is possible afterwards.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost | Self::Accepted | Self::Closed)
    }

    /// Whether evidence may still be submitted.
    #[must_use]
    pub const fn accepts_evidence(self) -> bool {
        matches!(
            self,
            Self::Received | Self::UnderReview | Self::EvidenceRequired
        )
    }

    /// Returns true if moving to `next` is allowed.
    ///
    /// Open statuses may move freely among themselves, since providers
    /// deliver webhooks out of order. An expired dispute still awaits the
    /// provider's decision. Decided statuses may only be closed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next || next == Self::Received {
            return false;
        }
        match self {
            Self::Closed => false,
            Self::Won | Self::Lost | Self::Accepted => next == Self::Closed,
            Self::Expired => next == Self::Closed || next.is_resolution(),
            Self::Received
            | Self::UnderReview
            | Self::EvidenceRequired
            | Self::EvidenceSubmitted => true,
        }
    }
}

impl fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason the customer gave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeReason {
    /// Cardholder did not authorize.
    Fraudulent,
    /// Cardholder does not recognize the charge.
    Unrecognized,
    /// Charged more than once.
    Duplicate,
    /// Subscription was cancelled.
    SubscriptionCancelled,
    /// Goods or service never arrived.
    ProductNotReceived,
    /// Goods or service not as described.
    ProductUnacceptable,
    /// Refund promised but not processed.
    CreditNotProcessed,
    /// Unspecified.
    General,
    /// Anything the provider vocabulary does not map.
    Other,
}

impl DisputeReason {
    /// Returns the string representation stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fraudulent => "FRAUDULENT",
            Self::Unrecognized => "UNRECOGNIZED",
            Self::Duplicate => "DUPLICATE",
            Self::SubscriptionCancelled => "SUBSCRIPTION_CANCELLED",
            Self::ProductNotReceived => "PRODUCT_NOT_RECEIVED",
            Self::ProductUnacceptable => "PRODUCT_UNACCEPTABLE",
            Self::CreditNotProcessed => "CREDIT_NOT_PROCESSED",
            Self::General => "GENERAL",
            Self::Other => "OTHER",
        }
    }

    /// Parses the stored representation, falling back to `Other`.
    #[must_use]
    pub fn parse_or_other(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "FRAUDULENT" => Self::Fraudulent,
            "UNRECOGNIZED" => Self::Unrecognized,
            "DUPLICATE" => Self::Duplicate,
            "SUBSCRIPTION_CANCELLED" => Self::SubscriptionCancelled,
            "PRODUCT_NOT_RECEIVED" => Self::ProductNotReceived,
            "PRODUCT_UNACCEPTABLE" => Self::ProductUnacceptable,
            "CREDIT_NOT_PROCESSED" => Self::CreditNotProcessed,
            "GENERAL" => Self::General,
            _ => Self::Other,
        }
    }
}

/// A dispute against a payment transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispute {
    /// Internal identifier.
    pub id: DisputeId,
    /// Provider-side dispute ID.
    pub provider_dispute_id: String,
    /// Provider that raised the dispute.
    pub provider: PaymentProvider,
    /// Disputed payment transaction (shared ID).
    pub transaction_id: String,
    /// Kind of dispute.
    pub dispute_type: DisputeType,
    /// Lifecycle status.
    pub status: DisputeStatus,
    /// Customer's reason.
    pub reason: DisputeReason,
    /// Disputed amount.
    pub amount: Decimal,
    /// Fee the provider charges for the dispute.
    pub fee: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Deadline for merchant evidence.
    pub evidence_due_by: Option<DateTime<Utc>>,
    /// Whether evidence was submitted.
    pub evidence_submitted: bool,
    /// When evidence was first submitted.
    pub evidence_submitted_at: Option<DateTime<Utc>>,
    /// Whether the disputed amount sits in the dispute reserve.
    pub funds_frozen: bool,
    /// When funds were first frozen.
    pub funds_frozen_at: Option<DateTime<Utc>>,
    /// When frozen funds left the reserve.
    pub funds_released_at: Option<DateTime<Utc>>,
    /// Whether admins were alerted.
    pub admin_notified: bool,
    /// When admins were first alerted.
    pub admin_notified_at: Option<DateTime<Utc>>,
    /// Whether the provider was answered.
    pub provider_notified: bool,
    /// When the provider was first answered.
    pub provider_notified_at: Option<DateTime<Utc>>,
    /// Outcome notes.
    pub resolution_notes: Option<String>,
    /// Notes for staff.
    pub internal_notes: Option<String>,
    /// When the dispute arrived.
    pub received_at: DateTime<Utc>,
    /// When the dispute was first resolved.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Last modification.
    pub updated_at: DateTime<Utc>,
    /// Bumped by every stored update.
    pub version: i64,
}

impl Dispute {
    /// Sets the status.
    ///
    /// Entering WON, LOST or ACCEPTED stamps `resolved_at` unless it is
    /// already set.
    #[must_use]
    pub fn with_status(mut self, status: DisputeStatus, at: DateTime<Utc>) -> Self {
        if status.is_resolution() && self.resolved_at.is_none() {
            self.resolved_at = Some(at);
        }
        self.status = status;
        self.updated_at = at;
        self
    }

    /// Sets the frozen flag.
    ///
    /// false -> true stamps `funds_frozen_at` the first time only;
    /// true -> false stamps `funds_released_at`. Setting the current value
    /// changes nothing.
    #[must_use]
    pub fn with_funds_frozen(mut self, frozen: bool, at: DateTime<Utc>) -> Self {
        match (self.funds_frozen, frozen) {
            (false, true) => {
                if self.funds_frozen_at.is_none() {
                    self.funds_frozen_at = Some(at);
                }
            }
            (true, false) => self.funds_released_at = Some(at),
            _ => return self,
        }
        self.funds_frozen = frozen;
        self.updated_at = at;
        self
    }

    /// Records evidence submission and moves to EVIDENCE_SUBMITTED.
    ///
    /// `evidence_submitted_at` keeps the first submission time.
    #[must_use]
    pub fn with_evidence_submitted(mut self, at: DateTime<Utc>) -> Self {
        self.evidence_submitted = true;
        self.evidence_submitted_at.get_or_insert(at);
        self.status = DisputeStatus::EvidenceSubmitted;
        self.updated_at = at;
        self
    }

    /// Records that admins were alerted; the first timestamp wins.
    #[must_use]
    pub fn with_admin_notified(mut self, at: DateTime<Utc>) -> Self {
        self.admin_notified = true;
        self.admin_notified_at.get_or_insert(at);
        self
    }

    /// Records that the provider was answered; the first timestamp wins.
    #[must_use]
    pub fn with_provider_notified(mut self, at: DateTime<Utc>) -> Self {
        self.provider_notified = true;
        self.provider_notified_at.get_or_insert(at);
        self
    }

    /// Never frozen and not yet decided; a repeated created event for it
    /// should still freeze the funds.
    #[must_use]
    pub fn awaits_freeze(&self) -> bool {
        !self.funds_frozen && self.funds_released_at.is_none() && !self.status.is_terminal()
    }

    /// Awaiting evidence past its deadline.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == DisputeStatus::EvidenceRequired
            && self.evidence_due_by.is_some_and(|due| due < now)
    }
}
