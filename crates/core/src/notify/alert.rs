//! Alert payloads and their plain-text rendering.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::dispute::Dispute;
use crate::ledger::BalanceSnapshot;
use crate::reconciliation::ReconciliationJob;

/// Which dispute event produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeAlertKind {
    /// New dispute received.
    Created,
    /// Status changed.
    Updated,
    /// Dispute decided.
    Closed,
}

impl DisputeAlertKind {
    /// Returns the uppercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Updated => "UPDATED",
            Self::Closed => "CLOSED",
        }
    }
}

/// Dispute lifecycle alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisputeAlert {
    /// Event kind.
    pub kind: DisputeAlertKind,
    /// Dispute after the event was applied.
    pub dispute: Dispute,
}

impl DisputeAlert {
    /// Creates an alert for a dispute.
    #[must_use]
    pub fn new(kind: DisputeAlertKind, dispute: &Dispute) -> Self {
        Self {
            kind,
            dispute: dispute.clone(),
        }
    }

    /// Email subject line.
    #[must_use]
    pub fn subject(&self) -> String {
        format!(
            "[Dispute {}] {} {} {} {}",
            self.kind.as_str(),
            self.dispute.provider,
            self.dispute.provider_dispute_id,
            self.dispute.amount,
            self.dispute.currency
        )
    }

    /// Email body.
    #[must_use]
    pub fn body(&self) -> String {
        let d = &self.dispute;
        let mut body = String::new();
        let _ = writeln!(body, "Dispute: {} ({})", d.provider_dispute_id, d.provider);
        let _ = writeln!(body, "Transaction: {}", d.transaction_id);
        let _ = writeln!(body, "Status: {}", d.status);
        let _ = writeln!(body, "Reason: {}", d.reason.as_str());
        let _ = writeln!(body, "Amount: {} {}", d.amount, d.currency);
        let _ = writeln!(body, "Funds frozen: {}", d.funds_frozen);
        if let Some(due) = d.evidence_due_by {
            let _ = writeln!(body, "Evidence due by: {due}");
        }
        if let Some(resolved) = d.resolved_at {
            let _ = writeln!(body, "Resolved at: {resolved}");
        }
        body
    }
}

/// Summary of one reconciliation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationAlert {
    /// Job after it reached a terminal status.
    pub job: ReconciliationJob,
}

impl ReconciliationAlert {
    /// Creates an alert for a job.
    #[must_use]
    pub fn new(job: &ReconciliationJob) -> Self {
        Self { job: job.clone() }
    }

    /// Email subject line.
    #[must_use]
    pub fn subject(&self) -> String {
        format!(
            "[Reconciliation] {} {}: {} discrepancies",
            self.job.job_id, self.job.status, self.job.discrepancy_count
        )
    }

    /// Email body.
    #[must_use]
    pub fn body(&self) -> String {
        let j = &self.job;
        let mut body = String::new();
        let _ = writeln!(body, "Job: {}", j.job_id);
        let _ = writeln!(body, "Provider: {}", j.provider);
        let _ = writeln!(body, "Period: {} to {}", j.start_date, j.end_date);
        let _ = writeln!(body, "Status: {}", j.status);
        let _ = writeln!(body, "Provider transactions: {}", j.provider_transaction_count);
        let _ = writeln!(body, "Internal transactions: {}", j.internal_transaction_count);
        let _ = writeln!(body, "Matched: {}", j.matched_count);
        let _ = writeln!(body, "Discrepancies: {}", j.discrepancy_count);
        let _ = writeln!(body, "Provider total: {}", j.provider_total);
        let _ = writeln!(body, "Internal total: {}", j.internal_total);
        let _ = writeln!(body, "Difference: {}", j.total_difference);
        if let Some(error) = &j.error_message {
            let _ = writeln!(body, "Error: {error}");
        }
        body
    }
}

/// Result of one verification check, or the nightly summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerVerificationAlert {
    /// Headline, e.g. "Orphaned Entries Found".
    pub title: String,
    /// Whether everything reported passed.
    pub passed: bool,
    /// One line per finding.
    pub details: Vec<String>,
    /// Signed balance per account type, on the summary alert.
    pub balances: Option<BalanceSnapshot>,
}

impl LedgerVerificationAlert {
    /// Email subject line.
    #[must_use]
    pub fn subject(&self) -> String {
        format!("[Ledger Verification] {}", self.title)
    }

    /// Email body.
    #[must_use]
    pub fn body(&self) -> String {
        let mut body = String::new();
        let _ = writeln!(body, "{}", self.title);
        let _ = writeln!(body, "Passed: {}", self.passed);
        for detail in &self.details {
            let _ = writeln!(body, "- {detail}");
        }
        if let Some(balances) = &self.balances {
            let _ = writeln!(body, "\nBalances:");
            for (account, balance) in balances {
                let _ = writeln!(body, "  {account}: {balance}");
            }
        }
        body
    }
}
