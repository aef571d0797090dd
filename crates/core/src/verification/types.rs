//! Verification report types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::BalanceSnapshot;

/// The independent checks of the nightly sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationCheck {
    /// Recomputed balances against store and running balances.
    AccountBalances,
    /// Entries without a counter-entry.
    OrphanedEntries,
    /// Postings whose debits and credits differ.
    TransactionIntegrity,
}

impl VerificationCheck {
    /// Every check, in run order.
    pub const ALL: [Self; 3] = [
        Self::AccountBalances,
        Self::OrphanedEntries,
        Self::TransactionIntegrity,
    ];

    /// Short name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccountBalances => "account_balances",
            Self::OrphanedEntries => "orphaned_entries",
            Self::TransactionIntegrity => "transaction_integrity",
        }
    }

    /// Alert title used when the check fails.
    #[must_use]
    pub const fn failure_title(self) -> &'static str {
        match self {
            Self::AccountBalances => "Balance Verification Failed",
            Self::OrphanedEntries => "Orphaned Entries Found",
            Self::TransactionIntegrity => "Transaction Integrity Issues",
        }
    }
}

impl fmt::Display for VerificationCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Which check ran.
    pub check: VerificationCheck,
    /// True when no issues were found.
    pub passed: bool,
    /// One line per finding.
    pub issues: Vec<String>,
}

impl CheckResult {
    /// Builds a result; it passes when `issues` is empty.
    #[must_use]
    pub fn from_issues(check: VerificationCheck, issues: Vec<String>) -> Self {
        Self {
            check,
            passed: issues.is_empty(),
            issues,
        }
    }
}

/// Outcome of a full nightly run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Results in run order.
    pub checks: Vec<CheckResult>,
    /// Signed balance per account type.
    pub balances: BalanceSnapshot,
    /// Entries examined.
    pub entries_checked: usize,
    /// Entries newly stamped as verified.
    pub entries_verified: u64,
    /// Run start.
    pub started_at: DateTime<Utc>,
    /// Run end.
    pub completed_at: DateTime<Utc>,
}

impl VerificationReport {
    /// True when every check passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Results of failed checks.
    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }
}
