//! Nightly ledger verification.

use std::sync::Arc;

use chrono::Utc;
use ledgerkeep_shared::types::LedgerEntryId;
use tracing::{error, info, instrument, warn};

use super::checks::{balance_divergences, orphaned_entries, posting_count, unbalanced_groups};
use super::types::{CheckResult, VerificationCheck, VerificationReport};
use crate::ledger::{
    BalanceSnapshot, LedgerEntry, LedgerError, LedgerSnapshot, LedgerStore, recompute_balances,
    snapshot_from,
};
use crate::notify::{
    LedgerVerificationAlert, NewTicket, NotificationSink, TicketCategory, TicketPriority,
    TicketSink,
};

/// Identity stamped on entries verified by the nightly sweep.
pub const NIGHTLY_VERIFIER: &str = "nightly-verification";

/// Title of the summary alert sent after every run.
pub const SUMMARY_TITLE: &str = "Nightly Verification Completed";

/// Runs the integrity checks over the whole ledger.
///
/// A failed check is alerted and ticketed, and never stops the others.
pub struct LedgerVerificationService {
    ledger: Arc<dyn LedgerStore>,
    notifier: Arc<dyn NotificationSink>,
    tickets: Arc<dyn TicketSink>,
}

impl LedgerVerificationService {
    /// Creates a service over its collaborators.
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        notifier: Arc<dyn NotificationSink>,
        tickets: Arc<dyn TicketSink>,
    ) -> Self {
        Self {
            ledger,
            notifier,
            tickets,
        }
    }

    /// Runs every check, alerts on failures, and always finishes with the
    /// summary alert. Entries are stamped verified only when all checks pass.
    ///
    /// Every check reads the same ledger snapshot, so postings written
    /// during the run are left for the next one. Fails only when the ledger
    /// cannot be read at all.
    #[instrument(skip(self))]
    pub async fn run_nightly_verification(&self) -> Result<VerificationReport, LedgerError> {
        let started_at = Utc::now();
        let snapshot = self.ledger.snapshot().await?;
        let entries = &snapshot.entries;
        info!(
            entries = entries.len(),
            postings = posting_count(entries),
            "Nightly verification started"
        );

        let balances = snapshot_from(&recompute_balances(entries));
        let checks = vec![
            Self::balance_check(&snapshot, &balances),
            Self::orphan_check(entries),
            Self::integrity_check(entries),
        ];

        for result in checks.iter().filter(|c| !c.passed) {
            warn!(check = %result.check, issues = result.issues.len(), "Verification check failed");
            self.alert(LedgerVerificationAlert {
                title: result.check.failure_title().to_string(),
                passed: false,
                details: result.issues.clone(),
                balances: None,
            })
            .await;
            self.open_ticket(result).await;
        }

        let all_passed = checks.iter().all(|c| c.passed);
        let entries_verified = if all_passed {
            self.stamp_verified(entries).await
        } else {
            0
        };

        let report = VerificationReport {
            checks,
            balances,
            entries_checked: entries.len(),
            entries_verified,
            started_at,
            completed_at: Utc::now(),
        };

        self.alert(LedgerVerificationAlert {
            title: SUMMARY_TITLE.to_string(),
            passed: all_passed,
            details: report
                .checks
                .iter()
                .map(|c| {
                    let outcome = if c.passed { "passed" } else { "FAILED" };
                    format!("{}: {outcome} ({} issues)", c.check, c.issues.len())
                })
                .collect(),
            balances: Some(report.balances.clone()),
        })
        .await;

        info!(
            passed = all_passed,
            entries_verified,
            "Nightly verification completed"
        );
        Ok(report)
    }

    /// Balance check on its own, without alerts.
    pub async fn verify_account_balances(&self) -> Result<CheckResult, LedgerError> {
        let snapshot = self.ledger.snapshot().await?;
        let balances = snapshot_from(&recompute_balances(&snapshot.entries));
        Ok(Self::balance_check(&snapshot, &balances))
    }

    /// Orphan check on its own, without alerts.
    pub async fn check_orphaned_entries(&self) -> Result<CheckResult, LedgerError> {
        let entries = self.ledger.all_entries().await?;
        Ok(Self::orphan_check(&entries))
    }

    /// Integrity check on its own, without alerts.
    pub async fn check_transaction_integrity(&self) -> Result<CheckResult, LedgerError> {
        let entries = self.ledger.all_entries().await?;
        Ok(Self::integrity_check(&entries))
    }

    fn balance_check(snapshot: &LedgerSnapshot, recomputed: &BalanceSnapshot) -> CheckResult {
        CheckResult::from_issues(
            VerificationCheck::AccountBalances,
            balance_divergences(
                &snapshot.entries,
                recomputed,
                &snapshot.reported,
                &snapshot.maintained,
            ),
        )
    }

    fn orphan_check(entries: &[LedgerEntry]) -> CheckResult {
        let issues = orphaned_entries(entries)
            .into_iter()
            .map(|e| {
                format!(
                    "entry {} in posting {}: {} {} {} {} without counter-entry",
                    e.id,
                    e.posting_id,
                    e.account_type,
                    e.entry_type.as_str(),
                    e.amount,
                    e.currency
                )
            })
            .collect();
        CheckResult::from_issues(VerificationCheck::OrphanedEntries, issues)
    }

    fn integrity_check(entries: &[LedgerEntry]) -> CheckResult {
        let issues = unbalanced_groups(entries)
            .into_iter()
            .map(|g| {
                format!(
                    "posting {} {}: debits {} != credits {}",
                    g.posting_id, g.currency, g.debit_total, g.credit_total
                )
            })
            .collect();
        CheckResult::from_issues(VerificationCheck::TransactionIntegrity, issues)
    }

    async fn stamp_verified(&self, entries: &[LedgerEntry]) -> u64 {
        let ids: Vec<LedgerEntryId> = entries.iter().filter(|e| !e.verified).map(|e| e.id).collect();
        if ids.is_empty() {
            return 0;
        }
        match self.ledger.mark_verified(&ids, NIGHTLY_VERIFIER, Utc::now()).await {
            Ok(count) => count,
            Err(e) => {
                error!(error = %e, "Could not mark entries verified");
                0
            }
        }
    }

    async fn alert(&self, alert: LedgerVerificationAlert) {
        if let Err(e) = self.notifier.send_ledger_verification_alert(&alert).await {
            warn!(title = %alert.title, error = %e, "Verification alert not delivered");
        }
    }

    async fn open_ticket(&self, result: &CheckResult) {
        let ticket = NewTicket {
            subject: result.check.failure_title().to_string(),
            description: result.issues.join("\n"),
            priority: TicketPriority::Urgent,
            category: TicketCategory::LedgerIntegrity,
        };
        if let Err(e) = self.tickets.create_ticket(ticket).await {
            warn!(check = %result.check, error = %e, "Could not open verification ticket");
        }
    }
}
