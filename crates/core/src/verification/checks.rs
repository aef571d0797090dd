//! Integrity checks over a full set of ledger entries.
//!
//! These are pure functions; [`super::LedgerVerificationService`] feeds them
//! from the store and turns their findings into alerts.

use std::collections::{BTreeMap, BTreeSet};

use ledgerkeep_shared::types::PostingId;
use rust_decimal::Decimal;

use crate::ledger::{
    AccountType, BalanceSnapshot, EntryType, LedgerEntry, MaintainedBalance,
    recompute_normal_balances,
};

/// A posting whose debits and credits differ in one currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnbalancedGroup {
    /// Posting correlation key.
    pub posting_id: PostingId,
    /// Currency code.
    pub currency: String,
    /// Total debits.
    pub debit_total: Decimal,
    /// Total credits.
    pub credit_total: Decimal,
}

/// Compares balances recomputed from raw entries with the two maintained
/// paths: the store's `balance_of` figures and its running balances.
///
/// Tolerance is zero. Returns one line per divergence.
#[must_use]
pub fn balance_divergences(
    entries: &[LedgerEntry],
    recomputed: &BalanceSnapshot,
    reported: &BalanceSnapshot,
    maintained: &[MaintainedBalance],
) -> Vec<String> {
    let mut issues = Vec::new();

    for account in AccountType::ALL {
        let expected = recomputed.get(&account).copied().unwrap_or_default();
        let actual = reported.get(&account).copied().unwrap_or_default();
        if expected != actual {
            issues.push(format!(
                "{account}: recomputed {expected}, store reports {actual} (delta {})",
                actual - expected
            ));
        }
    }

    let mut normal = recompute_normal_balances(entries);
    for running in maintained {
        let key = (running.account_type, running.currency.clone());
        let expected = normal.remove(&key).unwrap_or_default();
        let actual = running.balance.current_balance;
        if expected != actual {
            issues.push(format!(
                "{} {}: recomputed {expected}, running balance {actual} (delta {})",
                running.account_type,
                running.currency,
                actual - expected
            ));
        }
    }
    for ((account, currency), expected) in normal {
        if !expected.is_zero() {
            issues.push(format!(
                "{account} {currency}: recomputed {expected}, no running balance"
            ));
        }
    }

    issues
}

/// Finds entries without a counter-entry.
///
/// Within each (posting, currency) group, debits and credits of equal
/// amount are paired one to one. Leftovers are orphaned unless both sides
/// have leftovers with equal totals, which is how split postings such as a
/// payment capture with fee lines look.
#[must_use]
pub fn orphaned_entries(entries: &[LedgerEntry]) -> Vec<&LedgerEntry> {
    let mut groups: BTreeMap<(PostingId, &str), Vec<&LedgerEntry>> = BTreeMap::new();
    for entry in entries {
        groups
            .entry((entry.posting_id, entry.currency.as_str()))
            .or_default()
            .push(entry);
    }

    let mut orphans = Vec::new();
    for group in groups.into_values() {
        let mut paired = vec![false; group.len()];
        for i in 0..group.len() {
            if paired[i] {
                continue;
            }
            let partner = (i + 1..group.len())
                .find(|&j| !paired[j] && group[j].is_counter_entry_of(group[i]));
            if let Some(j) = partner {
                paired[i] = true;
                paired[j] = true;
            }
        }

        let leftovers: Vec<&LedgerEntry> = group
            .iter()
            .zip(&paired)
            .filter(|(_, p)| !**p)
            .map(|(e, _)| *e)
            .collect();
        let total = |side: EntryType| -> Decimal {
            leftovers
                .iter()
                .filter(|e| e.entry_type == side)
                .map(|e| e.amount)
                .sum()
        };
        let debits = total(EntryType::Debit);
        let credits = total(EntryType::Credit);
        let balanced_split = !debits.is_zero() && !credits.is_zero() && debits == credits;
        if !balanced_split {
            orphans.extend(leftovers);
        }
    }

    orphans
}

/// Finds postings whose debits and credits differ, per currency.
#[must_use]
pub fn unbalanced_groups(entries: &[LedgerEntry]) -> Vec<UnbalancedGroup> {
    let mut totals: BTreeMap<(PostingId, &str), (Decimal, Decimal)> = BTreeMap::new();
    for entry in entries {
        let slot = totals
            .entry((entry.posting_id, entry.currency.as_str()))
            .or_default();
        match entry.entry_type {
            EntryType::Debit => slot.0 += entry.amount,
            EntryType::Credit => slot.1 += entry.amount,
        }
    }

    totals
        .into_iter()
        .filter(|(_, (debit, credit))| debit != credit)
        .map(|((posting_id, currency), (debit_total, credit_total))| UnbalancedGroup {
            posting_id,
            currency: currency.to_string(),
            debit_total,
            credit_total,
        })
        .collect()
}

/// Number of distinct postings in a set of entries.
#[must_use]
pub fn posting_count(entries: &[LedgerEntry]) -> usize {
    entries.iter().map(|e| e.posting_id).collect::<BTreeSet<_>>().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use ledgerkeep_shared::types::LedgerEntryId;
    use rust_decimal_macros::dec;

    fn entry(
        posting_id: PostingId,
        account_type: AccountType,
        entry_type: EntryType,
        amount: Decimal,
    ) -> LedgerEntry {
        let now = Utc::now();
        LedgerEntry {
            id: LedgerEntryId::new(),
            posting_id,
            transaction_id: Some("T1".into()),
            order_id: None,
            account_type,
            entry_type,
            amount,
            currency: "USD".into(),
            description: "test".into(),
            reference: None,
            metadata: None,
            verified: false,
            verified_by: None,
            verified_at: None,
            effective_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            account_version: 1,
            previous_balance: Decimal::ZERO,
            current_balance: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_pair_is_not_orphaned() {
        let p = PostingId::new();
        let entries = vec![
            entry(p, AccountType::DisputeReserve, EntryType::Debit, dec!(100)),
            entry(p, AccountType::Cash, EntryType::Credit, dec!(100)),
        ];
        assert!(orphaned_entries(&entries).is_empty());
        assert!(unbalanced_groups(&entries).is_empty());
    }

    #[test]
    fn test_balanced_split_is_not_orphaned() {
        let p = PostingId::new();
        let entries = vec![
            entry(p, AccountType::Cash, EntryType::Debit, dec!(97)),
            entry(p, AccountType::ProcessingFees, EntryType::Debit, dec!(3)),
            entry(p, AccountType::PlatformCommission, EntryType::Credit, dec!(10)),
            entry(p, AccountType::VendorPayable, EntryType::Credit, dec!(90)),
        ];
        assert!(orphaned_entries(&entries).is_empty());
    }

    #[test]
    fn test_lone_entry_is_orphaned() {
        let p = PostingId::new();
        let entries = vec![
            entry(p, AccountType::Cash, EntryType::Debit, dec!(100)),
            entry(p, AccountType::VendorPayable, EntryType::Credit, dec!(100)),
            entry(p, AccountType::Cash, EntryType::Debit, dec!(5)),
        ];
        let orphans = orphaned_entries(&entries);
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].amount, dec!(5));

        let unbalanced = unbalanced_groups(&entries);
        assert_eq!(unbalanced.len(), 1);
        assert_eq!(unbalanced[0].debit_total, dec!(105));
        assert_eq!(unbalanced[0].credit_total, dec!(100));
    }

    #[test]
    fn test_same_side_pair_is_orphaned() {
        let p = PostingId::new();
        let entries = vec![
            entry(p, AccountType::Cash, EntryType::Debit, dec!(40)),
            entry(p, AccountType::ProcessingFees, EntryType::Debit, dec!(40)),
        ];
        assert_eq!(orphaned_entries(&entries).len(), 2);
    }

    #[test]
    fn test_postings_do_not_cross_match() {
        let entries = vec![
            entry(PostingId::new(), AccountType::Cash, EntryType::Debit, dec!(10)),
            entry(PostingId::new(), AccountType::VendorPayable, EntryType::Credit, dec!(10)),
        ];
        assert_eq!(orphaned_entries(&entries).len(), 2);
        assert_eq!(posting_count(&entries), 2);
    }

    #[test]
    fn test_balance_divergence_reported_with_delta() {
        let p = PostingId::new();
        let entries = vec![
            entry(p, AccountType::Cash, EntryType::Debit, dec!(100)),
            entry(p, AccountType::VendorPayable, EntryType::Credit, dec!(100)),
        ];
        let recomputed: BalanceSnapshot = [
            (AccountType::Cash, dec!(100)),
            (AccountType::VendorPayable, dec!(-100)),
        ]
        .into_iter()
        .collect();
        let mut reported = recomputed.clone();
        reported.insert(AccountType::Cash, dec!(90));

        let issues = balance_divergences(&entries, &recomputed, &reported, &[]);

        assert!(issues.iter().any(|i| i.starts_with("CASH") && i.contains("delta -10")));
        // Neither account has a running balance.
        assert_eq!(issues.len(), 3);
    }
}
