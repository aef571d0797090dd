//! Account balance calculations.
//!
//! Two independent paths compute balances: recomputation from raw entries
//! ([`recompute_balances`]) and the running balance each entry carries
//! ([`RunningBalance`]). The nightly sweep compares them.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::AccountType;
use super::entry::{EntryType, LedgerEntry};

/// Key of a running balance: account type and currency.
pub type BalanceKey = (AccountType, String);

/// Signed (debit-positive) balance per account type.
pub type BalanceSnapshot = BTreeMap<AccountType, Decimal>;

/// Debit/credit totals of one account type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
}

impl AccountBalance {
    /// Adds one entry.
    pub fn add(&mut self, entry_type: EntryType, amount: Decimal) {
        match entry_type {
            EntryType::Debit => self.debit_total += amount,
            EntryType::Credit => self.credit_total += amount,
        }
    }

    /// Debits minus credits.
    #[must_use]
    pub fn signed(&self) -> Decimal {
        self.debit_total - self.credit_total
    }
}

/// Running balance information for a ledger entry.
///
/// - `account_version`: monotonically increasing per (account, currency)
/// - `previous_balance`: normal balance before this entry
/// - `current_balance`: normal balance after this entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Account version (monotonically increasing).
    pub account_version: i64,
    /// Balance before this entry.
    pub previous_balance: Decimal,
    /// Balance after this entry.
    pub current_balance: Decimal,
}

impl RunningBalance {
    /// Creates a new running balance for the first entry on an account.
    #[must_use]
    pub fn first_entry(balance_change: Decimal) -> Self {
        Self {
            account_version: 1,
            previous_balance: Decimal::ZERO,
            current_balance: balance_change,
        }
    }

    /// Creates a new running balance based on the previous entry.
    ///
    /// - current_balance[N] = previous_balance[N] + balance_change
    /// - previous_balance[N] = current_balance[N-1]
    #[must_use]
    pub fn next_entry(previous: &Self, balance_change: Decimal) -> Self {
        Self {
            account_version: previous.account_version + 1,
            previous_balance: previous.current_balance,
            current_balance: previous.current_balance + balance_change,
        }
    }

    /// Advances from an optional previous balance.
    #[must_use]
    pub fn advance(previous: Option<&Self>, balance_change: Decimal) -> Self {
        previous.map_or_else(
            || Self::first_entry(balance_change),
            |p| Self::next_entry(p, balance_change),
        )
    }
}

/// Running balance as maintained by a store, with its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintainedBalance {
    /// Account type.
    pub account_type: AccountType,
    /// Currency code.
    pub currency: String,
    /// Latest running balance.
    pub balance: RunningBalance,
}

/// Recomputes per-account totals from raw entries.
#[must_use]
pub fn recompute_balances<'a>(
    entries: impl IntoIterator<Item = &'a LedgerEntry>,
) -> BTreeMap<AccountType, AccountBalance> {
    let mut balances: BTreeMap<AccountType, AccountBalance> = BTreeMap::new();
    for entry in entries {
        balances
            .entry(entry.account_type)
            .or_default()
            .add(entry.entry_type, entry.amount);
    }
    balances
}

/// Recomputes normal balances per (account, currency) from raw entries.
#[must_use]
pub fn recompute_normal_balances<'a>(
    entries: impl IntoIterator<Item = &'a LedgerEntry>,
) -> BTreeMap<BalanceKey, Decimal> {
    let mut balances: BTreeMap<BalanceKey, Decimal> = BTreeMap::new();
    for entry in entries {
        *balances
            .entry((entry.account_type, entry.currency.clone()))
            .or_default() += entry.account_type.balance_change(entry.entry_type, entry.amount);
    }
    balances
}

/// Builds a signed balance snapshot covering every account type.
#[must_use]
pub fn snapshot_from(balances: &BTreeMap<AccountType, AccountBalance>) -> BalanceSnapshot {
    AccountType::ALL
        .into_iter()
        .map(|account| {
            let signed = balances.get(&account).map_or(Decimal::ZERO, AccountBalance::signed);
            (account, signed)
        })
        .collect()
}
