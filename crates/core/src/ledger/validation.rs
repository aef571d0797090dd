//! Business rule validation for ledger postings.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::entry::{EntryType, LedgerEntryDraft};
use super::error::LedgerError;

/// Debit and credit totals for one currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CurrencyTotals {
    /// Total debit amount.
    pub debit: Decimal,
    /// Total credit amount.
    pub credit: Decimal,
}

impl CurrencyTotals {
    /// Adds one entry's amount to the matching side.
    pub fn add(&mut self, entry_type: EntryType, amount: Decimal) {
        match entry_type {
            EntryType::Debit => self.debit += amount,
            EntryType::Credit => self.credit += amount,
        }
    }

    /// Returns true if debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.debit == self.credit
    }

    /// Debits minus credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// Validates that a set of drafts may be posted as one unit.
///
/// Rules, checked in order:
/// 1. At least one draft.
/// 2. Every amount strictly positive.
/// 3. Every currency a three-letter code.
/// 4. Signed amounts sum to zero within each currency.
///
/// # Errors
///
/// Returns the first rule violated.
pub fn validate_posting(
    drafts: &[LedgerEntryDraft],
) -> Result<BTreeMap<String, CurrencyTotals>, LedgerError> {
    if drafts.is_empty() {
        return Err(LedgerError::EmptyPosting);
    }

    let mut totals: BTreeMap<String, CurrencyTotals> = BTreeMap::new();

    for draft in drafts {
        if draft.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(draft.amount));
        }
        if draft.currency.len() != 3 || !draft.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(LedgerError::InvalidCurrency(draft.currency.clone()));
        }

        totals
            .entry(draft.currency.to_uppercase())
            .or_default()
            .add(draft.entry_type, draft.amount);
    }

    if let Some((currency, unbalanced)) = totals.iter().find(|(_, t)| !t.is_balanced()) {
        return Err(LedgerError::UnbalancedPosting {
            currency: currency.clone(),
            debit: unbalanced.debit,
            credit: unbalanced.credit,
        });
    }

    Ok(totals)
}
