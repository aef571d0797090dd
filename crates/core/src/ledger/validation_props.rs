//! Property-based tests for posting validation and store atomicity.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::account::AccountType;
use super::entry::{EntryType, LedgerEntryDraft};
use super::error::LedgerError;
use super::memory::InMemoryLedgerStore;
use super::store::LedgerStore;
use super::validation::validate_posting;

/// Strategy to generate a valid positive amount with four decimal places.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

/// Strategy to generate a non-positive amount.
fn non_positive_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(-cents, 2))
}

fn account_strategy() -> impl Strategy<Value = AccountType> {
    prop::sample::select(AccountType::ALL.to_vec())
}

fn currency_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["USD", "BDT", "EUR"])
}

fn make_draft(
    account: AccountType,
    entry_type: EntryType,
    amount: Decimal,
    currency: &str,
) -> LedgerEntryDraft {
    LedgerEntryDraft::new(
        account,
        entry_type,
        amount,
        currency,
        "prop",
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default(),
    )
}

/// Splits `total` into a debit line and several credit lines that sum to it.
fn balanced_group() -> impl Strategy<Value = Vec<LedgerEntryDraft>> {
    (
        account_strategy(),
        currency_strategy(),
        prop::collection::vec((account_strategy(), positive_amount()), 1..5),
    )
        .prop_map(|(debit_account, currency, credits)| {
            let total: Decimal = credits.iter().map(|(_, amount)| *amount).sum();
            let mut drafts = vec![make_draft(debit_account, EntryType::Debit, total, currency)];
            drafts.extend(
                credits
                    .into_iter()
                    .map(|(account, amount)| make_draft(account, EntryType::Credit, amount, currency)),
            );
            drafts
        })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap_or_else(|e| panic!("runtime: {e}"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* balanced group, validation SHALL accept it and the
    /// per-currency signed sum SHALL be zero.
    #[test]
    fn prop_balanced_groups_accepted(drafts in balanced_group()) {
        let totals = validate_posting(&drafts);
        prop_assert!(totals.is_ok());
        let signed: Decimal = drafts.iter().map(LedgerEntryDraft::signed_amount).sum();
        prop_assert_eq!(signed, Decimal::ZERO);
    }

    /// *For any* balanced group with one amount nudged, validation SHALL
    /// reject it as unbalanced.
    #[test]
    fn prop_nudged_groups_rejected(
        mut drafts in balanced_group(),
        nudge in positive_amount(),
    ) {
        drafts[0].amount += nudge;
        prop_assert!(
            matches!(
                validate_posting(&drafts),
                Err(LedgerError::UnbalancedPosting { .. })
            ),
            "nudged group accepted"
        );
    }

    /// *For any* group containing a non-positive amount, validation SHALL
    /// reject it.
    #[test]
    fn prop_non_positive_rejected(
        mut drafts in balanced_group(),
        bad in non_positive_amount(),
    ) {
        let last = drafts.len() - 1;
        drafts[last].amount = bad;
        prop_assert!(matches!(
            validate_posting(&drafts),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    /// *For any* sequence of balanced and unbalanced postings, the store
    /// SHALL contain exactly the entries of the accepted ones, and the
    /// signed balances across all accounts SHALL sum to zero.
    #[test]
    fn prop_store_only_commits_balanced(
        groups in prop::collection::vec((balanced_group(), any::<bool>()), 1..10),
    ) {
        let rt = runtime();
        let store = InMemoryLedgerStore::new();
        let mut expected = 0usize;

        for (mut drafts, corrupt) in groups {
            if corrupt {
                drafts[0].amount += Decimal::ONE;
            } else {
                expected += drafts.len();
            }
            let result = rt.block_on(store.post(drafts));
            prop_assert_eq!(result.is_ok(), !corrupt);
        }

        prop_assert_eq!(rt.block_on(store.len()), expected);

        let mut total = Decimal::ZERO;
        for account in AccountType::ALL {
            total += rt.block_on(store.balance_of(account)).unwrap_or_default();
        }
        prop_assert_eq!(total, Decimal::ZERO);
    }
}
