//! Pure comparison of a provider feed against internal records.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use ledgerkeep_shared::types::round_to_currency;
use rust_decimal::Decimal;

use super::severity::determine_severity;
use super::types::{Discrepancy, DiscrepancyType};
use crate::payment::{PaymentProvider, ProviderTransaction, Transaction, normalize_status};

/// Dates further apart than this many days are a mismatch.
const DATE_TOLERANCE_DAYS: i64 = 1;

/// Output of [`compare_feeds`].
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// Discrepancies found, provider-side first, then repeated internal
    /// records, then internal records the provider never reported.
    pub discrepancies: Vec<Discrepancy>,
    /// Shared IDs matched with no discrepancy.
    pub clean_matches: Vec<String>,
    /// Sum of provider amounts.
    pub provider_total: Decimal,
    /// Sum of internal amounts.
    pub internal_total: Decimal,
}

impl MatchOutcome {
    /// Number of MISSING_PROVIDER discrepancies.
    #[must_use]
    pub fn missing_provider_count(&self) -> usize {
        self.discrepancies
            .iter()
            .filter(|d| d.discrepancy_type == DiscrepancyType::MissingProvider)
            .count()
    }
}

/// Compares provider lines with internal transactions of the same window.
#[must_use]
pub fn compare_feeds(
    job_id: &str,
    provider: PaymentProvider,
    provider_txns: &[ProviderTransaction],
    internal_txns: &[Transaction],
    now: DateTime<Utc>,
) -> MatchOutcome {
    let mut internal_by_id: HashMap<&str, &Transaction> = HashMap::new();
    let mut internal_repeats: Vec<&Transaction> = Vec::new();
    for txn in internal_txns {
        match internal_by_id.entry(txn.transaction_id.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(txn);
            }
            Entry::Occupied(_) => internal_repeats.push(txn),
        }
    }

    let mut outcome = MatchOutcome {
        provider_total: provider_txns.iter().map(|p| p.amount).sum(),
        internal_total: internal_txns.iter().map(|t| t.amount).sum(),
        ..MatchOutcome::default()
    };
    let mut seen: HashSet<&str> = HashSet::new();

    for line in provider_txns {
        let id = line.transaction_id.trim();

        if id.is_empty() || line.amount <= Decimal::ZERO {
            // Reported, even if unusable.
            if !id.is_empty() {
                seen.insert(id);
            }
            let mut d = provider_side(
                job_id,
                DiscrepancyType::InvalidTransaction,
                line,
                format!("Invalid provider transaction {id:?} with amount {}", line.amount),
                now,
            );
            d.severity = determine_severity(d.discrepancy_type, d.provider_amount, None);
            outcome.discrepancies.push(d);
            continue;
        }

        if !seen.insert(id) {
            let mut d = provider_side(
                job_id,
                DiscrepancyType::DuplicateTransaction,
                line,
                format!("Provider reported {id} more than once"),
                now,
            );
            d.severity = determine_severity(d.discrepancy_type, d.provider_amount, None);
            outcome.discrepancies.push(d);
            continue;
        }

        let Some(internal) = internal_by_id.get(id) else {
            let mut d = provider_side(
                job_id,
                DiscrepancyType::MissingInternal,
                line,
                format!("Provider transaction {id} has no internal record"),
                now,
            );
            d.amount_difference = Some(line.amount);
            d.severity = determine_severity(d.discrepancy_type, Some(line.amount), None);
            outcome.discrepancies.push(d);
            continue;
        };

        let found = compare_pair(job_id, provider, line, internal, now);
        if found.is_empty() {
            outcome.clean_matches.push(internal.transaction_id.clone());
        }
        outcome.discrepancies.extend(found);
    }

    for txn in internal_repeats {
        let mut d = internal_side(
            job_id,
            DiscrepancyType::DuplicateTransaction,
            txn,
            format!("Internal records hold {} more than once", txn.transaction_id),
            now,
        );
        d.severity = determine_severity(d.discrepancy_type, None, Some(txn.amount));
        outcome.discrepancies.push(d);
    }

    for txn in internal_txns {
        if !seen.insert(txn.transaction_id.as_str()) {
            continue;
        }
        let mut d = internal_side(
            job_id,
            DiscrepancyType::MissingProvider,
            txn,
            format!("Internal transaction {} not reported by {provider}", txn.transaction_id),
            now,
        );
        d.amount_difference = Some(txn.amount);
        d.severity = determine_severity(d.discrepancy_type, None, Some(txn.amount));
        outcome.discrepancies.push(d);
    }

    outcome
}

fn compare_pair(
    job_id: &str,
    provider: PaymentProvider,
    line: &ProviderTransaction,
    internal: &Transaction,
    now: DateTime<Utc>,
) -> Vec<Discrepancy> {
    let id = internal.transaction_id.as_str();
    let mut found = Vec::new();

    if line.currency.eq_ignore_ascii_case(&internal.currency) {
        let provider_amount = round_to_currency(line.amount, &internal.currency);
        let internal_amount = round_to_currency(internal.amount, &internal.currency);
        if provider_amount != internal_amount {
            let mut d = both_sides(
                job_id,
                DiscrepancyType::AmountMismatch,
                line,
                internal,
                format!("Amount differs for {id}: provider {provider_amount}, internal {internal_amount}"),
                now,
            );
            d.provider_amount = Some(provider_amount);
            d.internal_amount = Some(internal_amount);
            d.amount_difference = Some((provider_amount - internal_amount).abs());
            found.push(d);
        }
    } else {
        found.push(both_sides(
            job_id,
            DiscrepancyType::CurrencyMismatch,
            line,
            internal,
            format!(
                "Currency differs for {id}: provider {}, internal {}",
                line.currency, internal.currency
            ),
            now,
        ));
    }

    let expected = internal.status.settlement_view();
    if normalize_status(provider, &line.status) != Some(expected) {
        found.push(both_sides(
            job_id,
            DiscrepancyType::StatusMismatch,
            line,
            internal,
            format!(
                "Status differs for {id}: provider {:?}, internal {}",
                line.status, internal.status
            ),
            now,
        ));
    }

    let days_apart = (line.date() - internal.date()).num_days().abs();
    if days_apart > DATE_TOLERANCE_DAYS {
        found.push(both_sides(
            job_id,
            DiscrepancyType::DateMismatch,
            line,
            internal,
            format!("Dates for {id} are {days_apart} days apart"),
            now,
        ));
    }

    for d in &mut found {
        d.severity = determine_severity(d.discrepancy_type, d.provider_amount, d.internal_amount);
    }
    found
}

fn provider_side(
    job_id: &str,
    discrepancy_type: DiscrepancyType,
    line: &ProviderTransaction,
    description: String,
    now: DateTime<Utc>,
) -> Discrepancy {
    let mut d = Discrepancy::new(job_id, discrepancy_type, line.transaction_id.trim(), description, now);
    d.provider_transaction_id = Some(line.transaction_id.clone());
    d.provider_amount = Some(line.amount);
    d.provider_status = Some(line.status.clone());
    d.provider_date = Some(line.date());
    d.provider_payload = serde_json::to_value(line).ok();
    d
}

fn internal_side(
    job_id: &str,
    discrepancy_type: DiscrepancyType,
    txn: &Transaction,
    description: String,
    now: DateTime<Utc>,
) -> Discrepancy {
    let mut d = Discrepancy::new(job_id, discrepancy_type, txn.transaction_id.clone(), description, now);
    d.internal_transaction_id = Some(txn.transaction_id.clone());
    d.internal_amount = Some(txn.amount);
    d.internal_status = Some(txn.status.as_str().to_string());
    d.internal_date = Some(txn.date());
    d.internal_payload = serde_json::to_value(txn).ok();
    d
}

fn both_sides(
    job_id: &str,
    discrepancy_type: DiscrepancyType,
    line: &ProviderTransaction,
    txn: &Transaction,
    description: String,
    now: DateTime<Utc>,
) -> Discrepancy {
    let mut d = provider_side(job_id, discrepancy_type, line, description, now);
    d.internal_transaction_id = Some(txn.transaction_id.clone());
    d.internal_amount = Some(txn.amount);
    d.internal_status = Some(txn.status.as_str().to_string());
    d.internal_date = Some(txn.date());
    d.internal_payload = serde_json::to_value(txn).ok();
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::TransactionStatus;
    use crate::reconciliation::types::DiscrepancySeverity;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    fn line(id: &str, amount: Decimal, status: &str) -> ProviderTransaction {
        ProviderTransaction {
            transaction_id: id.to_string(),
            amount,
            currency: "USD".into(),
            status: status.into(),
            description: None,
            timestamp: at(),
            metadata: None,
        }
    }

    fn internal(id: &str, amount: Decimal) -> Transaction {
        Transaction::payment(id, PaymentProvider::Stripe, amount, "USD", at())
            .with_status(TransactionStatus::Success)
    }

    fn compare(lines: &[ProviderTransaction], txns: &[Transaction]) -> MatchOutcome {
        compare_feeds("J1", PaymentProvider::Stripe, lines, txns, at())
    }

    #[test]
    fn test_clean_match() {
        let outcome = compare(&[line("T1", dec!(100), "succeeded")], &[internal("T1", dec!(100))]);

        assert!(outcome.discrepancies.is_empty());
        assert_eq!(outcome.clean_matches, vec!["T1".to_string()]);
    }

    #[test]
    fn test_missing_internal_is_low() {
        let outcome = compare(&[line("T1", dec!(100.00), "succeeded")], &[]);

        assert_eq!(outcome.discrepancies.len(), 1);
        let d = &outcome.discrepancies[0];
        assert_eq!(d.discrepancy_type, DiscrepancyType::MissingInternal);
        assert_eq!(d.severity, DiscrepancySeverity::Low);
        assert_eq!(d.transaction_id, "T1");
    }

    #[test]
    fn test_amount_mismatch_difference() {
        let outcome = compare(&[line("T2", dec!(150.00), "succeeded")], &[internal("T2", dec!(100.00))]);

        assert_eq!(outcome.discrepancies.len(), 1);
        let d = &outcome.discrepancies[0];
        assert_eq!(d.discrepancy_type, DiscrepancyType::AmountMismatch);
        assert_eq!(d.amount_difference, Some(dec!(50.00)));
        assert_eq!(d.severity, DiscrepancySeverity::Low);
        assert!(outcome.clean_matches.is_empty());
    }

    #[test]
    fn test_rounding_hides_sub_cent_noise() {
        let outcome = compare(&[line("T1", dec!(100.004), "succeeded")], &[internal("T1", dec!(100.00))]);
        assert!(outcome.discrepancies.is_empty());
    }

    #[test]
    fn test_missing_provider() {
        let outcome = compare(&[], &[internal("T9", dec!(700))]);

        assert_eq!(outcome.missing_provider_count(), 1);
        assert_eq!(outcome.discrepancies[0].severity, DiscrepancySeverity::Medium);
    }

    #[test]
    fn test_status_mismatch_and_disputed_counts_as_settled() {
        let pending = compare(&[line("T1", dec!(10), "pending")], &[internal("T1", dec!(10))]);
        assert_eq!(pending.discrepancies[0].discrepancy_type, DiscrepancyType::StatusMismatch);

        let mut disputed = internal("T1", dec!(10));
        disputed.mark_disputed("dp_1");
        let outcome = compare(&[line("T1", dec!(10), "succeeded")], &[disputed]);
        assert!(outcome.discrepancies.is_empty());
    }

    #[test]
    fn test_unknown_native_status_is_mismatch() {
        let outcome = compare(&[line("T1", dec!(10), "levitating")], &[internal("T1", dec!(10))]);
        assert_eq!(outcome.discrepancies[0].discrepancy_type, DiscrepancyType::StatusMismatch);
    }

    #[test]
    fn test_currency_mismatch_skips_amount_check() {
        let mut provider_line = line("T1", dec!(9000), "succeeded");
        provider_line.currency = "BDT".into();
        let outcome = compare(&[provider_line], &[internal("T1", dec!(80))]);

        assert_eq!(outcome.discrepancies.len(), 1);
        assert_eq!(outcome.discrepancies[0].discrepancy_type, DiscrepancyType::CurrencyMismatch);
        assert!(outcome.discrepancies[0].severity >= DiscrepancySeverity::High);
    }

    #[test]
    fn test_duplicate_and_invalid_lines() {
        let outcome = compare(
            &[
                line("T1", dec!(10), "succeeded"),
                line("T1", dec!(10), "succeeded"),
                line("  ", dec!(10), "succeeded"),
                line("T3", dec!(0), "succeeded"),
            ],
            &[internal("T1", dec!(10))],
        );

        let types: Vec<DiscrepancyType> =
            outcome.discrepancies.iter().map(|d| d.discrepancy_type).collect();
        assert_eq!(
            types,
            vec![
                DiscrepancyType::DuplicateTransaction,
                DiscrepancyType::InvalidTransaction,
                DiscrepancyType::InvalidTransaction,
            ]
        );
        assert_eq!(outcome.clean_matches, vec!["T1".to_string()]);
    }

    #[test]
    fn test_date_tolerance() {
        let mut one_day = line("T1", dec!(10), "succeeded");
        one_day.timestamp = at() + Duration::days(1);
        assert!(compare(&[one_day], &[internal("T1", dec!(10))]).discrepancies.is_empty());

        let mut two_days = line("T1", dec!(10), "succeeded");
        two_days.timestamp = at() + Duration::days(2);
        let outcome = compare(&[two_days], &[internal("T1", dec!(10))]);
        assert_eq!(outcome.discrepancies[0].discrepancy_type, DiscrepancyType::DateMismatch);
    }

    #[test]
    fn test_totals() {
        let outcome = compare(
            &[line("T1", dec!(10), "succeeded"), line("T2", dec!(5), "succeeded")],
            &[internal("T1", dec!(10))],
        );
        assert_eq!(outcome.provider_total, dec!(15));
        assert_eq!(outcome.internal_total, dec!(10));
    }

    #[test]
    fn test_invalid_line_is_not_also_missing_provider() {
        let outcome = compare(&[line("T1", dec!(-5), "succeeded")], &[internal("T1", dec!(10))]);

        assert_eq!(outcome.discrepancies.len(), 1);
        assert_eq!(outcome.discrepancies[0].discrepancy_type, DiscrepancyType::InvalidTransaction);
        assert_eq!(outcome.missing_provider_count(), 0);
    }

    #[test]
    fn test_repeated_internal_record_is_reported() {
        let outcome = compare(
            &[line("T1", dec!(10), "succeeded")],
            &[internal("T1", dec!(10)), internal("T1", dec!(10))],
        );

        assert_eq!(outcome.discrepancies.len(), 1);
        let d = &outcome.discrepancies[0];
        assert_eq!(d.discrepancy_type, DiscrepancyType::DuplicateTransaction);
        assert_eq!(d.internal_transaction_id.as_deref(), Some("T1"));
        assert!(d.provider_transaction_id.is_none());
        assert_eq!(outcome.clean_matches, vec!["T1".to_string()]);
    }

    #[test]
    fn test_repeated_unreported_record_is_missing_once() {
        let outcome = compare(&[], &[internal("T4", dec!(20)), internal("T4", dec!(20))]);

        let types: Vec<DiscrepancyType> =
            outcome.discrepancies.iter().map(|d| d.discrepancy_type).collect();
        assert_eq!(
            types,
            vec![DiscrepancyType::DuplicateTransaction, DiscrepancyType::MissingProvider]
        );
    }
}
