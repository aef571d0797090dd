//! Discrepancy severity rules.
//!
//! Every threshold is inclusive (`>=`).

use rust_decimal::Decimal;

use super::types::{DiscrepancySeverity, DiscrepancyType};

/// Amount difference at which a mismatch becomes MEDIUM.
pub const MEDIUM_DIFFERENCE: Decimal = Decimal::from_parts(500, 0, 0, false, 0);
/// Amount difference at which a mismatch becomes HIGH.
pub const HIGH_DIFFERENCE: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);
/// Known amount at which a missing record becomes HIGH.
pub const HIGH_MISSING_AMOUNT: Decimal = Decimal::from_parts(2000, 0, 0, false, 0);
/// Difference at which a HIGH discrepancy becomes CRITICAL.
pub const CRITICAL_DIFFERENCE: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Classifies a discrepancy from its type and the amounts on each side.
///
/// For missing records only one amount is known and it stands in for the
/// difference.
#[must_use]
pub fn determine_severity(
    discrepancy_type: DiscrepancyType,
    provider_amount: Option<Decimal>,
    internal_amount: Option<Decimal>,
) -> DiscrepancySeverity {
    let both = provider_amount.zip(internal_amount);
    let difference = match (provider_amount, internal_amount) {
        (Some(a), Some(b)) => (a - b).abs(),
        (Some(known), None) | (None, Some(known)) => known.abs(),
        (None, None) => Decimal::ZERO,
    };

    let high = match discrepancy_type {
        DiscrepancyType::MissingInternal | DiscrepancyType::MissingProvider => {
            difference >= HIGH_MISSING_AMOUNT
        }
        DiscrepancyType::CurrencyMismatch => true,
        _ => both.is_some() && difference >= HIGH_DIFFERENCE,
    };
    if high {
        return if difference >= CRITICAL_DIFFERENCE {
            DiscrepancySeverity::Critical
        } else {
            DiscrepancySeverity::High
        };
    }

    let medium = match discrepancy_type {
        DiscrepancyType::MissingInternal | DiscrepancyType::MissingProvider => {
            difference >= MEDIUM_DIFFERENCE
        }
        DiscrepancyType::StatusMismatch
        | DiscrepancyType::DuplicateTransaction
        | DiscrepancyType::InvalidTransaction => true,
        _ => both.is_some() && difference >= MEDIUM_DIFFERENCE,
    };
    if medium {
        DiscrepancySeverity::Medium
    } else {
        DiscrepancySeverity::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_threshold_constants() {
        assert_eq!(MEDIUM_DIFFERENCE, dec!(500));
        assert_eq!(HIGH_DIFFERENCE, dec!(1000));
        assert_eq!(HIGH_MISSING_AMOUNT, dec!(2000));
        assert_eq!(CRITICAL_DIFFERENCE, dec!(10000));
    }

    #[rstest]
    #[case(dec!(150.00), dec!(100.00), DiscrepancySeverity::Low)]
    #[case(dec!(599.99), dec!(100.00), DiscrepancySeverity::Low)]
    #[case(dec!(600.00), dec!(100.00), DiscrepancySeverity::Medium)]
    #[case(dec!(100.00), dec!(600.00), DiscrepancySeverity::Medium)]
    #[case(dec!(1099.99), dec!(100.00), DiscrepancySeverity::Medium)]
    #[case(dec!(1100.00), dec!(100.00), DiscrepancySeverity::High)]
    #[case(dec!(10099.99), dec!(100.00), DiscrepancySeverity::High)]
    #[case(dec!(10100.00), dec!(100.00), DiscrepancySeverity::Critical)]
    fn test_amount_mismatch_boundaries(
        #[case] provider: Decimal,
        #[case] internal: Decimal,
        #[case] expected: DiscrepancySeverity,
    ) {
        assert_eq!(
            determine_severity(DiscrepancyType::AmountMismatch, Some(provider), Some(internal)),
            expected
        );
    }

    #[rstest]
    #[case(dec!(100.00), DiscrepancySeverity::Low)]
    #[case(dec!(499.99), DiscrepancySeverity::Low)]
    #[case(dec!(500.00), DiscrepancySeverity::Medium)]
    #[case(dec!(1500.00), DiscrepancySeverity::Medium)]
    #[case(dec!(1999.99), DiscrepancySeverity::Medium)]
    #[case(dec!(2000.00), DiscrepancySeverity::High)]
    #[case(dec!(10000.00), DiscrepancySeverity::Critical)]
    fn test_missing_boundaries(#[case] amount: Decimal, #[case] expected: DiscrepancySeverity) {
        assert_eq!(
            determine_severity(DiscrepancyType::MissingInternal, Some(amount), None),
            expected
        );
        assert_eq!(
            determine_severity(DiscrepancyType::MissingProvider, None, Some(amount)),
            expected
        );
    }

    #[test]
    fn test_status_mismatch_is_at_least_medium() {
        assert_eq!(
            determine_severity(DiscrepancyType::StatusMismatch, Some(dec!(5)), Some(dec!(5))),
            DiscrepancySeverity::Medium
        );
    }

    #[test]
    fn test_currency_mismatch_is_high() {
        assert_eq!(
            determine_severity(DiscrepancyType::CurrencyMismatch, Some(dec!(5)), Some(dec!(5))),
            DiscrepancySeverity::High
        );
    }

    #[test]
    fn test_date_mismatch_alone_is_low() {
        assert_eq!(
            determine_severity(DiscrepancyType::DateMismatch, Some(dec!(50)), Some(dec!(50))),
            DiscrepancySeverity::Low
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(DiscrepancySeverity::Critical > DiscrepancySeverity::High);
        assert!(DiscrepancySeverity::High.requires_ticket());
        assert!(!DiscrepancySeverity::Medium.requires_ticket());
    }
}
