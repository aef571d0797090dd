//! Provider-native transaction status vocabularies.
//!
//! Each provider gets its own table. Unknown strings yield `None`, which the
//! reconciliation engine reports as a status mismatch.

use super::provider::PaymentProvider;
use super::transaction::TransactionStatus;

/// Normalizes a provider-native transaction status.
#[must_use]
pub fn normalize_status(provider: PaymentProvider, native: &str) -> Option<TransactionStatus> {
    let native = native.trim();
    match provider {
        PaymentProvider::Stripe => stripe_status(native),
        PaymentProvider::Bkash => bkash_status(native),
        PaymentProvider::Nagad => nagad_status(native),
    }
}

fn stripe_status(native: &str) -> Option<TransactionStatus> {
    match native.to_lowercase().as_str() {
        "succeeded" | "paid" => Some(TransactionStatus::Success),
        "pending" | "processing" | "requires_capture" | "requires_action" => {
            Some(TransactionStatus::Pending)
        }
        "failed" | "requires_payment_method" => Some(TransactionStatus::Failed),
        "canceled" | "cancelled" => Some(TransactionStatus::Cancelled),
        _ => None,
    }
}

fn bkash_status(native: &str) -> Option<TransactionStatus> {
    match native.to_lowercase().as_str() {
        "completed" => Some(TransactionStatus::Success),
        "initiated" | "pending" | "authorized" => Some(TransactionStatus::Pending),
        "failed" | "expired" => Some(TransactionStatus::Failed),
        "cancelled" => Some(TransactionStatus::Cancelled),
        _ => None,
    }
}

fn nagad_status(native: &str) -> Option<TransactionStatus> {
    match native.to_lowercase().as_str() {
        "success" => Some(TransactionStatus::Success),
        "ready" | "inprogress" | "in_progress" => Some(TransactionStatus::Pending),
        "failed" | "fraud" => Some(TransactionStatus::Failed),
        "aborted" | "cancelled" => Some(TransactionStatus::Cancelled),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PaymentProvider::Stripe, "succeeded", Some(TransactionStatus::Success))]
    #[case(PaymentProvider::Stripe, "requires_capture", Some(TransactionStatus::Pending))]
    #[case(PaymentProvider::Stripe, "canceled", Some(TransactionStatus::Cancelled))]
    #[case(PaymentProvider::Bkash, "Completed", Some(TransactionStatus::Success))]
    #[case(PaymentProvider::Bkash, "Initiated", Some(TransactionStatus::Pending))]
    #[case(PaymentProvider::Nagad, "Success", Some(TransactionStatus::Success))]
    #[case(PaymentProvider::Nagad, "Aborted", Some(TransactionStatus::Cancelled))]
    #[case(PaymentProvider::Nagad, "teleported", None)]
    fn test_normalize_status(
        #[case] provider: PaymentProvider,
        #[case] native: &str,
        #[case] expected: Option<TransactionStatus>,
    ) {
        assert_eq!(normalize_status(provider, native), expected);
    }

    #[test]
    fn test_vocabularies_are_independent() {
        // "Completed" is bKash vocabulary only.
        assert_eq!(normalize_status(PaymentProvider::Stripe, "Completed"), None);
        assert_eq!(normalize_status(PaymentProvider::Nagad, "succeeded"), None);
    }
}
