//! Provider dispute vocabularies.
//!
//! One lookup table per provider for each of status, reason and type.
//! Unknown status maps to `UNDER_REVIEW`, unknown reason to `OTHER` and
//! unknown type to `CHARGEBACK`. Lookups ignore case and surrounding
//! whitespace.

use super::types::{DisputeReason, DisputeStatus, DisputeType};
use crate::payment::PaymentProvider;

/// Native status, reason and type tables of one provider.
struct Vocabulary {
    status: &'static [(&'static str, DisputeStatus)],
    reason: &'static [(&'static str, DisputeReason)],
    kind: &'static [(&'static str, DisputeType)],
}

const STRIPE: Vocabulary = Vocabulary {
    status: &[
        ("needs_response", DisputeStatus::EvidenceRequired),
        ("warning_needs_response", DisputeStatus::EvidenceRequired),
        ("under_review", DisputeStatus::EvidenceSubmitted),
        ("warning_under_review", DisputeStatus::EvidenceSubmitted),
        ("won", DisputeStatus::Won),
        ("lost", DisputeStatus::Lost),
        ("charge_refunded", DisputeStatus::Accepted),
        ("warning_closed", DisputeStatus::Closed),
    ],
    reason: &[
        ("fraudulent", DisputeReason::Fraudulent),
        ("unrecognized", DisputeReason::Unrecognized),
        ("duplicate", DisputeReason::Duplicate),
        ("subscription_canceled", DisputeReason::SubscriptionCancelled),
        ("product_not_received", DisputeReason::ProductNotReceived),
        ("product_unacceptable", DisputeReason::ProductUnacceptable),
        ("credit_not_processed", DisputeReason::CreditNotProcessed),
        ("general", DisputeReason::General),
    ],
    kind: &[
        ("chargeback", DisputeType::Chargeback),
        ("inquiry", DisputeType::Inquiry),
        ("retrieval", DisputeType::Retrieval),
        ("fraud", DisputeType::Fraud),
    ],
};

const BKASH: Vocabulary = Vocabulary {
    status: &[
        ("RAISED", DisputeStatus::Received),
        ("INVESTIGATING", DisputeStatus::UnderReview),
        ("DOCUMENT_REQUIRED", DisputeStatus::EvidenceRequired),
        ("DOCUMENT_SUBMITTED", DisputeStatus::EvidenceSubmitted),
        ("RESOLVED_MERCHANT", DisputeStatus::Won),
        ("RESOLVED_CUSTOMER", DisputeStatus::Lost),
        ("REVERSED", DisputeStatus::Lost),
        ("MERCHANT_ACCEPTED", DisputeStatus::Accepted),
        ("TIMED_OUT", DisputeStatus::Expired),
        ("CLOSED", DisputeStatus::Closed),
    ],
    reason: &[
        ("UNAUTHORIZED_TRANSACTION", DisputeReason::Fraudulent),
        ("NOT_RECOGNIZED", DisputeReason::Unrecognized),
        ("DOUBLE_CHARGE", DisputeReason::Duplicate),
        ("SUBSCRIPTION_CANCELLED", DisputeReason::SubscriptionCancelled),
        ("SERVICE_NOT_RECEIVED", DisputeReason::ProductNotReceived),
        ("SERVICE_NOT_AS_DESCRIBED", DisputeReason::ProductUnacceptable),
        ("REFUND_NOT_RECEIVED", DisputeReason::CreditNotProcessed),
        ("GENERAL_COMPLAINT", DisputeReason::General),
    ],
    kind: &[
        ("CHARGEBACK", DisputeType::Chargeback),
        ("COMPLAINT", DisputeType::Inquiry),
        ("INFO_REQUEST", DisputeType::Retrieval),
        ("FRAUD_CLAIM", DisputeType::Fraud),
    ],
};

const NAGAD: Vocabulary = Vocabulary {
    status: &[
        ("NEW", DisputeStatus::Received),
        ("IN_REVIEW", DisputeStatus::UnderReview),
        ("PENDING_EVIDENCE", DisputeStatus::EvidenceRequired),
        ("EVIDENCE_RECEIVED", DisputeStatus::EvidenceSubmitted),
        ("MERCHANT_WIN", DisputeStatus::Won),
        ("CUSTOMER_WIN", DisputeStatus::Lost),
        ("MERCHANT_ACCEPTED", DisputeStatus::Accepted),
        ("EXPIRED", DisputeStatus::Expired),
        ("ARCHIVED", DisputeStatus::Closed),
    ],
    reason: &[
        ("FRAUD", DisputeReason::Fraudulent),
        ("UNKNOWN_CHARGE", DisputeReason::Unrecognized),
        ("DUPLICATE_PAYMENT", DisputeReason::Duplicate),
        ("SUBSCRIPTION_ENDED", DisputeReason::SubscriptionCancelled),
        ("NOT_DELIVERED", DisputeReason::ProductNotReceived),
        ("QUALITY_ISSUE", DisputeReason::ProductUnacceptable),
        ("REFUND_PENDING", DisputeReason::CreditNotProcessed),
        ("GENERAL", DisputeReason::General),
    ],
    kind: &[
        ("CHARGEBACK", DisputeType::Chargeback),
        ("QUERY", DisputeType::Inquiry),
        ("DOCUMENT_REQUEST", DisputeType::Retrieval),
        ("FRAUD", DisputeType::Fraud),
    ],
};

const fn vocabulary(provider: PaymentProvider) -> &'static Vocabulary {
    match provider {
        PaymentProvider::Stripe => &STRIPE,
        PaymentProvider::Bkash => &BKASH,
        PaymentProvider::Nagad => &NAGAD,
    }
}

fn lookup<T: Copy>(table: &[(&str, T)], native: &str) -> Option<T> {
    let native = native.trim();
    table
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(native))
        .map(|(_, value)| *value)
}

/// Maps a native dispute status, defaulting to `UNDER_REVIEW`.
#[must_use]
pub fn map_status(provider: PaymentProvider, native: &str) -> DisputeStatus {
    lookup(vocabulary(provider).status, native).unwrap_or(DisputeStatus::UnderReview)
}

/// Maps a native dispute reason, defaulting to `OTHER`.
#[must_use]
pub fn map_reason(provider: PaymentProvider, native: &str) -> DisputeReason {
    lookup(vocabulary(provider).reason, native).unwrap_or(DisputeReason::Other)
}

/// Maps a native dispute type, defaulting to `CHARGEBACK`.
#[must_use]
pub fn map_type(provider: PaymentProvider, native: &str) -> DisputeType {
    lookup(vocabulary(provider).kind, native).unwrap_or(DisputeType::Chargeback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PaymentProvider::Stripe, "won", DisputeStatus::Won)]
    #[case(PaymentProvider::Stripe, "needs_response", DisputeStatus::EvidenceRequired)]
    #[case(PaymentProvider::Bkash, "resolved_merchant", DisputeStatus::Won)]
    #[case(PaymentProvider::Bkash, "REVERSED", DisputeStatus::Lost)]
    #[case(PaymentProvider::Nagad, "CUSTOMER_WIN", DisputeStatus::Lost)]
    #[case(PaymentProvider::Nagad, " MERCHANT_ACCEPTED ", DisputeStatus::Accepted)]
    fn test_map_status(
        #[case] provider: PaymentProvider,
        #[case] native: &str,
        #[case] expected: DisputeStatus,
    ) {
        assert_eq!(map_status(provider, native), expected);
    }

    #[test]
    fn test_unknown_values_fall_back() {
        for provider in PaymentProvider::ALL {
            assert_eq!(map_status(provider, "???"), DisputeStatus::UnderReview);
            assert_eq!(map_reason(provider, "???"), DisputeReason::Other);
            assert_eq!(map_type(provider, "???"), DisputeType::Chargeback);
        }
    }

    #[test]
    fn test_tables_are_per_provider() {
        // Stripe's "won" is not part of the Nagad vocabulary.
        assert_eq!(map_status(PaymentProvider::Nagad, "won"), DisputeStatus::UnderReview);
        assert_eq!(map_reason(PaymentProvider::Bkash, "fraudulent"), DisputeReason::Other);
        assert_eq!(map_type(PaymentProvider::Bkash, "COMPLAINT"), DisputeType::Inquiry);
    }
}
