//! Standard postings built from domain events.
//!
//! Every builder returns drafts that pass
//! [`validate_posting`](super::validation::validate_posting) for valid inputs.
//! Fund movements for disputes are always exactly two entries.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::account::AccountType;
use super::entry::{EntryType, LedgerEntry, LedgerEntryDraft};
use super::error::LedgerError;

/// Inputs shared by the dispute fund movements.
#[derive(Debug, Clone)]
pub struct DisputeFunds<'a> {
    /// Disputed payment transaction.
    pub transaction_id: &'a str,
    /// Provider dispute ID, stored as the entry reference.
    pub dispute_reference: &'a str,
    /// Disputed amount.
    pub amount: Decimal,
    /// Currency code.
    pub currency: &'a str,
    /// Accounting date.
    pub effective_date: NaiveDate,
}

/// A captured customer payment split into its fee components.
#[derive(Debug, Clone)]
pub struct PaymentCapture<'a> {
    /// Payment transaction ID.
    pub transaction_id: &'a str,
    /// Marketplace order, if known.
    pub order_id: Option<&'a str>,
    /// Gross amount charged to the customer.
    pub gross_amount: Decimal,
    /// Fee withheld by the provider.
    pub provider_fee: Decimal,
    /// Commission retained by the platform.
    pub platform_fee: Decimal,
    /// Currency code.
    pub currency: &'a str,
    /// Accounting date.
    pub effective_date: NaiveDate,
}

/// Stateless builder for standard postings.
pub struct PostingBuilder;

impl PostingBuilder {
    /// Moves disputed funds from available cash into the dispute reserve.
    ///
    /// Debit `DISPUTE_RESERVE`, credit `CASH`.
    #[must_use]
    pub fn fund_freeze(funds: &DisputeFunds<'_>) -> Vec<LedgerEntryDraft> {
        Self::dispute_pair(
            funds,
            AccountType::DisputeReserve,
            AccountType::Cash,
            "Funds frozen for dispute",
        )
    }

    /// Returns frozen funds to available cash after a won dispute.
    ///
    /// Debit `CASH`, credit `DISPUTE_RESERVE`.
    #[must_use]
    pub fn fund_release(funds: &DisputeFunds<'_>) -> Vec<LedgerEntryDraft> {
        Self::dispute_pair(
            funds,
            AccountType::Cash,
            AccountType::DisputeReserve,
            "Funds released after dispute",
        )
    }

    /// Writes frozen funds off as a chargeback loss.
    ///
    /// Debit `CHARGEBACK_LOSS`, credit `DISPUTE_RESERVE`.
    #[must_use]
    pub fn chargeback(funds: &DisputeFunds<'_>) -> Vec<LedgerEntryDraft> {
        Self::dispute_pair(
            funds,
            AccountType::ChargebackLoss,
            AccountType::DisputeReserve,
            "Chargeback loss",
        )
    }

    fn dispute_pair(
        funds: &DisputeFunds<'_>,
        debit: AccountType,
        credit: AccountType,
        description: &str,
    ) -> Vec<LedgerEntryDraft> {
        let description = format!("{description} {}", funds.dispute_reference);
        [(debit, EntryType::Debit), (credit, EntryType::Credit)]
            .into_iter()
            .map(|(account, entry_type)| {
                LedgerEntryDraft::new(
                    account,
                    entry_type,
                    funds.amount,
                    funds.currency,
                    description.clone(),
                    funds.effective_date,
                )
                .with_transaction(funds.transaction_id)
                .with_reference(funds.dispute_reference)
            })
            .collect()
    }

    /// Records a captured payment.
    ///
    /// - Debit `CASH` for the net settled amount
    /// - Debit `PROCESSING_FEES` for the provider fee
    /// - Credit `PLATFORM_COMMISSION` for the platform fee
    /// - Credit `VENDOR_PAYABLE` for the remainder owed to the vendor
    ///
    /// Zero fee lines are omitted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` when a fee is negative or the fees leave
    /// nothing for cash or the vendor.
    pub fn payment_capture(
        capture: &PaymentCapture<'_>,
    ) -> Result<Vec<LedgerEntryDraft>, LedgerError> {
        if capture.provider_fee < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(capture.provider_fee));
        }
        if capture.platform_fee < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(capture.platform_fee));
        }
        let net_cash = capture.gross_amount - capture.provider_fee;
        let vendor_share = capture.gross_amount - capture.platform_fee;
        if net_cash <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(net_cash));
        }
        if vendor_share <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(vendor_share));
        }

        let lines = [
            (AccountType::Cash, EntryType::Debit, net_cash),
            (AccountType::ProcessingFees, EntryType::Debit, capture.provider_fee),
            (AccountType::PlatformCommission, EntryType::Credit, capture.platform_fee),
            (AccountType::VendorPayable, EntryType::Credit, vendor_share),
        ];

        Ok(lines
            .into_iter()
            .filter(|(_, _, amount)| !amount.is_zero())
            .map(|(account, entry_type, amount)| {
                let mut draft = LedgerEntryDraft::new(
                    account,
                    entry_type,
                    amount,
                    capture.currency,
                    format!("Payment captured {}", capture.transaction_id),
                    capture.effective_date,
                )
                .with_transaction(capture.transaction_id);
                draft.order_id = capture.order_id.map(str::to_string);
                draft
            })
            .collect())
    }

    /// Creates reversing drafts for a stored posting by swapping debits and
    /// credits. Descriptions are prefixed with "Reversal: ".
    ///
    /// # Errors
    ///
    /// Returns `EmptyPosting` when there is nothing to reverse.
    pub fn reversal(
        original: &[LedgerEntry],
        reason: &str,
        effective_date: NaiveDate,
    ) -> Result<Vec<LedgerEntryDraft>, LedgerError> {
        if original.is_empty() {
            return Err(LedgerError::EmptyPosting);
        }

        Ok(original
            .iter()
            .map(|entry| LedgerEntryDraft {
                transaction_id: entry.transaction_id.clone(),
                order_id: entry.order_id.clone(),
                account_type: entry.account_type,
                entry_type: entry.entry_type.opposite(),
                amount: entry.amount,
                currency: entry.currency.clone(),
                description: format!("Reversal: {}", entry.description),
                reference: Some(entry.posting_id.to_string()),
                metadata: Some(serde_json::json!({ "reason": reason })),
                effective_date,
            })
            .collect())
    }
}
