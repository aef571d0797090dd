//! Chart of accounts for the marketplace ledger.
//!
//! The account taxonomy is closed. Every account type maps through
//! [`ACCOUNT_TABLE`] to its category, and the category decides which
//! entry type increases the account's normal balance:
//! - Asset/Expense/Reserve: balance += debit - credit (debit-normal)
//! - Liability/Revenue: balance += credit - debit (credit-normal)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::entry::EntryType;

/// Accounting category of an account type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountCategory {
    /// Resources held by the platform.
    Asset,
    /// Amounts owed to vendors or customers.
    Liability,
    /// Income earned by the platform.
    Revenue,
    /// Costs incurred by the platform.
    Expense,
    /// Funds held back from the available balance.
    Reserve,
}

impl AccountCategory {
    /// Returns true if debits increase this category's normal balance.
    #[must_use]
    pub const fn is_debit_normal(self) -> bool {
        matches!(self, Self::Asset | Self::Expense | Self::Reserve)
    }
}

/// Ledger account types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Available cash balance held with payment providers.
    Cash,
    /// Settlements a provider owes the platform.
    ProviderReceivable,
    /// Amounts owed to vendors for fulfilled bookings.
    VendorPayable,
    /// Refunds owed to customers.
    CustomerRefundPayable,
    /// Commission earned on bookings.
    PlatformCommission,
    /// Fees charged by payment providers.
    ProcessingFees,
    /// Realized losses from lost chargebacks.
    ChargebackLoss,
    /// Funds frozen while a dispute is open.
    DisputeReserve,
}

/// Constant lookup: account type to category.
pub const ACCOUNT_TABLE: [(AccountType, AccountCategory); 8] = [
    (AccountType::Cash, AccountCategory::Asset),
    (AccountType::ProviderReceivable, AccountCategory::Asset),
    (AccountType::VendorPayable, AccountCategory::Liability),
    (AccountType::CustomerRefundPayable, AccountCategory::Liability),
    (AccountType::PlatformCommission, AccountCategory::Revenue),
    (AccountType::ProcessingFees, AccountCategory::Expense),
    (AccountType::ChargebackLoss, AccountCategory::Expense),
    (AccountType::DisputeReserve, AccountCategory::Reserve),
];

impl AccountType {
    /// Every account type, in chart order.
    pub const ALL: [Self; 8] = [
        Self::Cash,
        Self::ProviderReceivable,
        Self::VendorPayable,
        Self::CustomerRefundPayable,
        Self::PlatformCommission,
        Self::ProcessingFees,
        Self::ChargebackLoss,
        Self::DisputeReserve,
    ];

    /// Returns the accounting category from [`ACCOUNT_TABLE`].
    #[must_use]
    pub const fn category(self) -> AccountCategory {
        let mut i = 0;
        while i < ACCOUNT_TABLE.len() {
            if ACCOUNT_TABLE[i].0 as u8 == self as u8 {
                return ACCOUNT_TABLE[i].1;
            }
            i += 1;
        }
        AccountCategory::Asset
    }

    /// Returns true if a debit increases this account's normal balance.
    #[must_use]
    pub const fn is_debit_normal(self) -> bool {
        self.category().is_debit_normal()
    }

    /// The entry type that increases this account's normal balance.
    #[must_use]
    pub const fn normal_entry_type(self) -> EntryType {
        if self.is_debit_normal() {
            EntryType::Debit
        } else {
            EntryType::Credit
        }
    }

    /// Change in normal balance caused by one entry.
    #[must_use]
    pub fn balance_change(self, entry_type: EntryType, amount: Decimal) -> Decimal {
        if entry_type == self.normal_entry_type() {
            amount
        } else {
            -amount
        }
    }

    /// Converts a signed (debit-positive) balance to the account's normal balance.
    #[must_use]
    pub fn normal_balance(self, signed_balance: Decimal) -> Decimal {
        if self.is_debit_normal() {
            signed_balance
        } else {
            -signed_balance
        }
    }

    /// Returns the string representation stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::ProviderReceivable => "PROVIDER_RECEIVABLE",
            Self::VendorPayable => "VENDOR_PAYABLE",
            Self::CustomerRefundPayable => "CUSTOMER_REFUND_PAYABLE",
            Self::PlatformCommission => "PLATFORM_COMMISSION",
            Self::ProcessingFees => "PROCESSING_FEES",
            Self::ChargebackLoss => "CHARGEBACK_LOSS",
            Self::DisputeReserve => "DISPUTE_RESERVE",
        }
    }

    /// Parses an account type from its stored representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|account| account.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_table_covers_every_account() {
        for account in AccountType::ALL {
            assert!(
                ACCOUNT_TABLE.iter().any(|(a, _)| *a == account),
                "{account} missing from ACCOUNT_TABLE"
            );
        }
    }

    #[test]
    fn test_debit_normal_accounts() {
        assert!(AccountType::Cash.is_debit_normal());
        assert!(AccountType::ProviderReceivable.is_debit_normal());
        assert!(AccountType::ProcessingFees.is_debit_normal());
        assert!(AccountType::ChargebackLoss.is_debit_normal());
        assert!(AccountType::DisputeReserve.is_debit_normal());
    }

    #[test]
    fn test_credit_normal_accounts() {
        assert!(!AccountType::VendorPayable.is_debit_normal());
        assert!(!AccountType::CustomerRefundPayable.is_debit_normal());
        assert!(!AccountType::PlatformCommission.is_debit_normal());
    }

    #[test]
    fn test_balance_change_direction() {
        assert_eq!(
            AccountType::Cash.balance_change(EntryType::Debit, dec!(10)),
            dec!(10)
        );
        assert_eq!(
            AccountType::Cash.balance_change(EntryType::Credit, dec!(10)),
            dec!(-10)
        );
        assert_eq!(
            AccountType::VendorPayable.balance_change(EntryType::Credit, dec!(10)),
            dec!(10)
        );
    }

    #[test]
    fn test_normal_balance_flips_credit_normal() {
        assert_eq!(AccountType::PlatformCommission.normal_balance(dec!(-25)), dec!(25));
        assert_eq!(AccountType::DisputeReserve.normal_balance(dec!(25)), dec!(25));
    }

    #[test]
    fn test_parse_round_trip() {
        for account in AccountType::ALL {
            assert_eq!(AccountType::parse(account.as_str()), Some(account));
        }
        assert_eq!(AccountType::parse("dispute_reserve"), Some(AccountType::DisputeReserve));
        assert_eq!(AccountType::parse("equity"), None);
    }
}
