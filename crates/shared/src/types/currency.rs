//! Currency codes and minor-unit rounding.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` throughout.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Minor units assumed for currency codes the system does not know.
const DEFAULT_MINOR_UNITS: u32 = 2;

/// ISO 4217 currency codes settled by the supported payment providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US Dollar
    Usd,
    /// Euro
    Eur,
    /// Pound Sterling
    Gbp,
    /// Bangladeshi Taka
    Bdt,
    /// Indian Rupee
    Inr,
    /// Japanese Yen
    Jpy,
}

impl Currency {
    /// Number of fractional digits in the currency's minor unit.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::Jpy => 0,
            Self::Usd | Self::Eur | Self::Gbp | Self::Bdt | Self::Inr => 2,
        }
    }
}

/// Minor-unit digits of an ISO code; two for unknown codes.
#[must_use]
pub fn minor_units_of(code: &str) -> u32 {
    code.parse::<Currency>()
        .map_or(DEFAULT_MINOR_UNITS, Currency::minor_units)
}

/// Rounds an amount to the minor unit of the given ISO code using banker's
/// rounding.
///
/// Unknown codes are rounded to two fractional digits.
#[must_use]
pub fn round_to_currency(amount: Decimal, code: &str) -> Decimal {
    amount.round_dp_with_strategy(minor_units_of(code), RoundingStrategy::MidpointNearestEven)
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usd => write!(f, "USD"),
            Self::Eur => write!(f, "EUR"),
            Self::Gbp => write!(f, "GBP"),
            Self::Bdt => write!(f, "BDT"),
            Self::Inr => write!(f, "INR"),
            Self::Jpy => write!(f, "JPY"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            "BDT" => Ok(Self::Bdt),
            "INR" => Ok(Self::Inr),
            "JPY" => Ok(Self::Jpy),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[rstest]
    #[case("USD", dec!(10.005), dec!(10.00))]
    #[case("USD", dec!(10.015), dec!(10.02))]
    #[case("JPY", dec!(2.5), dec!(2))]
    #[case("BDT", dec!(99.999), dec!(100.00))]
    #[case("XYZ", dec!(1.2345), dec!(1.23))]
    fn test_round_to_currency(#[case] code: &str, #[case] amount: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_to_currency(amount, code), expected);
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!(Currency::from_str("usd").unwrap(), Currency::Usd);
        assert_eq!(Currency::from_str(" BDT ").unwrap(), Currency::Bdt);
        assert!(Currency::from_str("XXX").is_err());
    }

    #[test]
    fn test_minor_units_of() {
        assert_eq!(minor_units_of("jpy"), 0);
        assert_eq!(minor_units_of("BDT"), 2);
        assert_eq!(minor_units_of("XXX"), 2);
    }

    #[test]
    fn test_currency_display() {
        assert_eq!(Currency::Eur.to_string(), "EUR");
    }
}
