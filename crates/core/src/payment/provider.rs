//! Payment rails the marketplace settles through.

use serde::{Deserialize, Serialize};
use std::fmt;

/// External payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentProvider {
    /// Card processor.
    Stripe,
    /// Mobile wallet.
    Bkash,
    /// Mobile wallet.
    Nagad,
}

impl PaymentProvider {
    /// Every provider, in reconciliation order.
    pub const ALL: [Self; 3] = [Self::Stripe, Self::Bkash, Self::Nagad];

    /// Returns the string representation stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stripe => "STRIPE",
            Self::Bkash => "BKASH",
            Self::Nagad => "NAGAD",
        }
    }

    /// Lowercase key used in configuration tables.
    #[must_use]
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Bkash => "bkash",
            Self::Nagad => "nagad",
        }
    }

    /// Parses a provider name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "STRIPE" => Some(Self::Stripe),
            "BKASH" => Some(Self::Bkash),
            "NAGAD" => Some(Self::Nagad),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown payment provider: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for provider in PaymentProvider::ALL {
            assert_eq!(PaymentProvider::parse(provider.as_str()), Some(provider));
            assert_eq!(PaymentProvider::parse(provider.config_key()), Some(provider));
        }
        assert_eq!(PaymentProvider::parse("paypal"), None);
    }

    #[test]
    fn test_from_str_error() {
        let err = "rocket".parse::<PaymentProvider>().unwrap_err();
        assert!(err.contains("rocket"));
    }
}
