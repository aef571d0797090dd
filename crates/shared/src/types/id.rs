//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `DisputeId` where a `PostingId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(LedgerEntryId, "Unique identifier for a ledger entry.");
typed_id!(
    PostingId,
    "Correlation key shared by every ledger entry written in one balanced posting."
);
typed_id!(
    PaymentTransactionId,
    "Unique identifier for an internally recorded payment transaction row."
);
typed_id!(ReconciliationJobId, "Unique identifier for a reconciliation job row.");
typed_id!(DiscrepancyId, "Unique identifier for a reconciliation discrepancy.");
typed_id!(DisputeId, "Unique identifier for a dispute.");
