//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `BoxId` where a `BankAccountId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
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

typed_id!(BankAccountId, "Unique identifier for a bank account.");
typed_id!(BoxId, "Unique identifier for an envelope sub-account (box).");
typed_id!(CardId, "Unique identifier for a credit card.");
typed_id!(
    AccountId,
    "Unique identifier for an income/expense classification account."
);
typed_id!(TemplateId, "Unique identifier for a provisioned budget template.");
typed_id!(InstanceId, "Unique identifier for a month-scoped transaction instance.");
typed_id!(InvoiceId, "Unique identifier for a card invoice.");
typed_id!(MovementId, "Unique identifier for a ledger movement.");
typed_id!(TransferId, "Unique identifier for a transfer.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_new_ids_are_distinct() {
        assert_ne!(MovementId::new(), MovementId::new());
    }

    #[test]
    fn test_id_round_trips_through_string() {
        let id = BoxId::new();
        let parsed = BoxId::from_str(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_id_rejects_garbage() {
        assert!(CardId::from_str("not-a-uuid").is_err());
    }
}
