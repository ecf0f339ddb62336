//! Income/expense classification accounts.
//!
//! A classification account (e.g. "Electricity") categorizes budget intent
//! and transactions. It never holds money.

use moneybox_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whether an account classifies money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Money leaving a holder.
    Expense,
    /// Money arriving at a holder.
    Income,
}

impl AccountType {
    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }

    /// Parses a type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "expense" => Some(Self::Expense),
            "income" => Some(Self::Income),
            _ => None,
        }
    }

    /// Applies the sign of this flow to a positive amount.
    ///
    /// Income keeps the amount, expense negates it.
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::Income => amount,
            Self::Expense => -amount,
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A classification node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// Income or expense.
    pub account_type: AccountType,
    /// Optional classification group (e.g. "Housing").
    pub group: Option<String>,
    /// Whether the account is active.
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_signed_amounts() {
        assert_eq!(AccountType::Income.signed(dec!(500.00)), dec!(500.00));
        assert_eq!(AccountType::Expense.signed(dec!(200.00)), dec!(-200.00));
    }

    #[test]
    fn test_parse_round_trip() {
        for ty in [AccountType::Expense, AccountType::Income] {
            assert_eq!(AccountType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(AccountType::parse("INCOME"), Some(AccountType::Income));
        assert_eq!(AccountType::parse("asset"), None);
    }
}
