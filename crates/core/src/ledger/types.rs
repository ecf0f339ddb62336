//! Ledger domain types.
//!
//! Balance holders (bank accounts and boxes) and the immutable movements
//! that change their balances.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use moneybox_shared::BoxInitialBalance;
use moneybox_shared::types::{BankAccountId, BoxId, InstanceId, MovementId, TransferId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reference to anything that carries a balance.
///
/// Ordering puts every bank account before every box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum HolderRef {
    /// A bank account.
    BankAccount(BankAccountId),
    /// An envelope sub-account.
    Box(BoxId),
}

impl HolderRef {
    /// Returns the underlying UUID.
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        match self {
            Self::BankAccount(id) => id.0,
            Self::Box(id) => id.0,
        }
    }

    /// Returns true if this holder is a box.
    #[must_use]
    pub const fn is_box(&self) -> bool {
        matches!(self, Self::Box(_))
    }
}

impl fmt::Display for HolderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BankAccount(id) => write!(f, "bank_account:{id}"),
            Self::Box(id) => write!(f, "box:{id}"),
        }
    }
}

impl From<BankAccountId> for HolderRef {
    fn from(id: BankAccountId) -> Self {
        Self::BankAccount(id)
    }
}

impl From<BoxId> for HolderRef {
    fn from(id: BoxId) -> Self {
        Self::Box(id)
    }
}

/// Kind of balance-affecting movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Confirmed income.
    Income,
    /// Confirmed expense.
    Expense,
    /// Incoming leg of a transfer.
    TransferIn,
    /// Outgoing leg of a transfer.
    TransferOut,
    /// Money moved from an account into a box.
    BoxContribution,
    /// Money moved from a box back into an account.
    BoxWithdrawal,
}

impl MovementKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::TransferIn => "transfer_in",
            Self::TransferOut => "transfer_out",
            Self::BoxContribution => "box_contribution",
            Self::BoxWithdrawal => "box_withdrawal",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            "transfer_in" => Some(Self::TransferIn),
            "transfer_out" => Some(Self::TransferOut),
            "box_contribution" => Some(Self::BoxContribution),
            "box_withdrawal" => Some(Self::BoxWithdrawal),
            _ => None,
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A movement waiting to be appended to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    /// Holder whose balance changes.
    pub holder: HolderRef,
    /// Signed amount (positive credits the holder).
    pub amount: Decimal,
    /// Movement kind.
    pub kind: MovementKind,
    /// Free-text description.
    pub description: String,
    /// Date the movement takes effect.
    pub effective_date: NaiveDate,
    /// Instance that produced this movement, if any.
    pub instance_id: Option<InstanceId>,
    /// Transfer this movement is a leg of, if any.
    pub transfer_id: Option<TransferId>,
}

/// An immutable, appended ledger movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerMovement {
    /// Movement ID.
    pub id: MovementId,
    /// Holder whose balance changed.
    pub holder: HolderRef,
    /// Signed amount.
    pub amount: Decimal,
    /// Movement kind.
    pub kind: MovementKind,
    /// Free-text description.
    pub description: String,
    /// Date the movement takes effect.
    pub effective_date: NaiveDate,
    /// When the movement was appended.
    pub created_at: DateTime<Utc>,
    /// Originating instance.
    pub instance_id: Option<InstanceId>,
    /// Owning transfer.
    pub transfer_id: Option<TransferId>,
}

impl LedgerMovement {
    /// Records a new movement at the given timestamp.
    #[must_use]
    pub fn record(new: NewMovement, created_at: DateTime<Utc>) -> Self {
        Self {
            id: MovementId::new(),
            holder: new.holder,
            amount: new.amount,
            kind: new.kind,
            description: new.description,
            effective_date: new.effective_date,
            created_at,
            instance_id: new.instance_id,
            transfer_id: new.transfer_id,
        }
    }

    /// Sort key for chronological (audit) order.
    #[must_use]
    pub fn chronological_key(&self) -> (NaiveDate, DateTime<Utc>, MovementId) {
        (self.effective_date, self.created_at, self.id)
    }
}

/// A bank account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    /// Account ID.
    pub id: BankAccountId,
    /// Display name.
    pub name: String,
    /// Opening balance.
    pub initial_balance: Decimal,
    /// Denormalized balance: `initial_balance + sum(movements)`.
    pub cached_balance: Decimal,
    /// Whether the account is active.
    pub is_active: bool,
}

impl BankAccount {
    /// Returns the holder view of this account.
    #[must_use]
    pub fn to_holder(&self) -> HolderAccount {
        HolderAccount {
            holder: HolderRef::BankAccount(self.id),
            name: self.name.clone(),
            baseline: self.initial_balance,
            cached_balance: self.cached_balance,
            is_active: self.is_active,
        }
    }
}

/// An envelope sub-account scoped to one bank account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneyBox {
    /// Box ID.
    pub id: BoxId,
    /// Owning bank account.
    pub bank_account_id: BankAccountId,
    /// Display name.
    pub name: String,
    /// Funding amount recorded when the box was created.
    pub initial_value: Decimal,
    /// Denormalized balance.
    pub cached_balance: Decimal,
    /// Whether the box is active.
    pub is_active: bool,
}

impl MoneyBox {
    /// Starting balance of the box under the given policy.
    #[must_use]
    pub fn baseline(&self, policy: BoxInitialBalance) -> Decimal {
        match policy {
            BoxInitialBalance::Zero => Decimal::ZERO,
            BoxInitialBalance::Funded => self.initial_value,
        }
    }

    /// Returns the holder view of this box.
    #[must_use]
    pub fn to_holder(&self, policy: BoxInitialBalance) -> HolderAccount {
        HolderAccount {
            holder: HolderRef::Box(self.id),
            name: self.name.clone(),
            baseline: self.baseline(policy),
            cached_balance: self.cached_balance,
            is_active: self.is_active,
        }
    }
}

/// Uniform view over a bank account or a box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderAccount {
    /// Holder reference.
    pub holder: HolderRef,
    /// Display name, used verbatim in reports.
    pub name: String,
    /// Balance before any movement.
    pub baseline: Decimal,
    /// Denormalized balance.
    pub cached_balance: Decimal,
    /// Whether the holder accepts new movements.
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn money_box() -> MoneyBox {
        MoneyBox {
            id: BoxId::new(),
            bank_account_id: BankAccountId::new(),
            name: "Vacation".to_string(),
            initial_value: dec!(250.00),
            cached_balance: dec!(0),
            is_active: true,
        }
    }

    #[test]
    fn test_box_baseline_policy() {
        let b = money_box();
        assert_eq!(b.baseline(BoxInitialBalance::Zero), dec!(0));
        assert_eq!(b.baseline(BoxInitialBalance::Funded), dec!(250.00));
        assert_eq!(b.to_holder(BoxInitialBalance::Zero).baseline, dec!(0));
    }

    #[test]
    fn test_bank_accounts_order_before_boxes() {
        let account = HolderRef::BankAccount(BankAccountId::new());
        let money_box = HolderRef::Box(BoxId::new());
        assert!(account < money_box);
        assert!(money_box.is_box());
        assert!(!account.is_box());
    }

    #[test]
    fn test_movement_kind_parse() {
        assert_eq!(
            MovementKind::parse("box-contribution"),
            Some(MovementKind::BoxContribution)
        );
        assert_eq!(MovementKind::parse("TRANSFER_IN"), Some(MovementKind::TransferIn));
        assert_eq!(MovementKind::parse("refund"), None);
    }
}
