//! Transfer domain types.

use chrono::{DateTime, NaiveDate, Utc};
use moneybox_shared::types::TransferId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{HolderRef, MovementKind};

/// Kind of transfer, derived from the holder types on each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Bank account to bank account.
    AccountToAccount,
    /// Bank account into a box.
    BoxContribution,
    /// Box back to a bank account.
    BoxWithdrawal,
    /// Box to box.
    BoxToBox,
}

impl TransferKind {
    /// Classifies a transfer by its endpoints.
    #[must_use]
    pub fn between(source: HolderRef, destination: HolderRef) -> Self {
        match (source.is_box(), destination.is_box()) {
            (false, false) => Self::AccountToAccount,
            (false, true) => Self::BoxContribution,
            (true, false) => Self::BoxWithdrawal,
            (true, true) => Self::BoxToBox,
        }
    }

    /// Movement kinds of the outgoing and incoming legs.
    #[must_use]
    pub fn leg_kinds(self) -> (MovementKind, MovementKind) {
        match self {
            Self::AccountToAccount | Self::BoxToBox => {
                (MovementKind::TransferOut, MovementKind::TransferIn)
            }
            Self::BoxContribution => (MovementKind::BoxContribution, MovementKind::BoxContribution),
            Self::BoxWithdrawal => (MovementKind::BoxWithdrawal, MovementKind::BoxWithdrawal),
        }
    }

    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountToAccount => "account_to_account",
            Self::BoxContribution => "box_contribution",
            Self::BoxWithdrawal => "box_withdrawal",
            Self::BoxToBox => "box_to_box",
        }
    }
}

/// Request to move money between two holders.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Holder debited.
    pub source: HolderRef,
    /// Holder credited.
    pub destination: HolderRef,
    /// Positive amount.
    pub amount: Decimal,
    /// Effective date of both legs.
    pub date: NaiveDate,
    /// Description.
    pub description: String,
}

/// A recorded transfer pairing two movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Transfer ID.
    pub id: TransferId,
    /// Holder debited.
    pub source: HolderRef,
    /// Holder credited.
    pub destination: HolderRef,
    /// Positive amount moved.
    pub amount: Decimal,
    /// Kind.
    pub kind: TransferKind,
    /// Effective date.
    pub date: NaiveDate,
    /// Description.
    pub description: String,
    /// When the transfer was recorded.
    pub created_at: DateTime<Utc>,
}

impl Transfer {
    /// Signed effect of this transfer on `holder`.
    #[must_use]
    pub fn effect_on(&self, holder: HolderRef) -> Decimal {
        if holder == self.source {
            -self.amount
        } else if holder == self.destination {
            self.amount
        } else {
            Decimal::ZERO
        }
    }
}
