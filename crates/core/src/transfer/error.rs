//! Transfer error types.

use moneybox_shared::AppError;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::ledger::{HolderRef, LedgerError};

/// Errors raised by the transfer engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransferError {
    /// Amount is zero or negative.
    #[error("Transfer amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Source and destination are the same holder.
    #[error("Cannot transfer from {0} to itself")]
    SameHolder(HolderRef),

    /// One of the legs could not be appended.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl TransferError {
    /// Returns the error code for callers.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::SameHolder(_) => "SAME_HOLDER",
            Self::Ledger(err) => err.error_code(),
        }
    }

    /// Returns true if this error is a validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        match self {
            Self::NonPositiveAmount(_) | Self::SameHolder(_) => true,
            Self::Ledger(err) => err.is_validation(),
        }
    }
}

impl From<TransferError> for AppError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::Ledger(inner) => inner.into(),
            other => Self::Validation(other.to_string()),
        }
    }
}
