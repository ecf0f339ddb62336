//! Ledger error types.

use moneybox_shared::AppError;
use thiserror::Error;

use super::types::HolderRef;

/// Errors that can occur while appending to or reading the ledger.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Movement amount cannot be zero.
    #[error("Movement amount cannot be zero")]
    ZeroAmount,

    /// Holder is inactive and cannot receive movements.
    #[error("{0} is inactive and cannot receive movements")]
    HolderInactive(HolderRef),

    // ========== Lookup Errors ==========
    /// Holder not found.
    #[error("Balance holder not found: {0}")]
    HolderNotFound(HolderRef),

    /// Holder already registered.
    #[error("Balance holder already registered: {0}")]
    DuplicateHolder(HolderRef),

    // ========== Arithmetic Errors ==========
    /// Balance exceeded decimal range.
    #[error("Balance of {0} overflowed")]
    BalanceOverflow(HolderRef),
}

impl LedgerError {
    /// Returns the error code for callers.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::HolderInactive(_) => "HOLDER_INACTIVE",
            Self::HolderNotFound(_) => "HOLDER_NOT_FOUND",
            Self::DuplicateHolder(_) => "DUPLICATE_HOLDER",
            Self::BalanceOverflow(_) => "BALANCE_OVERFLOW",
        }
    }

    /// Returns true if this error is a validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ZeroAmount | Self::HolderInactive(_))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::HolderNotFound(_) => Self::NotFound(err.to_string()),
            LedgerError::DuplicateHolder(_) => Self::Conflict(err.to_string()),
            LedgerError::BalanceOverflow(_) => Self::Internal(err.to_string()),
            LedgerError::ZeroAmount | LedgerError::HolderInactive(_) => {
                Self::Validation(err.to_string())
            }
        }
    }
}
