//! Reconciliation error types.

use moneybox_shared::AppError;
use thiserror::Error;

use crate::ledger::{HolderRef, LedgerError};

/// Errors raised while reconciling a holder.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// Ledger sum exceeded decimal range.
    #[error("Ledger sum of {0} overflowed")]
    Overflow(HolderRef),

    /// Ledger lookup failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ReconcileError {
    /// Returns the error code for callers.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Overflow(_) => "LEDGER_OVERFLOW",
            Self::Ledger(err) => err.error_code(),
        }
    }
}

impl From<ReconcileError> for AppError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Ledger(inner) => inner.into(),
            ReconcileError::Overflow(_) => Self::Internal(err.to_string()),
        }
    }
}
