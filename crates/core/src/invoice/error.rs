//! Invoice error types.

use moneybox_shared::AppError;
use moneybox_shared::types::{CardId, InstanceId, InvoiceId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by invoice aggregation and settlement.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvoiceError {
    /// Invoice is already paid.
    #[error("Invoice {0} is already paid")]
    AlreadyPaid(InvoiceId),

    /// Payment amount must be positive.
    #[error("Payment amount must be positive, got {0}")]
    NonPositivePayment(Decimal),

    /// Instance is not paid by card.
    #[error("Instance {0} is not a card transaction")]
    NotCardInstance(InstanceId),

    /// Instance belongs to another card.
    #[error("Instance is charged to card {actual}, not {expected}")]
    CardMismatch {
        /// Card of the invoice.
        expected: CardId,
        /// Card of the instance.
        actual: CardId,
    },

    /// Invoice belongs to another card or month.
    #[error("Invoice {0} does not match the card and month of the instance")]
    InvoiceMismatch(InvoiceId),

    /// Closing or due day outside 1-31.
    #[error("Card days must be between 1 and 31, got {0}")]
    InvalidCardDay(u32),
}

impl InvoiceError {
    /// Returns the error code for callers.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyPaid(_) => "INVOICE_ALREADY_PAID",
            Self::NonPositivePayment(_) => "NON_POSITIVE_PAYMENT",
            Self::NotCardInstance(_) => "NOT_CARD_INSTANCE",
            Self::CardMismatch { .. } => "CARD_MISMATCH",
            Self::InvoiceMismatch(_) => "INVOICE_MISMATCH",
            Self::InvalidCardDay(_) => "INVALID_CARD_DAY",
        }
    }

    /// Returns true if this error is a validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NonPositivePayment(_) | Self::NotCardInstance(_) | Self::InvalidCardDay(_)
        )
    }
}

impl From<InvoiceError> for AppError {
    fn from(err: InvoiceError) -> Self {
        if err.is_validation() {
            Self::Validation(err.to_string())
        } else {
            Self::BusinessRule(err.to_string())
        }
    }
}
