//! Instance error types.

use moneybox_shared::AppError;
use moneybox_shared::types::InstanceId;
use thiserror::Error;

/// Errors raised by the instance lifecycle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstanceError {
    /// Instance is already confirmed.
    #[error("Instance {0} is already confirmed")]
    AlreadyConfirmed(InstanceId),

    /// Instance is still pending.
    #[error("Instance {0} is not confirmed")]
    NotConfirmed(InstanceId),

    /// Actual amount is negative.
    #[error("Actual amount cannot be negative: {0}")]
    NegativeAmount(rust_decimal::Decimal),

    /// Expected amount is zero or negative.
    #[error("Expected amount must be positive")]
    NonPositiveAmount,

    /// No classification account.
    #[error("A classification account is required")]
    MissingAccount,

    /// No bank account, box or card to post to.
    #[error("Instance {0} has no payment source; choose a bank account, box or card first")]
    MissingPaymentSource(InstanceId),

    /// Both a card and a bank account were given.
    #[error("An instance is paid either by card or from a bank account, not both")]
    ConflictingPaymentSource,
}

impl InstanceError {
    /// Returns the error code for callers.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyConfirmed(_) => "ALREADY_CONFIRMED",
            Self::NotConfirmed(_) => "NOT_CONFIRMED",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::NonPositiveAmount => "NON_POSITIVE_AMOUNT",
            Self::MissingAccount => "MISSING_ACCOUNT",
            Self::MissingPaymentSource(_) => "MISSING_PAYMENT_SOURCE",
            Self::ConflictingPaymentSource => "CONFLICTING_PAYMENT_SOURCE",
        }
    }

    /// Returns true if this error is a validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::AlreadyConfirmed(_) | Self::NotConfirmed(_))
    }
}

impl From<InstanceError> for AppError {
    fn from(err: InstanceError) -> Self {
        if err.is_validation() {
            Self::Validation(err.to_string())
        } else {
            Self::BusinessRule(err.to_string())
        }
    }
}
