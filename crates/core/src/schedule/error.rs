//! Schedule error types.

use chrono::NaiveDate;
use moneybox_shared::AppError;
use moneybox_shared::types::{MonthYearError, TemplateId};
use thiserror::Error;

use crate::invoice::InvoiceError;

/// Errors raised while validating or expanding a template.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// Template has no classification account.
    #[error("Template {0} has no classification account")]
    MissingAccount(TemplateId),

    /// Expected amount is zero or negative.
    #[error("Template {0} must have a positive expected amount")]
    NonPositiveAmount(TemplateId),

    /// End date precedes start date.
    #[error("Template end date {end} is before its start date {start}")]
    EndBeforeStart {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Installment count is zero.
    #[error("Installment count must be at least 1")]
    InvalidInstallmentCount,

    /// Current installment outside 1..=count.
    #[error("Current installment {current} is outside 1..={count}")]
    InstallmentOutOfRange {
        /// Current installment.
        current: u32,
        /// Installment count.
        count: u32,
    },

    /// Month or year out of range.
    #[error(transparent)]
    InvalidMonth(#[from] MonthYearError),

    /// The materialized card charge cannot join its invoice.
    #[error(transparent)]
    Invoice(#[from] InvoiceError),
}

impl ScheduleError {
    /// Returns the error code for callers.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingAccount(_) => "MISSING_ACCOUNT",
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::EndBeforeStart { .. } => "END_BEFORE_START",
            Self::InvalidInstallmentCount => "INVALID_INSTALLMENT_COUNT",
            Self::InstallmentOutOfRange { .. } => "INSTALLMENT_OUT_OF_RANGE",
            Self::InvalidMonth(_) => "INVALID_MONTH",
            Self::Invoice(err) => err.error_code(),
        }
    }

    /// Returns true if this error is a validation failure. Only invoice
    /// business rules are not.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Invoice(err) => err.is_validation(),
            _ => true,
        }
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Invoice(err) => err.into(),
            other => Self::Validation(other.to_string()),
        }
    }
}
