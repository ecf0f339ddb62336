//! Projection error types.

use moneybox_shared::AppError;
use moneybox_shared::types::MonthYear;
use thiserror::Error;

/// Errors raised by the projection engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectionError {
    /// Horizon outside the supported range.
    #[error("Months ahead must be between 1 and {max}, got {requested}")]
    InvalidHorizon {
        /// Requested horizon.
        requested: u32,
        /// Largest supported horizon.
        max: u32,
    },

    /// Projected balance exceeded decimal range.
    #[error("Projected balance overflowed in {0}")]
    Overflow(MonthYear),
}

impl ProjectionError {
    /// Returns the error code for callers.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidHorizon { .. } => "INVALID_HORIZON",
            Self::Overflow(_) => "PROJECTION_OVERFLOW",
        }
    }

    /// Returns true if this error is a validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidHorizon { .. })
    }
}

impl From<ProjectionError> for AppError {
    fn from(err: ProjectionError) -> Self {
        if err.is_validation() {
            Self::Validation(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}
