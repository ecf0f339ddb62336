//! Decimal money helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` everywhere and cross boundaries
//! as decimal strings.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Number of decimal places kept for stored amounts.
pub const CENT_SCALE: u32 = 2;

/// Default tolerance when comparing a cached balance against the ledger sum.
pub const DEFAULT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Errors raised when parsing an amount supplied at the boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    /// The text is not a decimal number.
    #[error("'{0}' is not a valid decimal amount")]
    Malformed(String),

    /// The amount carries more precision than the ledger stores.
    #[error("amount {0} has more than 2 decimal places")]
    TooPrecise(String),
}

/// Rounds an amount to cents using Banker's Rounding.
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CENT_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Returns true if `a` and `b` differ by no more than `tolerance`.
#[must_use]
pub fn within_tolerance(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}

/// Parses a decimal string into an amount with at most two decimal places.
///
/// # Errors
///
/// Returns `AmountError` if the text is not a decimal or is too precise.
pub fn parse_amount(text: &str) -> Result<Decimal, AmountError> {
    let trimmed = text.trim();
    let amount =
        Decimal::from_str(trimmed).map_err(|_| AmountError::Malformed(trimmed.to_string()))?;
    if amount.normalize().scale() > CENT_SCALE {
        return Err(AmountError::TooPrecise(trimmed.to_string()));
    }
    Ok(amount)
}
