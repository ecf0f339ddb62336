//! Cached balance reconciliation.
//!
//! Recomputes each holder's balance from its baseline and ledger movements
//! and overwrites the cached value when it drifts beyond the tolerance.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod props;

pub use error::ReconcileError;
pub use service::Reconciler;
pub use types::{CorrectionLine, HolderFailure, ReconcileOutcome, ReconciliationReport};
