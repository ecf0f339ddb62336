//! Reconciliation report types.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::ledger::HolderRef;

/// Result of reconciling one holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    /// Holder.
    pub holder: HolderRef,
    /// Holder display name.
    pub holder_name: String,
    /// Cached balance before reconciliation.
    pub previous_cached: Decimal,
    /// Baseline plus ledger sum.
    pub recomputed: Decimal,
    /// Whether the cached balance was overwritten.
    pub corrected: bool,
}

impl ReconcileOutcome {
    /// Correction line, if the holder was corrected.
    #[must_use]
    pub fn correction_line(&self) -> Option<CorrectionLine> {
        self.corrected.then(|| CorrectionLine {
            holder: self.holder,
            holder_name: self.holder_name.clone(),
            before: self.previous_cached,
            after: self.recomputed,
        })
    }
}

/// A cached balance that was corrected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectionLine {
    /// Holder.
    pub holder: HolderRef,
    /// Holder display name.
    pub holder_name: String,
    /// Cached balance before correction.
    pub before: Decimal,
    /// Cached balance after correction.
    pub after: Decimal,
}

impl fmt::Display for CorrectionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.holder_name, self.before, self.after)
    }
}

/// A holder that could not be reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HolderFailure {
    /// Holder.
    pub holder: HolderRef,
    /// Holder display name.
    pub holder_name: String,
    /// Specific reason.
    pub reason: String,
}

impl fmt::Display for HolderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.holder_name, self.reason)
    }
}

/// Report of a reconciliation run over many holders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    /// Number of holders examined.
    pub checked: usize,
    /// Corrections, bank accounts first, then boxes.
    pub corrections: Vec<CorrectionLine>,
    /// Holders that failed, isolated from the rest of the run.
    pub failures: Vec<HolderFailure>,
}

impl ReconciliationReport {
    /// Returns true if nothing was corrected and nothing failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.corrections.is_empty() && self.failures.is_empty()
    }

    /// Human-readable lines: corrections first, then failures.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.corrections
            .iter()
            .map(ToString::to_string)
            .chain(self.failures.iter().map(ToString::to_string))
            .collect()
    }
}
