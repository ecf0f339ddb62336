//! Balance reconciler.

use moneybox_shared::types::money::{DEFAULT_TOLERANCE, within_tolerance};
use rayon::prelude::*;
use rust_decimal::Decimal;

use super::error::ReconcileError;
use super::types::{HolderFailure, ReconcileOutcome, ReconciliationReport};
use crate::ledger::{HolderAccount, HolderRef, LedgerBook, LedgerMovement, RunningBalance};

/// Recomputes cached balances from the ledger.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    tolerance: Decimal,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl Reconciler {
    /// Creates a reconciler accepting drift up to `tolerance`.
    #[must_use]
    pub fn new(tolerance: Decimal) -> Self {
        Self {
            tolerance: tolerance.abs(),
        }
    }

    /// Accepted drift.
    #[must_use]
    pub fn tolerance(&self) -> Decimal {
        self.tolerance
    }

    /// Baseline plus the movements, folded in the given (chronological) order.
    ///
    /// # Errors
    ///
    /// Returns `Overflow` if the sum leaves the decimal range.
    pub fn recompute(
        holder: &HolderAccount,
        movements: &[&LedgerMovement],
    ) -> Result<Decimal, ReconcileError> {
        let changes: Vec<Decimal> = movements.iter().map(|m| m.amount).collect();
        let chain = RunningBalance::chain(holder.baseline, &changes)
            .ok_or(ReconcileError::Overflow(holder.holder))?;
        Ok(chain
            .last()
            .map_or(holder.baseline, |last| last.current_balance))
    }

    /// Compares a holder's cached balance with its ledger without changing
    /// anything.
    ///
    /// # Errors
    ///
    /// Returns `Overflow` if the ledger sum leaves the decimal range.
    pub fn evaluate(
        &self,
        holder: &HolderAccount,
        movements: &[&LedgerMovement],
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let recomputed = Self::recompute(holder, movements)?;
        Ok(ReconcileOutcome {
            holder: holder.holder,
            holder_name: holder.name.clone(),
            previous_cached: holder.cached_balance,
            recomputed,
            corrected: !within_tolerance(holder.cached_balance, recomputed, self.tolerance),
        })
    }

    /// Reconciles one holder, overwriting its cached balance on drift.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown holder or an overflowing ledger.
    pub fn reconcile(
        &self,
        book: &mut LedgerBook,
        holder: HolderRef,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let account = book
            .holder(holder)
            .ok_or(crate::ledger::LedgerError::HolderNotFound(holder))?;
        let outcome = self.evaluate(account, &book.chronological(holder))?;
        if outcome.corrected {
            book.set_cached_balance(holder, outcome.recomputed)?;
        }
        Ok(outcome)
    }

    /// Evaluates every holder in parallel over an immutable book, bank
    /// accounts first, then boxes. Each holder's failure is isolated.
    #[must_use]
    pub fn assess_all(&self, book: &LedgerBook) -> Vec<Result<ReconcileOutcome, HolderFailure>> {
        let grouped = book.movements_by_holder();
        let holders: Vec<&HolderAccount> = book.holders().collect();

        holders
            .par_iter()
            .map(|account| {
                let movements = grouped
                    .get(&account.holder)
                    .map_or(&[][..], Vec::as_slice);
                self.evaluate(account, movements)
                    .map_err(|err| HolderFailure {
                        holder: account.holder,
                        holder_name: account.name.clone(),
                        reason: err.to_string(),
                    })
            })
            .collect()
    }

    /// Folds assessments into a report.
    #[must_use]
    pub fn report(assessments: &[Result<ReconcileOutcome, HolderFailure>]) -> ReconciliationReport {
        let mut report = ReconciliationReport {
            checked: assessments.len(),
            ..ReconciliationReport::default()
        };
        for assessment in assessments {
            match assessment {
                Ok(outcome) => report.corrections.extend(outcome.correction_line()),
                Err(failure) => report.failures.push(failure.clone()),
            }
        }
        report
    }

    /// Reconciles every holder: evaluation runs in parallel, corrections are
    /// applied one holder at a time.
    pub fn reconcile_all(&self, book: &mut LedgerBook) -> ReconciliationReport {
        let assessments = self.assess_all(book);
        let mut report = Self::report(&assessments);

        let mut applied = Vec::with_capacity(report.corrections.len());
        for line in report.corrections.drain(..) {
            match book.set_cached_balance(line.holder, line.after) {
                Ok(()) => applied.push(line),
                Err(err) => report.failures.push(HolderFailure {
                    holder: line.holder,
                    holder_name: line.holder_name,
                    reason: err.to_string(),
                }),
            }
        }
        report.corrections = applied;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{MovementKind, NewMovement};
    use chrono::{NaiveDate, Utc};
    use moneybox_shared::types::{BankAccountId, BoxId};
    use rust_decimal_macros::dec;

    fn account(name: &str, holder: HolderRef, baseline: Decimal) -> HolderAccount {
        HolderAccount {
            holder,
            name: name.to_string(),
            baseline,
            cached_balance: baseline,
            is_active: true,
        }
    }

    fn movement(holder: HolderRef, amount: Decimal) -> NewMovement {
        NewMovement {
            holder,
            amount,
            kind: MovementKind::Income,
            description: "test".to_string(),
            effective_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            instance_id: None,
            transfer_id: None,
        }
    }

    #[test]
    fn test_consistent_holder_not_corrected() {
        let holder = HolderRef::BankAccount(BankAccountId::new());
        let mut book = LedgerBook::new();
        book.open(account("Checking", holder, dec!(1000.00))).unwrap();
        book.append(movement(holder, dec!(500.00))).unwrap();
        book.append(movement(holder, dec!(-200.00))).unwrap();

        let outcome = Reconciler::default().reconcile(&mut book, holder).unwrap();

        assert!(!outcome.corrected);
        assert_eq!(outcome.recomputed, dec!(1300.00));
        assert_eq!(outcome.correction_line(), None);
    }

    #[test]
    fn test_drift_within_tolerance_left_alone() {
        let holder = HolderRef::BankAccount(BankAccountId::new());
        let mut book = LedgerBook::new();
        book.open(account("Checking", holder, dec!(100.00))).unwrap();
        book.set_cached_balance(holder, dec!(100.01)).unwrap();

        let outcome = Reconciler::default().reconcile(&mut book, holder).unwrap();

        assert!(!outcome.corrected);
        assert_eq!(book.cached_balance(holder).unwrap(), dec!(100.01));
    }

    #[test]
    fn test_drift_corrected_and_reported() {
        let holder = HolderRef::BankAccount(BankAccountId::new());
        let mut book = LedgerBook::new();
        book.open(account("Checking", holder, dec!(1000.00))).unwrap();
        book.append(movement(holder, dec!(300.00))).unwrap();
        book.set_cached_balance(holder, dec!(1250.00)).unwrap();

        let outcome = Reconciler::default().reconcile(&mut book, holder).unwrap();

        assert!(outcome.corrected);
        assert_eq!(book.cached_balance(holder).unwrap(), dec!(1300.00));
        assert_eq!(
            outcome.correction_line().unwrap().to_string(),
            "Checking: 1250.00 -> 1300.00"
        );
    }

    #[test]
    fn test_unknown_holder() {
        let holder = HolderRef::Box(BoxId::new());
        let mut book = LedgerBook::new();
        assert!(matches!(
            Reconciler::default().reconcile(&mut book, holder),
            Err(ReconcileError::Ledger(_))
        ));
    }

    #[test]
    fn test_reconcile_all_isolates_failures() {
        let healthy = HolderRef::BankAccount(BankAccountId::new());
        let broken = HolderRef::BankAccount(BankAccountId::new());
        let drifted = HolderRef::Box(BoxId::new());

        let mut drifted_account = account("Vacation", drifted, Decimal::ZERO);
        drifted_account.cached_balance = dec!(10.00);
        let holders = vec![
            account("Checking", healthy, dec!(50.00)),
            account("Overflow", broken, Decimal::MAX),
            drifted_account,
        ];
        let movements = vec![
            crate::ledger::LedgerMovement::record(movement(broken, dec!(1)), Utc::now()),
            crate::ledger::LedgerMovement::record(movement(drifted, dec!(25.00)), Utc::now()),
        ];
        let mut book = LedgerBook::from_snapshot(holders, movements);

        let report = Reconciler::default().reconcile_all(&mut book);

        assert_eq!(report.checked, 3);
        assert_eq!(report.corrections.len(), 1);
        assert_eq!(report.corrections[0].to_string(), "Vacation: 10.00 -> 25.00");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].holder, broken);
        assert_eq!(book.cached_balance(drifted).unwrap(), dec!(25.00));
        assert_eq!(book.cached_balance(healthy).unwrap(), dec!(50.00));
    }

    #[test]
    fn test_accounts_reported_before_boxes() {
        let money_box = HolderRef::Box(BoxId::new());
        let bank = HolderRef::BankAccount(BankAccountId::new());
        let mut box_account = account("Box", money_box, Decimal::ZERO);
        box_account.cached_balance = dec!(5);
        let mut bank_account = account("Bank", bank, Decimal::ZERO);
        bank_account.cached_balance = dec!(5);
        let mut book = LedgerBook::from_snapshot(vec![box_account, bank_account], vec![]);

        let report = Reconciler::default().reconcile_all(&mut book);

        let names: Vec<&str> = report
            .corrections
            .iter()
            .map(|c| c.holder_name.as_str())
            .collect();
        assert_eq!(names, vec!["Bank", "Box"]);
    }
}
