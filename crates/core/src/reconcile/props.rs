//! Property-based tests for the reconciler.
//!
//! - reconcile_all twice in a row: the second run reports no corrections
//! - after reconcile_all, every cached balance matches baseline plus ledger sum

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use moneybox_shared::types::{BankAccountId, BoxId};

use super::service::Reconciler;
use crate::ledger::{HolderAccount, HolderRef, LedgerBook, LedgerMovement, MovementKind, NewMovement};

fn amount() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// A holder with an arbitrary (possibly drifted) cached balance and its movements.
fn holder_with_ledger() -> impl Strategy<Value = (bool, Decimal, Decimal, Vec<Decimal>)> {
    (
        any::<bool>(),
        amount(),
        amount(),
        prop::collection::vec(amount(), 0..10),
    )
}

fn build_book(shapes: Vec<(bool, Decimal, Decimal, Vec<Decimal>)>) -> LedgerBook {
    let mut holders = Vec::new();
    let mut movements = Vec::new();
    for (index, (is_box, baseline, cached, amounts)) in shapes.into_iter().enumerate() {
        let holder = if is_box {
            HolderRef::Box(BoxId::new())
        } else {
            HolderRef::BankAccount(BankAccountId::new())
        };
        holders.push(HolderAccount {
            holder,
            name: format!("holder {index}"),
            baseline,
            cached_balance: cached,
            is_active: true,
        });
        for amount in amounts.into_iter().filter(|a| !a.is_zero()) {
            movements.push(LedgerMovement::record(
                NewMovement {
                    holder,
                    amount,
                    kind: MovementKind::Income,
                    description: "generated".to_string(),
                    effective_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                    instance_id: None,
                    transfer_id: None,
                },
                Utc::now(),
            ));
        }
    }
    LedgerBook::from_snapshot(holders, movements)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Reconciliation is idempotent.
    #[test]
    fn prop_reconcile_all_idempotent(
        shapes in prop::collection::vec(holder_with_ledger(), 1..8),
    ) {
        let mut book = build_book(shapes);
        let reconciler = Reconciler::default();

        let first = reconciler.reconcile_all(&mut book);
        let second = reconciler.reconcile_all(&mut book);

        prop_assert!(first.failures.is_empty());
        prop_assert!(second.is_clean());
        prop_assert_eq!(second.checked, first.checked);
    }

    /// After reconciliation the balance invariant holds within tolerance.
    #[test]
    fn prop_reconcile_all_restores_invariant(
        shapes in prop::collection::vec(holder_with_ledger(), 1..8),
    ) {
        let mut book = build_book(shapes);
        let reconciler = Reconciler::default();

        reconciler.reconcile_all(&mut book);

        for account in book.holders() {
            let expected = account.baseline + book.sum(account.holder);
            prop_assert!((account.cached_balance - expected).abs() <= reconciler.tolerance());
        }
    }
}
