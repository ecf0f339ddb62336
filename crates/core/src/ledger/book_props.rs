//! Property-based tests for LedgerBook.
//!
//! - Cached balance always equals baseline plus the ledger sum
//! - A rejected batch leaves the book untouched
//! - Purge restores every holder to its baseline

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use moneybox_shared::types::{BankAccountId, BoxId, InstanceId};

use super::book::LedgerBook;
use super::types::{HolderAccount, HolderRef, MovementKind, NewMovement};

/// Strategy for non-zero signed amounts (-10,000.00 to 10,000.00).
fn non_zero_amount() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2)),
        (1i64..1_000_000i64).prop_map(|cents| Decimal::new(-cents, 2)),
    ]
}

/// Strategy for a holder baseline (0.00 to 5,000.00).
fn baseline() -> impl Strategy<Value = Decimal> {
    (0i64..500_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn open_book(account_baseline: Decimal) -> (LedgerBook, HolderRef, HolderRef) {
    let mut book = LedgerBook::new();
    let account = HolderRef::BankAccount(BankAccountId::new());
    let money_box = HolderRef::Box(BoxId::new());
    for (holder, base) in [(account, account_baseline), (money_box, Decimal::ZERO)] {
        book.open(HolderAccount {
            holder,
            name: holder.to_string(),
            baseline: base,
            cached_balance: base,
            is_active: true,
        })
        .unwrap();
    }
    (book, account, money_box)
}

fn make_movement(holder: HolderRef, amount: Decimal, day: u32) -> NewMovement {
    NewMovement {
        holder,
        amount,
        kind: MovementKind::Income,
        description: "generated".to_string(),
        effective_date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
        instance_id: None,
        transfer_id: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Cached balance equals baseline plus the sum of movements after any
    /// sequence of appends.
    #[test]
    fn prop_cached_balance_matches_ledger(
        base in baseline(),
        amounts in prop::collection::vec((non_zero_amount(), any::<bool>(), 1u32..=28), 1..30),
    ) {
        let (mut book, account, money_box) = open_book(base);
        for (amount, to_box, day) in amounts {
            let holder = if to_box { money_box } else { account };
            book.append(make_movement(holder, amount, day)).unwrap();
        }

        for holder in [account, money_box] {
            let view = book.holder(holder).unwrap();
            prop_assert_eq!(view.cached_balance, view.baseline + book.sum(holder));
        }
    }

    /// Removing an instance's movements keeps the cache consistent.
    #[test]
    fn prop_remove_for_instance_keeps_invariant(
        base in baseline(),
        linked in prop::collection::vec(non_zero_amount(), 1..10),
        other in prop::collection::vec(non_zero_amount(), 0..10),
    ) {
        let (mut book, account, _) = open_book(base);
        let instance_id = InstanceId::new();
        for amount in &linked {
            let mut movement = make_movement(account, *amount, 1);
            movement.instance_id = Some(instance_id);
            book.append(movement).unwrap();
        }
        for amount in &other {
            book.append(make_movement(account, *amount, 2)).unwrap();
        }

        let removed = book.remove_for_instance(instance_id);

        prop_assert_eq!(removed.len(), linked.len());
        let expected: Decimal = base + other.iter().copied().sum::<Decimal>();
        prop_assert_eq!(book.cached_balance(account).unwrap(), expected);
    }

    /// A batch containing an invalid movement leaves everything unchanged.
    #[test]
    fn prop_failed_batch_is_atomic(
        base in baseline(),
        valid in prop::collection::vec(non_zero_amount(), 1..10),
    ) {
        let (mut book, account, _) = open_book(base);
        let mut batch: Vec<NewMovement> = valid
            .iter()
            .map(|amount| make_movement(account, *amount, 3))
            .collect();
        batch.push(make_movement(account, Decimal::ZERO, 3));

        prop_assert!(book.append_all(batch).is_err());
        prop_assert_eq!(book.cached_balance(account).unwrap(), base);
        prop_assert!(book.movements().is_empty());
    }

    /// Purge restores every holder to its baseline.
    #[test]
    fn prop_purge_restores_baseline(
        base in baseline(),
        amounts in prop::collection::vec(non_zero_amount(), 0..20),
    ) {
        let (mut book, account, money_box) = open_book(base);
        for amount in amounts {
            book.append(make_movement(money_box, amount, 4)).unwrap();
        }

        book.purge();

        prop_assert_eq!(book.cached_balance(account).unwrap(), base);
        prop_assert_eq!(book.cached_balance(money_box).unwrap(), Decimal::ZERO);
        prop_assert!(book.movements().is_empty());
    }
}
