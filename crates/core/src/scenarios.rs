//! End-to-end scenarios across the ledger, schedule, instance, invoice,
//! transfer and reconcile modules, run against an in-memory book.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use moneybox_shared::types::{AccountId, BankAccountId, BoxId, CardId, TemplateId};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::classification::AccountType;
use crate::instance::{InstanceLifecycle, InstanceStatus, ManualInstanceInput, TransactionInstance};
use crate::invoice::{Card, InvoiceService, InvoiceStatus, SettleRequest};
use crate::ledger::{HolderAccount, HolderRef, LedgerBook, LedgerError};
use crate::reconcile::Reconciler;
use crate::schedule::{PaymentSource, ProvisionedTemplate, Recurrence, TemplateExpander};
use crate::transfer::{TransferError, TransferRequest, TransferService};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn open_account(book: &mut LedgerBook, name: &str, initial: Decimal) -> BankAccountId {
    let id = BankAccountId::new();
    book.open(HolderAccount {
        holder: HolderRef::BankAccount(id),
        name: name.to_string(),
        baseline: initial,
        cached_balance: initial,
        is_active: true,
    })
    .unwrap();
    id
}

fn open_box(book: &mut LedgerBook, name: &str) -> BoxId {
    let id = BoxId::new();
    book.open(HolderAccount {
        holder: HolderRef::Box(id),
        name: name.to_string(),
        baseline: Decimal::ZERO,
        cached_balance: Decimal::ZERO,
        is_active: true,
    })
    .unwrap();
    id
}

fn manual(
    account_type: AccountType,
    amount: Decimal,
    bank_account_id: Option<BankAccountId>,
    card_id: Option<CardId>,
) -> TransactionInstance {
    InstanceLifecycle::create_manual(ManualInstanceInput {
        description: "Manual entry".to_string(),
        account_id: Some(AccountId::new()),
        account_type,
        expected_amount: amount,
        due_date: date(2025, 3, 10),
        bank_account_id,
        card_id,
        box_id: None,
    })
    .unwrap()
}

/// Confirms an instance and applies the resulting movement to the book.
fn confirm_into(
    book: &mut LedgerBook,
    instance: &TransactionInstance,
    actual: Decimal,
) -> TransactionInstance {
    let confirmation = InstanceLifecycle::confirm(instance, actual, date(2025, 3, 11)).unwrap();
    if let Some(movement) = confirmation.movement {
        book.append(movement).unwrap();
    }
    confirmation.instance
}

#[test]
fn scenario_confirmed_income_and_expense() {
    let mut book = LedgerBook::new();
    let account = open_account(&mut book, "Checking", dec!(1000.00));
    let holder = HolderRef::BankAccount(account);

    let income = manual(AccountType::Income, dec!(500.00), Some(account), None);
    let expense = manual(AccountType::Expense, dec!(200.00), Some(account), None);
    confirm_into(&mut book, &income, dec!(500.00));
    confirm_into(&mut book, &expense, dec!(200.00));

    assert_eq!(book.cached_balance(holder).unwrap(), dec!(1300.00));
    let outcome = Reconciler::default().reconcile(&mut book, holder).unwrap();
    assert!(!outcome.corrected);
}

#[test]
fn scenario_monthly_template_schedule() {
    let template = ProvisionedTemplate {
        id: TemplateId::new(),
        account_id: Some(AccountId::new()),
        account_type: AccountType::Expense,
        description: "Internet".to_string(),
        expected_amount: dec!(99.90),
        payment_source: None,
        target_box: None,
        recurrence: Recurrence::Monthly,
        start_date: date(2025, 1, 1),
        end_date: None,
        current_installment: 1,
        excluded: BTreeSet::new(),
    };

    for month in 1..=12 {
        assert!(TemplateExpander::should_materialize(&template, month, 2025).unwrap());
        assert!(TemplateExpander::should_materialize(&template, month, 2026).unwrap());
        assert!(TemplateExpander::should_materialize(&template, month, 2030).unwrap());
    }
}

#[test]
fn scenario_installment_materializes_once() {
    let template = ProvisionedTemplate {
        id: TemplateId::new(),
        account_id: Some(AccountId::new()),
        account_type: AccountType::Expense,
        description: "Sofa".to_string(),
        expected_amount: dec!(400.00),
        payment_source: Some(PaymentSource::Card(CardId::new())),
        target_box: None,
        recurrence: Recurrence::Installment { count: 3 },
        start_date: date(2025, 1, 20),
        end_date: None,
        current_installment: 1,
        excluded: BTreeSet::new(),
    };

    assert!(TemplateExpander::should_materialize(&template, 1, 2025).unwrap());
    assert!(!TemplateExpander::should_materialize(&template, 2, 2025).unwrap());
    assert!(!TemplateExpander::should_materialize(&template, 3, 2025).unwrap());
}

#[test]
fn scenario_card_confirmation_touches_only_invoice() {
    let mut book = LedgerBook::new();
    let account = open_account(&mut book, "Checking", dec!(1000.00));
    let card = Card {
        id: CardId::new(),
        name: "Visa".to_string(),
        closing_day: 25,
        due_day: 5,
        is_active: true,
    };

    let charge = manual(AccountType::Expense, dec!(100.00), None, Some(card.id));
    let mut confirmed = confirm_into(&mut book, &charge, dec!(90.00));
    let invoice = InvoiceService::on_transaction_posted(None, &card, &mut confirmed, &[]).unwrap();

    assert_eq!(invoice.total_amount, dec!(90.00));
    assert!(book.movements().is_empty());
    assert_eq!(
        book.cached_balance(HolderRef::BankAccount(account)).unwrap(),
        dec!(1000.00)
    );
}

#[test]
fn scenario_settlement_defers_payment() {
    let mut book = LedgerBook::new();
    let account = open_account(&mut book, "Checking", dec!(1000.00));
    let holder = HolderRef::BankAccount(account);
    let card = Card {
        id: CardId::new(),
        name: "Visa".to_string(),
        closing_day: 25,
        due_day: 5,
        is_active: true,
    };

    let mut a = manual(AccountType::Expense, dec!(150.00), None, Some(card.id));
    let invoice = InvoiceService::on_transaction_posted(None, &card, &mut a, &[]).unwrap();
    let mut b = manual(AccountType::Expense, dec!(100.00), None, Some(card.id));
    let invoice = InvoiceService::on_transaction_posted(
        Some(invoice),
        &card,
        &mut b,
        std::slice::from_ref(&a),
    )
    .unwrap();

    let settlement = InvoiceService::settle(
        &invoice,
        &card,
        &[a, b],
        SettleRequest {
            paying_account: account,
            paid_on: date(2025, 4, 5),
            paid_amount: dec!(250.00),
        },
    )
    .unwrap();
    let payment = InstanceLifecycle::from_settlement(&settlement.event);

    assert_eq!(settlement.invoice.status, InvoiceStatus::Paid);
    assert_eq!(payment.status, InstanceStatus::Pending);
    assert_eq!(payment.expected_amount, dec!(250.00));
    assert_eq!(book.cached_balance(holder).unwrap(), dec!(1000.00));

    confirm_into(&mut book, &payment, dec!(250.00));
    assert_eq!(book.cached_balance(holder).unwrap(), dec!(750.00));
}

#[test]
fn scenario_transfer_into_box() {
    let mut book = LedgerBook::new();
    let account = HolderRef::BankAccount(open_account(&mut book, "Checking", dec!(1000.00)));
    let money_box = HolderRef::Box(open_box(&mut book, "Vacation"));

    let request = TransferRequest {
        source: account,
        destination: money_box,
        amount: dec!(300.00),
        date: date(2025, 3, 1),
        description: "top-up".to_string(),
    };
    let (_, movements) = TransferService::execute(&mut book, &request).unwrap();

    assert_eq!(movements[0].amount, dec!(-300.00));
    assert_eq!(movements[1].amount, dec!(300.00));
    assert_eq!(book.cached_balance(account).unwrap(), dec!(700.00));
    assert_eq!(book.cached_balance(money_box).unwrap(), dec!(300.00));

    let missing = HolderRef::Box(BoxId::new());
    let failing = TransferRequest {
        destination: missing,
        ..request
    };
    assert_eq!(
        TransferService::execute(&mut book, &failing).unwrap_err(),
        TransferError::Ledger(LedgerError::HolderNotFound(missing))
    );
    assert_eq!(book.cached_balance(account).unwrap(), dec!(700.00));
}

#[test]
fn scenario_purge_resets_balances() {
    let mut book = LedgerBook::new();
    let account = HolderRef::BankAccount(open_account(&mut book, "Checking", dec!(1000.00)));
    let money_box = HolderRef::Box(open_box(&mut book, "Vacation"));
    TransferService::execute(
        &mut book,
        &TransferRequest {
            source: account,
            destination: money_box,
            amount: dec!(125.00),
            date: date(2025, 3, 1),
            description: "save".to_string(),
        },
    )
    .unwrap();

    book.purge();

    assert_eq!(book.cached_balance(account).unwrap(), dec!(1000.00));
    assert_eq!(book.cached_balance(money_box).unwrap(), Decimal::ZERO);
}

#[test]
fn scenario_unconfirm_then_delete() {
    let mut book = LedgerBook::new();
    let account = open_account(&mut book, "Checking", dec!(1000.00));
    let holder = HolderRef::BankAccount(account);

    let expense = manual(AccountType::Expense, dec!(80.00), Some(account), None);
    let confirmed = confirm_into(&mut book, &expense, dec!(80.00));
    assert_eq!(book.cached_balance(holder).unwrap(), dec!(920.00));

    let posted: Vec<_> = book
        .movements_for_instance(confirmed.id)
        .into_iter()
        .cloned()
        .collect();
    let reversion = InstanceLifecycle::unconfirm(&confirmed, &posted, date(2025, 3, 12)).unwrap();
    book.append_all(reversion.compensations).unwrap();
    assert_eq!(book.cached_balance(holder).unwrap(), dec!(1000.00));
    assert_eq!(book.movements().len(), 2);

    let reconfirmed = confirm_into(&mut book, &reversion.instance, dec!(85.00));
    assert_eq!(book.cached_balance(holder).unwrap(), dec!(915.00));

    book.remove_for_instance(reconfirmed.id);
    assert_eq!(book.cached_balance(holder).unwrap(), dec!(1000.00));
    assert!(book.movements().is_empty());
}

/// Operations applied by the balance-invariant property.
#[derive(Debug, Clone)]
enum Op {
    Confirm {
        income: bool,
        cents: i64,
        to_box: bool,
    },
    Transfer {
        cents: i64,
        to_box: bool,
    },
    Unconfirm(usize),
    Delete(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<bool>(), 1i64..100_000, any::<bool>()).prop_map(|(income, cents, to_box)| {
            Op::Confirm {
                income,
                cents,
                to_box,
            }
        }),
        (1i64..100_000, any::<bool>()).prop_map(|(cents, to_box)| Op::Transfer { cents, to_box }),
        (0usize..20).prop_map(Op::Unconfirm),
        (0usize..20).prop_map(Op::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Cached balance equals baseline plus ledger sum after any sequence of
    /// confirmations, transfers, reversals and deletions; a following
    /// reconcile_all finds nothing to correct.
    #[test]
    fn prop_balance_invariant_after_any_sequence(ops in prop::collection::vec(op(), 1..40)) {
        let mut book = LedgerBook::new();
        let account = open_account(&mut book, "Checking", dec!(1000.00));
        let box_id = open_box(&mut book, "Savings");
        let mut confirmed: Vec<TransactionInstance> = Vec::new();

        for op in ops {
            match op {
                Op::Confirm { income, cents, to_box } => {
                    let account_type = if income { AccountType::Income } else { AccountType::Expense };
                    let mut inst = manual(account_type, Decimal::new(cents, 2), Some(account), None);
                    if to_box {
                        inst.box_id = Some(box_id);
                    }
                    confirmed.push(confirm_into(&mut book, &inst, Decimal::new(cents, 2)));
                }
                Op::Transfer { cents, to_box } => {
                    let (source, destination) = if to_box {
                        (HolderRef::BankAccount(account), HolderRef::Box(box_id))
                    } else {
                        (HolderRef::Box(box_id), HolderRef::BankAccount(account))
                    };
                    TransferService::execute(&mut book, &TransferRequest {
                        source,
                        destination,
                        amount: Decimal::new(cents, 2),
                        date: date(2025, 3, 1),
                        description: "move".to_string(),
                    }).unwrap();
                }
                Op::Unconfirm(index) if !confirmed.is_empty() => {
                    let inst = confirmed.remove(index % confirmed.len());
                    let posted: Vec<_> = book
                        .movements_for_instance(inst.id)
                        .into_iter()
                        .cloned()
                        .collect();
                    let reversion = InstanceLifecycle::unconfirm(&inst, &posted, date(2025, 3, 20)).unwrap();
                    book.append_all(reversion.compensations).unwrap();
                }
                Op::Delete(index) if !confirmed.is_empty() => {
                    let inst = confirmed.remove(index % confirmed.len());
                    book.remove_for_instance(inst.id);
                }
                Op::Unconfirm(_) | Op::Delete(_) => {}
            }

            for holder in book.holders() {
                prop_assert_eq!(holder.cached_balance, holder.baseline + book.sum(holder.holder));
            }
        }

        prop_assert!(Reconciler::default().reconcile_all(&mut book).is_clean());
    }
}
