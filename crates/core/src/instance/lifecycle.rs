//! Instance lifecycle transitions.
//!
//! Transitions are pure: they return the updated instance together with the
//! ledger movements and invoice recomputations the caller must apply in the
//! same unit of work.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use moneybox_shared::types::{InstanceId, MonthYear};
use rust_decimal::Decimal;

use super::error::InstanceError;
use super::types::{
    Confirmation, Deletion, InstanceStatus, ManualInstanceInput, PaymentMethod, PostingTarget,
    Reversion, TransactionInstance,
};
use crate::classification::AccountType;
use crate::invoice::InvoiceSettled;
use crate::ledger::{HolderRef, LedgerMovement, MovementKind, NewMovement};

/// Instance lifecycle service.
pub struct InstanceLifecycle;

impl InstanceLifecycle {
    /// Resolves where a confirmed instance lands.
    ///
    /// # Errors
    ///
    /// Returns `MissingPaymentSource` if the instance has neither a card nor
    /// a bank account or box.
    pub fn posting_target(instance: &TransactionInstance) -> Result<PostingTarget, InstanceError> {
        if instance.payment_method == PaymentMethod::Card {
            return instance
                .invoice_key()
                .map(PostingTarget::Invoice)
                .ok_or(InstanceError::MissingPaymentSource(instance.id));
        }
        instance
            .holder()
            .map(PostingTarget::Holder)
            .ok_or(InstanceError::MissingPaymentSource(instance.id))
    }

    /// Confirms a pending instance with its actual amount.
    ///
    /// Holder-backed instances produce one movement (none when the actual
    /// amount is zero). Card instances produce no movement and instead name
    /// the invoice to recompute.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance is already confirmed, the amount is
    /// negative, or there is nowhere to post it.
    pub fn confirm(
        instance: &TransactionInstance,
        actual: Decimal,
        on: NaiveDate,
    ) -> Result<Confirmation, InstanceError> {
        if instance.is_confirmed() {
            return Err(InstanceError::AlreadyConfirmed(instance.id));
        }
        if actual < Decimal::ZERO {
            return Err(InstanceError::NegativeAmount(actual));
        }
        let target = Self::posting_target(instance)?;

        let mut confirmed = instance.clone();
        confirmed.mark_confirmed(actual, on);

        let (movement, invoice) = match target {
            PostingTarget::Invoice(key) => (None, Some(key)),
            PostingTarget::Holder(_) if actual.is_zero() => (None, None),
            PostingTarget::Holder(holder) => (
                Some(NewMovement {
                    holder,
                    amount: instance.account_type.signed(actual),
                    kind: movement_kind(instance.account_type),
                    description: instance.description.clone(),
                    effective_date: on,
                    instance_id: Some(instance.id),
                    transfer_id: None,
                }),
                None,
            ),
        };

        Ok(Confirmation {
            instance: confirmed,
            movement,
            invoice,
        })
    }

    /// Returns a confirmed instance to pending.
    ///
    /// `posted` holds every movement linked to the instance. For each holder
    /// with a non-zero net effect a compensating movement is produced, so
    /// the ledger stays append-only.
    ///
    /// # Errors
    ///
    /// Returns `NotConfirmed` if the instance is pending.
    pub fn unconfirm(
        instance: &TransactionInstance,
        posted: &[LedgerMovement],
        on: NaiveDate,
    ) -> Result<Reversion, InstanceError> {
        if !instance.is_confirmed() {
            return Err(InstanceError::NotConfirmed(instance.id));
        }

        let compensations = net_by_holder(instance.id, posted)
            .into_iter()
            .map(|(holder, net)| {
                let amount = -net;
                NewMovement {
                    holder,
                    amount,
                    kind: if amount.is_sign_positive() {
                        MovementKind::Income
                    } else {
                        MovementKind::Expense
                    },
                    description: format!("Reversal: {}", instance.description),
                    effective_date: on,
                    instance_id: Some(instance.id),
                    transfer_id: None,
                }
            })
            .collect();

        let mut reverted = instance.clone();
        reverted.mark_pending();

        Ok(Reversion {
            instance: reverted,
            compensations,
            invoice: instance.invoice_key(),
        })
    }

    /// Plans the deletion of an instance and its linked movements.
    #[must_use]
    pub fn delete(instance: &TransactionInstance, posted: &[LedgerMovement]) -> Deletion {
        Deletion {
            instance_id: instance.id,
            reversed: net_by_holder(instance.id, posted),
            invoice: instance.invoice_key(),
        }
    }

    /// Creates a pending ad-hoc instance.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a missing classification account, a
    /// non-positive amount, or a card combined with a bank account.
    pub fn create_manual(input: ManualInstanceInput) -> Result<TransactionInstance, InstanceError> {
        if input.account_id.is_none() {
            return Err(InstanceError::MissingAccount);
        }
        if input.expected_amount <= Decimal::ZERO {
            return Err(InstanceError::NonPositiveAmount);
        }
        if input.card_id.is_some() && input.bank_account_id.is_some() {
            return Err(InstanceError::ConflictingPaymentSource);
        }

        let payment_method = if input.card_id.is_some() {
            PaymentMethod::Card
        } else if input.bank_account_id.is_some() || input.box_id.is_some() {
            PaymentMethod::Account
        } else {
            PaymentMethod::Undefined
        };

        Ok(TransactionInstance {
            id: InstanceId::new(),
            template_id: None,
            invoice_id: None,
            paid_invoice_id: None,
            month_year: MonthYear::from_date(input.due_date),
            due_date: input.due_date,
            description: input.description,
            account_id: input.account_id,
            account_type: input.account_type,
            expected_amount: input.expected_amount,
            actual_amount: None,
            status: InstanceStatus::Pending,
            payment_method,
            bank_account_id: input.bank_account_id,
            card_id: input.card_id,
            box_id: input.box_id,
            confirmed_on: None,
        })
    }

    /// Builds the pending payment instance for a settled invoice.
    ///
    /// The instance is not posted; money moves only when it is confirmed.
    #[must_use]
    pub fn from_settlement(event: &InvoiceSettled) -> TransactionInstance {
        TransactionInstance {
            id: InstanceId::new(),
            template_id: None,
            invoice_id: None,
            paid_invoice_id: Some(event.invoice_id),
            month_year: MonthYear::from_date(event.paid_on),
            due_date: event.paid_on,
            description: format!("Invoice payment {} {}", event.card_name, event.month_year),
            account_id: None,
            account_type: AccountType::Expense,
            expected_amount: event.paid_amount,
            actual_amount: None,
            status: InstanceStatus::Pending,
            payment_method: PaymentMethod::Account,
            bank_account_id: Some(event.paying_account),
            card_id: None,
            box_id: None,
            confirmed_on: None,
        }
    }
}

fn movement_kind(account_type: AccountType) -> MovementKind {
    match account_type {
        AccountType::Income => MovementKind::Income,
        AccountType::Expense => MovementKind::Expense,
    }
}

/// Net amount per holder of the movements linked to `instance_id`.
fn net_by_holder(instance_id: InstanceId, posted: &[LedgerMovement]) -> Vec<(HolderRef, Decimal)> {
    let mut net: BTreeMap<HolderRef, Decimal> = BTreeMap::new();
    for movement in posted
        .iter()
        .filter(|m| m.instance_id == Some(instance_id))
    {
        *net.entry(movement.holder).or_default() += movement.amount;
    }
    net.into_iter().filter(|(_, sum)| !sum.is_zero()).collect()
}
