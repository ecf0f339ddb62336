//! Transaction instance domain types.

use chrono::NaiveDate;
use moneybox_shared::types::{
    AccountId, BankAccountId, BoxId, CardId, InstanceId, InvoiceId, MonthYear, TemplateId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::classification::AccountType;
use crate::ledger::{HolderRef, NewMovement};

/// Instance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    /// Expected but not yet confirmed.
    Pending,
    /// Amount fixed and posted.
    Confirmed,
}

impl InstanceStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
        }
    }
}

/// How an instance is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Paid from (or received into) a bank account or box.
    Account,
    /// Charged to a card; reaches the bank account through the invoice.
    Card,
    /// Payment source still to be defined.
    Undefined,
}

impl PaymentMethod {
    /// Returns the string representation of the method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Card => "card",
            Self::Undefined => "undefined",
        }
    }
}

/// A month-scoped transaction, pending or confirmed.
///
/// Amounts are positive magnitudes; `account_type` gives the direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInstance {
    /// Instance ID.
    pub id: InstanceId,
    /// Originating template, if materialized from one.
    pub template_id: Option<TemplateId>,
    /// Card invoice this instance belongs to.
    pub invoice_id: Option<InvoiceId>,
    /// Invoice this instance pays, for settlement payment instances.
    pub paid_invoice_id: Option<InvoiceId>,
    /// Month the instance is scoped to.
    pub month_year: MonthYear,
    /// Date the instance falls due.
    pub due_date: NaiveDate,
    /// Description shown to the user.
    pub description: String,
    /// Classification account.
    pub account_id: Option<AccountId>,
    /// Direction of the money flow.
    pub account_type: AccountType,
    /// Planned amount.
    pub expected_amount: Decimal,
    /// Amount fixed at confirmation.
    pub actual_amount: Option<Decimal>,
    /// Lifecycle status.
    pub status: InstanceStatus,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Bank account paying or receiving.
    pub bank_account_id: Option<BankAccountId>,
    /// Card charged.
    pub card_id: Option<CardId>,
    /// Target box.
    pub box_id: Option<BoxId>,
    /// Date the instance was confirmed.
    pub confirmed_on: Option<NaiveDate>,
}

impl TransactionInstance {
    /// Returns true if the instance is confirmed.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.status == InstanceStatus::Confirmed
    }

    /// Best-known amount: actual if confirmed, expected otherwise.
    #[must_use]
    pub fn best_known_amount(&self) -> Decimal {
        match (self.status, self.actual_amount) {
            (InstanceStatus::Confirmed, Some(actual)) => actual,
            _ => self.expected_amount,
        }
    }

    /// Best-known amount with the sign of the money flow applied.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.account_type.signed(self.best_known_amount())
    }

    /// Holder whose balance this instance affects directly, if any.
    ///
    /// Card instances never affect a holder directly. Otherwise a target box
    /// takes precedence over the bank account.
    #[must_use]
    pub fn holder(&self) -> Option<HolderRef> {
        if self.payment_method == PaymentMethod::Card {
            return None;
        }
        self.box_id
            .map(HolderRef::Box)
            .or_else(|| self.bank_account_id.map(HolderRef::BankAccount))
    }

    /// Invoice key of a card instance.
    #[must_use]
    pub fn invoice_key(&self) -> Option<InvoiceKey> {
        match (self.payment_method, self.card_id) {
            (PaymentMethod::Card, Some(card_id)) => Some(InvoiceKey {
                card_id,
                month_year: self.month_year,
            }),
            _ => None,
        }
    }

    /// Marks the instance confirmed with the given amount.
    pub fn mark_confirmed(&mut self, actual: Decimal, on: NaiveDate) {
        self.status = InstanceStatus::Confirmed;
        self.actual_amount = Some(actual);
        self.confirmed_on = Some(on);
    }

    /// Returns the instance to pending, clearing the actual amount.
    pub fn mark_pending(&mut self) {
        self.status = InstanceStatus::Pending;
        self.actual_amount = None;
        self.confirmed_on = None;
    }
}

/// Identifies the invoice of a card for a billing month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvoiceKey {
    /// Card.
    pub card_id: CardId,
    /// Billing month.
    pub month_year: MonthYear,
}

/// Where a confirmed instance lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingTarget {
    /// A ledger movement on a holder.
    Holder(HolderRef),
    /// The card invoice for the instance's month.
    Invoice(InvoiceKey),
}

/// Result of confirming an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// The instance after confirmation.
    pub instance: TransactionInstance,
    /// Movement to append, if the instance posts to a holder with a non-zero amount.
    pub movement: Option<NewMovement>,
    /// Invoice whose total must be recomputed, for card instances.
    pub invoice: Option<InvoiceKey>,
}

/// Result of returning a confirmed instance to pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reversion {
    /// The instance after reverting.
    pub instance: TransactionInstance,
    /// Compensating movements to append.
    pub compensations: Vec<NewMovement>,
    /// Invoice whose total must be recomputed, for card instances.
    pub invoice: Option<InvoiceKey>,
}

/// Result of deleting an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion {
    /// Deleted instance.
    pub instance_id: InstanceId,
    /// Net amount to subtract from each holder's cached balance.
    pub reversed: Vec<(HolderRef, Decimal)>,
    /// Invoice whose total must be recomputed, for card instances.
    pub invoice: Option<InvoiceKey>,
}

/// Input for an ad-hoc instance with no template.
#[derive(Debug, Clone)]
pub struct ManualInstanceInput {
    /// Description.
    pub description: String,
    /// Classification account.
    pub account_id: Option<AccountId>,
    /// Direction of the money flow.
    pub account_type: AccountType,
    /// Planned amount (positive).
    pub expected_amount: Decimal,
    /// Due date; the instance is scoped to its month.
    pub due_date: NaiveDate,
    /// Bank account paying or receiving.
    pub bank_account_id: Option<BankAccountId>,
    /// Card charged.
    pub card_id: Option<CardId>,
    /// Target box.
    pub box_id: Option<BoxId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn instance() -> TransactionInstance {
        TransactionInstance {
            id: InstanceId::new(),
            template_id: None,
            invoice_id: None,
            paid_invoice_id: None,
            month_year: MonthYear::new(2025, 3).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            description: "Groceries".to_string(),
            account_id: Some(AccountId::new()),
            account_type: AccountType::Expense,
            expected_amount: dec!(100.00),
            actual_amount: None,
            status: InstanceStatus::Pending,
            payment_method: PaymentMethod::Account,
            bank_account_id: Some(BankAccountId::new()),
            card_id: None,
            box_id: None,
            confirmed_on: None,
        }
    }

    #[test]
    fn test_best_known_amount() {
        let mut inst = instance();
        assert_eq!(inst.best_known_amount(), dec!(100.00));
        assert_eq!(inst.signed_amount(), dec!(-100.00));

        inst.mark_confirmed(dec!(90.00), inst.due_date);
        assert_eq!(inst.best_known_amount(), dec!(90.00));

        inst.mark_pending();
        assert_eq!(inst.best_known_amount(), dec!(100.00));
        assert_eq!(inst.actual_amount, None);
    }

    #[test]
    fn test_box_takes_precedence_over_account() {
        let mut inst = instance();
        let box_id = BoxId::new();
        inst.box_id = Some(box_id);
        assert_eq!(inst.holder(), Some(HolderRef::Box(box_id)));
    }

    #[test]
    fn test_card_instance_has_no_holder() {
        let mut inst = instance();
        let card_id = CardId::new();
        inst.payment_method = PaymentMethod::Card;
        inst.card_id = Some(card_id);

        assert_eq!(inst.holder(), None);
        assert_eq!(
            inst.invoice_key(),
            Some(InvoiceKey {
                card_id,
                month_year: inst.month_year
            })
        );
    }
}
