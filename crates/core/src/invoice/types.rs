//! Card invoice domain types.

use chrono::NaiveDate;
use moneybox_shared::types::{BankAccountId, CardId, InvoiceId, MonthYear};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::instance::TransactionInstance;

/// A credit card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    /// Card ID.
    pub id: CardId,
    /// Display name.
    pub name: String,
    /// Day of the month the statement closes.
    pub closing_day: u32,
    /// Day of the month the statement is due.
    pub due_day: u32,
    /// Whether the card is active.
    pub is_active: bool,
}

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Still collecting charges.
    Open,
    /// Settled.
    Paid,
}

impl InvoiceStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Paid => "paid",
        }
    }
}

/// One invoice per card and billing month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInvoice {
    /// Invoice ID.
    pub id: InvoiceId,
    /// Card.
    pub card_id: CardId,
    /// Billing month.
    pub month_year: MonthYear,
    /// Best-known total of the constituent instances.
    pub total_amount: Decimal,
    /// Status.
    pub status: InvoiceStatus,
    /// Statement closing date.
    pub closing_date: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Date the invoice was settled.
    pub paid_date: Option<NaiveDate>,
    /// Account chosen to pay the invoice.
    pub paying_account: Option<BankAccountId>,
}

impl CardInvoice {
    /// Returns true if the invoice is paid.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }
}

/// Settlement parameters.
#[derive(Debug, Clone, Copy)]
pub struct SettleRequest {
    /// Account that will pay the invoice.
    pub paying_account: BankAccountId,
    /// Settlement date.
    pub paid_on: NaiveDate,
    /// Amount being paid.
    pub paid_amount: Decimal,
}

/// Emitted when an invoice moves from open to paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSettled {
    /// Settled invoice.
    pub invoice_id: InvoiceId,
    /// Card of the invoice.
    pub card_id: CardId,
    /// Card display name.
    pub card_name: String,
    /// Billing month.
    pub month_year: MonthYear,
    /// Paying account.
    pub paying_account: BankAccountId,
    /// Amount paid.
    pub paid_amount: Decimal,
    /// Settlement date.
    pub paid_on: NaiveDate,
}

/// Result of settling an invoice.
#[derive(Debug, Clone)]
pub struct Settlement {
    /// The invoice after settlement.
    pub invoice: CardInvoice,
    /// Constituent instances that were pending and are now confirmed.
    pub confirmed: Vec<TransactionInstance>,
    /// Event for the instance factory.
    pub event: InvoiceSettled,
}
