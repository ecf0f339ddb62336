//! Invoice service.

use moneybox_shared::types::{InvoiceId, MonthYear};
use rust_decimal::Decimal;

use super::error::InvoiceError;
use super::types::{Card, CardInvoice, InvoiceSettled, InvoiceStatus, SettleRequest, Settlement};
use crate::instance::TransactionInstance;

/// Invoice aggregation service.
pub struct InvoiceService;

impl InvoiceService {
    /// Checks that a card's closing and due days are valid days of a month.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCardDay` for a day outside 1-31.
    pub fn validate_card(card: &Card) -> Result<(), InvoiceError> {
        for day in [card.closing_day, card.due_day] {
            if !(1..=31).contains(&day) {
                return Err(InvoiceError::InvalidCardDay(day));
            }
        }
        Ok(())
    }

    /// Opens an empty invoice for a card and billing month.
    ///
    /// Closing and due days are clamped into the month.
    ///
    /// # Errors
    ///
    /// Returns an error if the card's days are invalid.
    pub fn open(card: &Card, month_year: MonthYear) -> Result<CardInvoice, InvoiceError> {
        Self::validate_card(card)?;
        Ok(CardInvoice {
            id: InvoiceId::new(),
            card_id: card.id,
            month_year,
            total_amount: Decimal::ZERO,
            status: InvoiceStatus::Open,
            closing_date: month_year.day_clamped(card.closing_day),
            due_date: month_year.day_clamped(card.due_day),
            paid_date: None,
            paying_account: None,
        })
    }

    /// Sum of best-known amounts of the instances referencing `invoice_id`.
    #[must_use]
    pub fn total_for(invoice_id: InvoiceId, instances: &[TransactionInstance]) -> Decimal {
        instances
            .iter()
            .filter(|i| i.invoice_id == Some(invoice_id))
            .map(TransactionInstance::best_known_amount)
            .sum()
    }

    /// Recomputes an open invoice's total from its instances.
    ///
    /// A paid invoice keeps the paid amount.
    pub fn recompute_total(invoice: &mut CardInvoice, instances: &[TransactionInstance]) -> Decimal {
        if !invoice.is_paid() {
            invoice.total_amount = Self::total_for(invoice.id, instances);
        }
        invoice.total_amount
    }

    /// Attaches a card instance to its invoice and recomputes the total.
    ///
    /// Called when a card instance is created, pending at its expected
    /// amount, and again when it is confirmed at its actual amount.
    ///
    /// `existing` is the stored invoice for the instance's card and month, if
    /// any; otherwise one is opened. `siblings` are the other instances of
    /// that invoice. The instance's invoice reference is rewritten, which
    /// also reattaches instances whose previous invoice is gone.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance is not a card instance of `card`,
    /// `existing` is for another card or month, or a new charge would land
    /// on a paid invoice.
    pub fn on_transaction_posted(
        existing: Option<CardInvoice>,
        card: &Card,
        instance: &mut TransactionInstance,
        siblings: &[TransactionInstance],
    ) -> Result<CardInvoice, InvoiceError> {
        let key = instance
            .invoice_key()
            .ok_or(InvoiceError::NotCardInstance(instance.id))?;
        if key.card_id != card.id {
            return Err(InvoiceError::CardMismatch {
                expected: card.id,
                actual: key.card_id,
            });
        }

        let mut invoice = match existing {
            Some(invoice) => invoice,
            None => Self::open(card, key.month_year)?,
        };
        if invoice.card_id != key.card_id || invoice.month_year != key.month_year {
            return Err(InvoiceError::InvoiceMismatch(invoice.id));
        }
        if invoice.is_paid() && instance.invoice_id != Some(invoice.id) {
            return Err(InvoiceError::AlreadyPaid(invoice.id));
        }

        instance.invoice_id = Some(invoice.id);

        let mut members: Vec<TransactionInstance> = siblings
            .iter()
            .filter(|s| s.id != instance.id)
            .cloned()
            .collect();
        members.push(instance.clone());
        Self::recompute_total(&mut invoice, &members);

        Ok(invoice)
    }

    /// Settles an open invoice.
    ///
    /// The invoice becomes paid with `total_amount = paid_amount`, every
    /// pending constituent instance is confirmed at its best-known amount
    /// and an [`InvoiceSettled`] event is returned. No ledger movement is
    /// produced here.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice is already paid, the amount is not
    /// positive, or the card does not own the invoice.
    pub fn settle(
        invoice: &CardInvoice,
        card: &Card,
        instances: &[TransactionInstance],
        request: SettleRequest,
    ) -> Result<Settlement, InvoiceError> {
        if invoice.is_paid() {
            return Err(InvoiceError::AlreadyPaid(invoice.id));
        }
        if request.paid_amount <= Decimal::ZERO {
            return Err(InvoiceError::NonPositivePayment(request.paid_amount));
        }
        if invoice.card_id != card.id {
            return Err(InvoiceError::CardMismatch {
                expected: invoice.card_id,
                actual: card.id,
            });
        }

        let confirmed: Vec<TransactionInstance> = instances
            .iter()
            .filter(|i| i.invoice_id == Some(invoice.id) && !i.is_confirmed())
            .map(|i| {
                let mut inst = i.clone();
                let amount = inst.actual_amount.unwrap_or(inst.expected_amount);
                inst.mark_confirmed(amount, request.paid_on);
                inst
            })
            .collect();

        let mut paid = invoice.clone();
        paid.status = InvoiceStatus::Paid;
        paid.paid_date = Some(request.paid_on);
        paid.paying_account = Some(request.paying_account);
        paid.total_amount = request.paid_amount;

        let event = InvoiceSettled {
            invoice_id: paid.id,
            card_id: card.id,
            card_name: card.name.clone(),
            month_year: paid.month_year,
            paying_account: request.paying_account,
            paid_amount: request.paid_amount,
            paid_on: request.paid_on,
        };

        Ok(Settlement {
            invoice: paid,
            confirmed,
            event,
        })
    }
}
