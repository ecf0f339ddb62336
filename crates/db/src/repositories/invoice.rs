//! Invoice repository: card invoice totals and two-phase settlement.

use moneybox_core::instance::{InstanceLifecycle, InvoiceKey, TransactionInstance};
use moneybox_core::invoice::{
    Card, CardInvoice, InvoiceError, InvoiceService, SettleRequest, Settlement,
};
use moneybox_shared::types::{BankAccountId, CardId, InvoiceId};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DbErr, EntityTrait, QueryFilter, QuerySelect, TransactionTrait,
};
use tracing::info;

use super::instance::save_instance;
use super::mapping::{self, MappingError};
use crate::entities::{bank_accounts, card_invoices, cards, transaction_instances};

/// Error types for invoice operations.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceRepoError {
    /// Invoice not found.
    #[error("Invoice not found: {0}")]
    NotFound(InvoiceId),

    /// Card not found.
    #[error("Card not found: {0}")]
    CardNotFound(CardId),

    /// Paying account not found.
    #[error("Paying account not found: {0}")]
    PayingAccountNotFound(BankAccountId),

    /// Invoice rule violated.
    #[error(transparent)]
    Invoice(#[from] InvoiceError),

    /// Stored row is invalid.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// A settled invoice together with the pending payment instance created
/// for it.
#[derive(Debug, Clone)]
pub struct SettlementRecord {
    /// Settlement result.
    pub settlement: Settlement,
    /// Pending payment against the paying account; money moves when it is
    /// confirmed.
    pub payment: TransactionInstance,
}

/// Invoice repository.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads an invoice.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown invoice.
    pub async fn find(&self, id: InvoiceId) -> Result<CardInvoice, InvoiceRepoError> {
        find_invoice(&self.db, id, false).await
    }

    /// Loads the invoice of a card for a billing month, if one was opened.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_for(&self, key: InvoiceKey) -> Result<Option<CardInvoice>, InvoiceRepoError> {
        find_by_key(&self.db, key, false).await
    }

    /// Recomputes an invoice's total from the best-known amounts of its
    /// instances. A paid invoice keeps its paid amount.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown invoice or a database failure.
    pub async fn recompute_total(&self, id: InvoiceId) -> Result<CardInvoice, InvoiceRepoError> {
        let txn = self.db.begin().await?;
        let mut invoice = find_invoice(&txn, id, true).await?;
        let members = members(&txn, id).await?;
        InvoiceService::recompute_total(&mut invoice, &members);
        save_invoice(&txn, &invoice, false).await?;
        txn.commit().await?;
        Ok(invoice)
    }

    /// Settles an open invoice.
    ///
    /// In one transaction: the invoice becomes paid, every pending
    /// constituent instance is confirmed and a pending payment instance is
    /// created against the paying account. Nothing is posted to the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice is already paid, the amount is not
    /// positive, the invoice, card or paying account is unknown, or the
    /// database fails. On error nothing is written.
    pub async fn settle(
        &self,
        id: InvoiceId,
        request: SettleRequest,
    ) -> Result<SettlementRecord, InvoiceRepoError> {
        let txn = self.db.begin().await?;

        let invoice = find_invoice(&txn, id, true).await?;
        let card = find_card(&txn, invoice.card_id).await?;
        bank_accounts::Entity::find_by_id(request.paying_account.0)
            .one(&txn)
            .await?
            .ok_or(InvoiceRepoError::PayingAccountNotFound(request.paying_account))?;
        let members = members(&txn, id).await?;

        let settlement = InvoiceService::settle(&invoice, &card, &members, request)?;

        save_invoice(&txn, &settlement.invoice, false).await?;
        for instance in &settlement.confirmed {
            save_instance(&txn, instance).await?;
        }
        let payment = InstanceLifecycle::from_settlement(&settlement.event);
        mapping::instance_active_model(&payment).insert(&txn).await?;

        txn.commit().await?;

        info!(
            invoice_id = %id,
            card = %card.name,
            month = %settlement.invoice.month_year,
            amount = %request.paid_amount,
            confirmed = settlement.confirmed.len(),
            payment_instance = %payment.id,
            "Invoice settled"
        );

        Ok(SettlementRecord {
            settlement,
            payment,
        })
    }
}

// ============================================================
// SHARED HELPERS (used by the instance repository)
// ============================================================

async fn find_invoice<C: ConnectionTrait>(
    conn: &C,
    id: InvoiceId,
    lock: bool,
) -> Result<CardInvoice, InvoiceRepoError> {
    let mut query = card_invoices::Entity::find_by_id(id.0);
    if lock {
        query = query.lock_exclusive();
    }
    let model = query
        .one(conn)
        .await?
        .ok_or(InvoiceRepoError::NotFound(id))?;
    Ok(mapping::invoice(model)?)
}

/// Invoice of a card for a billing month, optionally locked.
pub(crate) async fn find_by_key<C: ConnectionTrait>(
    conn: &C,
    key: InvoiceKey,
    lock: bool,
) -> Result<Option<CardInvoice>, InvoiceRepoError> {
    let mut query = card_invoices::Entity::find()
        .filter(card_invoices::Column::CardId.eq(key.card_id.0))
        .filter(card_invoices::Column::MonthYear.eq(key.month_year.to_string()));
    if lock {
        query = query.lock_exclusive();
    }
    match query.one(conn).await? {
        Some(model) => Ok(Some(mapping::invoice(model)?)),
        None => Ok(None),
    }
}

/// Instances referencing an invoice.
pub(crate) async fn members<C: ConnectionTrait>(
    conn: &C,
    invoice_id: InvoiceId,
) -> Result<Vec<TransactionInstance>, InvoiceRepoError> {
    let rows = transaction_instances::Entity::find()
        .filter(transaction_instances::Column::InvoiceId.eq(invoice_id.0))
        .all(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(mapping::instance)
        .collect::<Result<Vec<_>, _>>()?)
}

async fn find_card<C: ConnectionTrait>(conn: &C, id: CardId) -> Result<Card, InvoiceRepoError> {
    let model = cards::Entity::find_by_id(id.0)
        .one(conn)
        .await?
        .ok_or(InvoiceRepoError::CardNotFound(id))?;
    Ok(mapping::card(&model)?)
}

async fn save_invoice<C: ConnectionTrait>(
    conn: &C,
    invoice: &CardInvoice,
    is_new: bool,
) -> Result<(), DbErr> {
    let mut model = mapping::invoice_active_model(invoice);
    if is_new {
        model.insert(conn).await?;
    } else {
        model.created_at = NotSet;
        model.update(conn).await?;
    }
    Ok(())
}

/// Attaches a confirmed card instance to the invoice of its card and month,
/// opening the invoice if needed, and stores the recomputed total.
///
/// The instance's invoice reference is rewritten but not saved.
pub(crate) async fn attach<C: ConnectionTrait>(
    conn: &C,
    key: InvoiceKey,
    instance: &mut TransactionInstance,
) -> Result<CardInvoice, InvoiceRepoError> {
    let card = find_card(conn, key.card_id).await?;
    let existing = find_by_key(conn, key, true).await?;
    let is_new = existing.is_none();
    let siblings = match &existing {
        Some(invoice) => members(conn, invoice.id).await?,
        None => Vec::new(),
    };

    let invoice = InvoiceService::on_transaction_posted(existing, &card, instance, &siblings)?;
    save_invoice(conn, &invoice, is_new).await?;

    info!(
        invoice_id = %invoice.id,
        card = %card.name,
        month = %invoice.month_year,
        total = %invoice.total_amount,
        opened = is_new,
        "Invoice total recomputed"
    );
    Ok(invoice)
}

/// Recomputes and stores the total of the invoice for `key`, if it exists.
pub(crate) async fn recompute<C: ConnectionTrait>(
    conn: &C,
    key: InvoiceKey,
) -> Result<Option<CardInvoice>, InvoiceRepoError> {
    let Some(mut invoice) = find_by_key(conn, key, true).await? else {
        return Ok(None);
    };
    let members = members(conn, invoice.id).await?;
    InvoiceService::recompute_total(&mut invoice, &members);
    save_invoice(conn, &invoice, false).await?;
    Ok(Some(invoice))
}
