//! Conversions between `SeaORM` models and core domain types.

use chrono::Utc;
use moneybox_core::classification::AccountType;
use moneybox_core::instance::{InstanceStatus, PaymentMethod, TransactionInstance};
use moneybox_core::invoice::{Card, CardInvoice, InvoiceStatus};
use moneybox_core::ledger::{BankAccount, HolderRef, LedgerMovement, MoneyBox, MovementKind};
use moneybox_core::schedule::{PaymentSource, ProvisionedTemplate, Recurrence};
use moneybox_core::transfer::{Transfer, TransferKind};
use moneybox_shared::types::{
    AccountId, BankAccountId, BoxId, CardId, InstanceId, InvoiceId, MonthYear, MonthYearError,
    MovementId, TemplateId, TransferId,
};
use sea_orm::Set;
use uuid::Uuid;

use crate::entities::{
    bank_accounts, boxes, card_invoices, cards, ledger_movements, provisioned_templates,
    sea_orm_active_enums as db_enums, template_exclusions, transaction_instances, transfers,
};

/// A stored row that does not describe a valid domain value.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// Month column is not `YYYY-MM`.
    #[error("Invalid month '{value}' in {table}: {source}")]
    InvalidMonth {
        /// Table.
        table: &'static str,
        /// Stored value.
        value: String,
        /// Parse failure.
        #[source]
        source: MonthYearError,
    },

    /// Row references no holder or both.
    #[error("{table} row {id} must reference exactly one balance holder")]
    AmbiguousHolder {
        /// Table.
        table: &'static str,
        /// Row ID.
        id: Uuid,
    },

    /// Integer column outside its domain.
    #[error("{table} row {id} has an out-of-range {column}")]
    OutOfRange {
        /// Table.
        table: &'static str,
        /// Row ID.
        id: Uuid,
        /// Column.
        column: &'static str,
    },
}

fn month(table: &'static str, value: &str) -> Result<MonthYear, MappingError> {
    value.parse().map_err(|source| MappingError::InvalidMonth {
        table,
        value: value.to_string(),
        source,
    })
}

fn unsigned(
    table: &'static str,
    id: Uuid,
    column: &'static str,
    value: i32,
) -> Result<u32, MappingError> {
    u32::try_from(value).map_err(|_| MappingError::OutOfRange { table, id, column })
}

/// Resolves a `(bank_account_id, box_id)` column pair.
pub fn holder_ref(
    table: &'static str,
    id: Uuid,
    bank_account_id: Option<Uuid>,
    box_id: Option<Uuid>,
) -> Result<HolderRef, MappingError> {
    match (bank_account_id, box_id) {
        (Some(account), None) => Ok(HolderRef::BankAccount(BankAccountId(account))),
        (None, Some(money_box)) => Ok(HolderRef::Box(BoxId(money_box))),
        _ => Err(MappingError::AmbiguousHolder { table, id }),
    }
}

/// Splits a holder into its `(bank_account_id, box_id)` column pair.
pub fn holder_columns(holder: HolderRef) -> (Option<Uuid>, Option<Uuid>) {
    match holder {
        HolderRef::BankAccount(id) => (Some(id.0), None),
        HolderRef::Box(id) => (None, Some(id.0)),
    }
}

// ============================================================
// ENUMS
// ============================================================

impl From<db_enums::AccountType> for AccountType {
    fn from(value: db_enums::AccountType) -> Self {
        match value {
            db_enums::AccountType::Expense => Self::Expense,
            db_enums::AccountType::Income => Self::Income,
        }
    }
}

impl From<AccountType> for db_enums::AccountType {
    fn from(value: AccountType) -> Self {
        match value {
            AccountType::Expense => Self::Expense,
            AccountType::Income => Self::Income,
        }
    }
}

impl From<db_enums::InstanceStatus> for InstanceStatus {
    fn from(value: db_enums::InstanceStatus) -> Self {
        match value {
            db_enums::InstanceStatus::Pending => Self::Pending,
            db_enums::InstanceStatus::Confirmed => Self::Confirmed,
        }
    }
}

impl From<InstanceStatus> for db_enums::InstanceStatus {
    fn from(value: InstanceStatus) -> Self {
        match value {
            InstanceStatus::Pending => Self::Pending,
            InstanceStatus::Confirmed => Self::Confirmed,
        }
    }
}

impl From<db_enums::PaymentMethod> for PaymentMethod {
    fn from(value: db_enums::PaymentMethod) -> Self {
        match value {
            db_enums::PaymentMethod::Account => Self::Account,
            db_enums::PaymentMethod::Card => Self::Card,
            db_enums::PaymentMethod::Undefined => Self::Undefined,
        }
    }
}

impl From<PaymentMethod> for db_enums::PaymentMethod {
    fn from(value: PaymentMethod) -> Self {
        match value {
            PaymentMethod::Account => Self::Account,
            PaymentMethod::Card => Self::Card,
            PaymentMethod::Undefined => Self::Undefined,
        }
    }
}

impl From<db_enums::InvoiceStatus> for InvoiceStatus {
    fn from(value: db_enums::InvoiceStatus) -> Self {
        match value {
            db_enums::InvoiceStatus::Open => Self::Open,
            db_enums::InvoiceStatus::Paid => Self::Paid,
        }
    }
}

impl From<InvoiceStatus> for db_enums::InvoiceStatus {
    fn from(value: InvoiceStatus) -> Self {
        match value {
            InvoiceStatus::Open => Self::Open,
            InvoiceStatus::Paid => Self::Paid,
        }
    }
}

impl From<db_enums::MovementKind> for MovementKind {
    fn from(value: db_enums::MovementKind) -> Self {
        match value {
            db_enums::MovementKind::Income => Self::Income,
            db_enums::MovementKind::Expense => Self::Expense,
            db_enums::MovementKind::TransferIn => Self::TransferIn,
            db_enums::MovementKind::TransferOut => Self::TransferOut,
            db_enums::MovementKind::BoxContribution => Self::BoxContribution,
            db_enums::MovementKind::BoxWithdrawal => Self::BoxWithdrawal,
        }
    }
}

impl From<MovementKind> for db_enums::MovementKind {
    fn from(value: MovementKind) -> Self {
        match value {
            MovementKind::Income => Self::Income,
            MovementKind::Expense => Self::Expense,
            MovementKind::TransferIn => Self::TransferIn,
            MovementKind::TransferOut => Self::TransferOut,
            MovementKind::BoxContribution => Self::BoxContribution,
            MovementKind::BoxWithdrawal => Self::BoxWithdrawal,
        }
    }
}

impl From<db_enums::TransferKind> for TransferKind {
    fn from(value: db_enums::TransferKind) -> Self {
        match value {
            db_enums::TransferKind::AccountToAccount => Self::AccountToAccount,
            db_enums::TransferKind::BoxContribution => Self::BoxContribution,
            db_enums::TransferKind::BoxWithdrawal => Self::BoxWithdrawal,
            db_enums::TransferKind::BoxToBox => Self::BoxToBox,
        }
    }
}

impl From<TransferKind> for db_enums::TransferKind {
    fn from(value: TransferKind) -> Self {
        match value {
            TransferKind::AccountToAccount => Self::AccountToAccount,
            TransferKind::BoxContribution => Self::BoxContribution,
            TransferKind::BoxWithdrawal => Self::BoxWithdrawal,
            TransferKind::BoxToBox => Self::BoxToBox,
        }
    }
}

// ============================================================
// HOLDERS & LEDGER
// ============================================================

/// Maps a bank account row.
pub fn bank_account(model: &bank_accounts::Model) -> BankAccount {
    BankAccount {
        id: BankAccountId(model.id),
        name: model.name.clone(),
        initial_balance: model.initial_balance,
        cached_balance: model.cached_balance,
        is_active: model.is_active,
    }
}

/// Maps a box row.
pub fn money_box(model: &boxes::Model) -> MoneyBox {
    MoneyBox {
        id: BoxId(model.id),
        bank_account_id: BankAccountId(model.bank_account_id),
        name: model.name.clone(),
        initial_value: model.initial_value,
        cached_balance: model.cached_balance,
        is_active: model.is_active,
    }
}

/// Maps a ledger movement row.
pub fn movement(model: ledger_movements::Model) -> Result<LedgerMovement, MappingError> {
    Ok(LedgerMovement {
        id: MovementId(model.id),
        holder: holder_ref("ledger_movements", model.id, model.bank_account_id, model.box_id)?,
        amount: model.amount,
        kind: model.kind.into(),
        description: model.description,
        effective_date: model.effective_date,
        created_at: model.created_at.with_timezone(&Utc),
        instance_id: model.instance_id.map(InstanceId),
        transfer_id: model.transfer_id.map(TransferId),
    })
}

/// Builds the insert model for a recorded movement.
pub fn movement_active_model(movement: &LedgerMovement) -> ledger_movements::ActiveModel {
    let (bank_account_id, box_id) = holder_columns(movement.holder);
    ledger_movements::ActiveModel {
        id: Set(movement.id.0),
        bank_account_id: Set(bank_account_id),
        box_id: Set(box_id),
        amount: Set(movement.amount),
        kind: Set(movement.kind.into()),
        description: Set(movement.description.clone()),
        effective_date: Set(movement.effective_date),
        instance_id: Set(movement.instance_id.map(|id| id.0)),
        transfer_id: Set(movement.transfer_id.map(|id| id.0)),
        created_at: Set(movement.created_at.into()),
    }
}

// ============================================================
// TEMPLATES & INSTANCES
// ============================================================

/// Maps a template row with its exclusions and the type of its
/// classification account.
///
/// A template without a classification account maps with an expense type;
/// validation rejects it before anything is materialized.
pub fn template(
    model: provisioned_templates::Model,
    account_type: Option<db_enums::AccountType>,
    exclusions: &[template_exclusions::Model],
) -> Result<ProvisionedTemplate, MappingError> {
    const TABLE: &str = "provisioned_templates";

    let recurrence = match model.recurrence {
        db_enums::RecurrenceKind::Unique => Recurrence::Unique,
        db_enums::RecurrenceKind::Monthly => Recurrence::Monthly,
        db_enums::RecurrenceKind::Yearly => Recurrence::Yearly,
        db_enums::RecurrenceKind::Installment => {
            let count = model
                .installment_count
                .and_then(|c| u32::try_from(c).ok())
                .ok_or(MappingError::OutOfRange {
                    table: TABLE,
                    id: model.id,
                    column: "installment_count",
                })?;
            Recurrence::Installment { count }
        }
    };

    let payment_source = match (model.bank_account_id, model.card_id) {
        (Some(account), None) => Some(PaymentSource::BankAccount(BankAccountId(account))),
        (None, Some(card)) => Some(PaymentSource::Card(CardId(card))),
        (None, None) => None,
        (Some(_), Some(_)) => {
            return Err(MappingError::AmbiguousHolder {
                table: TABLE,
                id: model.id,
            });
        }
    };

    let excluded = exclusions
        .iter()
        .filter(|e| e.template_id == model.id)
        .map(|e| month("template_exclusions", &e.month_year))
        .collect::<Result<_, _>>()?;

    Ok(ProvisionedTemplate {
        id: TemplateId(model.id),
        account_id: model.account_id.map(AccountId),
        account_type: account_type.map_or(AccountType::Expense, Into::into),
        description: model.description,
        expected_amount: model.expected_amount,
        payment_source,
        target_box: model.box_id.map(BoxId),
        recurrence,
        start_date: model.start_date,
        end_date: model.end_date,
        current_installment: unsigned(
            TABLE,
            model.id,
            "current_installment",
            model.current_installment,
        )?,
        excluded,
    })
}

/// Builds the insert model for a template.
pub fn template_active_model(
    template: &ProvisionedTemplate,
) -> Result<provisioned_templates::ActiveModel, MappingError> {
    const TABLE: &str = "provisioned_templates";
    let out_of_range = |column| MappingError::OutOfRange {
        table: TABLE,
        id: template.id.0,
        column,
    };

    let (recurrence, installment_count) = match template.recurrence {
        Recurrence::Unique => (db_enums::RecurrenceKind::Unique, None),
        Recurrence::Monthly => (db_enums::RecurrenceKind::Monthly, None),
        Recurrence::Yearly => (db_enums::RecurrenceKind::Yearly, None),
        Recurrence::Installment { count } => (
            db_enums::RecurrenceKind::Installment,
            Some(i32::try_from(count).map_err(|_| out_of_range("installment_count"))?),
        ),
    };
    let (bank_account_id, card_id) = match template.payment_source {
        Some(PaymentSource::BankAccount(id)) => (Some(id.0), None),
        Some(PaymentSource::Card(id)) => (None, Some(id.0)),
        None => (None, None),
    };
    let current_installment = i32::try_from(template.current_installment)
        .map_err(|_| out_of_range("current_installment"))?;

    let now = Utc::now().into();
    Ok(provisioned_templates::ActiveModel {
        id: Set(template.id.0),
        account_id: Set(template.account_id.map(|id| id.0)),
        description: Set(template.description.clone()),
        expected_amount: Set(template.expected_amount),
        bank_account_id: Set(bank_account_id),
        card_id: Set(card_id),
        box_id: Set(template.target_box.map(|id| id.0)),
        recurrence: Set(recurrence),
        installment_count: Set(installment_count),
        current_installment: Set(current_installment),
        start_date: Set(template.start_date),
        end_date: Set(template.end_date),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    })
}

/// Maps an instance row.
pub fn instance(model: transaction_instances::Model) -> Result<TransactionInstance, MappingError> {
    Ok(TransactionInstance {
        id: InstanceId(model.id),
        template_id: model.template_id.map(TemplateId),
        invoice_id: model.invoice_id.map(InvoiceId),
        paid_invoice_id: model.paid_invoice_id.map(InvoiceId),
        month_year: month("transaction_instances", &model.month_year)?,
        due_date: model.due_date,
        description: model.description,
        account_id: model.account_id.map(AccountId),
        account_type: model.account_type.into(),
        expected_amount: model.expected_amount,
        actual_amount: model.actual_amount,
        status: model.status.into(),
        payment_method: model.payment_method.into(),
        bank_account_id: model.bank_account_id.map(BankAccountId),
        card_id: model.card_id.map(CardId),
        box_id: model.box_id.map(BoxId),
        confirmed_on: model.confirmed_on,
    })
}

/// Builds the full active model for an instance; every column is set so
/// the model works for both insert and update.
pub fn instance_active_model(instance: &TransactionInstance) -> transaction_instances::ActiveModel {
    let now = Utc::now().into();
    transaction_instances::ActiveModel {
        id: Set(instance.id.0),
        template_id: Set(instance.template_id.map(|id| id.0)),
        invoice_id: Set(instance.invoice_id.map(|id| id.0)),
        paid_invoice_id: Set(instance.paid_invoice_id.map(|id| id.0)),
        month_year: Set(instance.month_year.to_string()),
        due_date: Set(instance.due_date),
        description: Set(instance.description.clone()),
        account_id: Set(instance.account_id.map(|id| id.0)),
        account_type: Set(instance.account_type.into()),
        expected_amount: Set(instance.expected_amount),
        actual_amount: Set(instance.actual_amount),
        status: Set(instance.status.into()),
        payment_method: Set(instance.payment_method.into()),
        bank_account_id: Set(instance.bank_account_id.map(|id| id.0)),
        card_id: Set(instance.card_id.map(|id| id.0)),
        box_id: Set(instance.box_id.map(|id| id.0)),
        confirmed_on: Set(instance.confirmed_on),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

// ============================================================
// CARDS & INVOICES
// ============================================================

/// Maps a card row.
pub fn card(model: &cards::Model) -> Result<Card, MappingError> {
    Ok(Card {
        id: CardId(model.id),
        name: model.name.clone(),
        closing_day: unsigned("cards", model.id, "closing_day", model.closing_day)?,
        due_day: unsigned("cards", model.id, "due_day", model.due_day)?,
        is_active: model.is_active,
    })
}

/// Maps an invoice row.
pub fn invoice(model: card_invoices::Model) -> Result<CardInvoice, MappingError> {
    Ok(CardInvoice {
        id: InvoiceId(model.id),
        card_id: CardId(model.card_id),
        month_year: month("card_invoices", &model.month_year)?,
        total_amount: model.total_amount,
        status: model.status.into(),
        closing_date: model.closing_date,
        due_date: model.due_date,
        paid_date: model.paid_date,
        paying_account: model.paying_account_id.map(BankAccountId),
    })
}

/// Builds the full active model for an invoice.
pub fn invoice_active_model(invoice: &CardInvoice) -> card_invoices::ActiveModel {
    let now = Utc::now().into();
    card_invoices::ActiveModel {
        id: Set(invoice.id.0),
        card_id: Set(invoice.card_id.0),
        month_year: Set(invoice.month_year.to_string()),
        total_amount: Set(invoice.total_amount),
        status: Set(invoice.status.into()),
        closing_date: Set(invoice.closing_date),
        due_date: Set(invoice.due_date),
        paid_date: Set(invoice.paid_date),
        paying_account_id: Set(invoice.paying_account.map(|id| id.0)),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

// ============================================================
// TRANSFERS
// ============================================================

/// Maps a transfer row.
pub fn transfer(model: transfers::Model) -> Result<Transfer, MappingError> {
    const TABLE: &str = "transfers";
    Ok(Transfer {
        id: TransferId(model.id),
        source: holder_ref(TABLE, model.id, model.source_bank_account_id, model.source_box_id)?,
        destination: holder_ref(
            TABLE,
            model.id,
            model.destination_bank_account_id,
            model.destination_box_id,
        )?,
        amount: model.amount,
        kind: model.kind.into(),
        date: model.transfer_date,
        description: model.description,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

/// Builds the insert model for a transfer.
pub fn transfer_active_model(transfer: &Transfer) -> transfers::ActiveModel {
    let (source_bank_account_id, source_box_id) = holder_columns(transfer.source);
    let (destination_bank_account_id, destination_box_id) = holder_columns(transfer.destination);
    transfers::ActiveModel {
        id: Set(transfer.id.0),
        source_bank_account_id: Set(source_bank_account_id),
        source_box_id: Set(source_box_id),
        destination_bank_account_id: Set(destination_bank_account_id),
        destination_box_id: Set(destination_box_id),
        amount: Set(transfer.amount),
        kind: Set(transfer.kind.into()),
        transfer_date: Set(transfer.date),
        description: Set(transfer.description.clone()),
        created_at: Set(transfer.created_at.into()),
    }
}
