//! `SeaORM` Entity for transaction_instances table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{AccountType, InstanceStatus, PaymentMethod};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction_instances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub template_id: Option<Uuid>,
    pub invoice_id: Option<Uuid>,
    pub paid_invoice_id: Option<Uuid>,
    #[sea_orm(column_type = "Char(Some(7))")]
    pub month_year: String,
    pub due_date: Date,
    pub description: String,
    pub account_id: Option<Uuid>,
    pub account_type: AccountType,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub expected_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub actual_amount: Option<Decimal>,
    pub status: InstanceStatus,
    pub payment_method: PaymentMethod,
    pub bank_account_id: Option<Uuid>,
    pub card_id: Option<Uuid>,
    pub box_id: Option<Uuid>,
    pub confirmed_on: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::provisioned_templates::Entity",
        from = "Column::TemplateId",
        to = "super::provisioned_templates::Column::Id",
        on_delete = "SetNull"
    )]
    ProvisionedTemplates,
    #[sea_orm(
        belongs_to = "super::card_invoices::Entity",
        from = "Column::InvoiceId",
        to = "super::card_invoices::Column::Id",
        on_delete = "SetNull"
    )]
    Invoice,
    #[sea_orm(
        belongs_to = "super::card_invoices::Entity",
        from = "Column::PaidInvoiceId",
        to = "super::card_invoices::Column::Id",
        on_delete = "SetNull"
    )]
    PaidInvoice,
    #[sea_orm(has_many = "super::ledger_movements::Entity")]
    LedgerMovements,
}

impl Related<super::provisioned_templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProvisionedTemplates.def()
    }
}

impl Related<super::ledger_movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerMovements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
