//! `SeaORM` Entity for card_invoices table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::InvoiceStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "card_invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub card_id: Uuid,
    #[sea_orm(column_type = "Char(Some(7))")]
    pub month_year: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_amount: Decimal,
    pub status: InvoiceStatus,
    pub closing_date: Date,
    pub due_date: Date,
    pub paid_date: Option<Date>,
    pub paying_account_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cards::Entity",
        from = "Column::CardId",
        to = "super::cards::Column::Id",
        on_delete = "Cascade"
    )]
    Cards,
    #[sea_orm(
        belongs_to = "super::bank_accounts::Entity",
        from = "Column::PayingAccountId",
        to = "super::bank_accounts::Column::Id"
    )]
    PayingAccount,
}

impl Related<super::cards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cards.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
