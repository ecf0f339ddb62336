//! `SeaORM` Entity for boxes table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "boxes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub bank_account_id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub initial_value: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub cached_balance: Decimal,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bank_accounts::Entity",
        from = "Column::BankAccountId",
        to = "super::bank_accounts::Column::Id",
        on_delete = "Cascade"
    )]
    BankAccounts,
    #[sea_orm(has_many = "super::ledger_movements::Entity")]
    LedgerMovements,
}

impl Related<super::bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankAccounts.def()
    }
}

impl Related<super::ledger_movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerMovements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
