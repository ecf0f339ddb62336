//! `SeaORM` Entity for transfers table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::TransferKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub source_bank_account_id: Option<Uuid>,
    pub source_box_id: Option<Uuid>,
    pub destination_bank_account_id: Option<Uuid>,
    pub destination_box_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub kind: TransferKind,
    pub transfer_date: Date,
    pub description: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger_movements::Entity")]
    LedgerMovements,
}

impl Related<super::ledger_movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerMovements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
