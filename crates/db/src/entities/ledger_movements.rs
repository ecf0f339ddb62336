//! `SeaORM` Entity for ledger_movements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::MovementKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub bank_account_id: Option<Uuid>,
    pub box_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub kind: MovementKind,
    pub description: String,
    pub effective_date: Date,
    pub instance_id: Option<Uuid>,
    pub transfer_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
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
    #[sea_orm(
        belongs_to = "super::boxes::Entity",
        from = "Column::BoxId",
        to = "super::boxes::Column::Id",
        on_delete = "Cascade"
    )]
    Boxes,
    #[sea_orm(
        belongs_to = "super::transaction_instances::Entity",
        from = "Column::InstanceId",
        to = "super::transaction_instances::Column::Id",
        on_delete = "Cascade"
    )]
    TransactionInstances,
    #[sea_orm(
        belongs_to = "super::transfers::Entity",
        from = "Column::TransferId",
        to = "super::transfers::Column::Id",
        on_delete = "Cascade"
    )]
    Transfers,
}

impl Related<super::bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankAccounts.def()
    }
}

impl Related<super::boxes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Boxes.def()
    }
}

impl Related<super::transaction_instances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionInstances.def()
    }
}

impl Related<super::transfers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transfers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
