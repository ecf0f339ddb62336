//! `SeaORM` Entity for cards table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub closing_day: i32,
    pub due_day: i32,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::card_invoices::Entity")]
    CardInvoices,
}

impl Related<super::card_invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CardInvoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
