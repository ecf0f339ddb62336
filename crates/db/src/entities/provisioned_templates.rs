//! `SeaORM` Entity for provisioned_templates table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::RecurrenceKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "provisioned_templates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Option<Uuid>,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub expected_amount: Decimal,
    pub bank_account_id: Option<Uuid>,
    pub card_id: Option<Uuid>,
    pub box_id: Option<Uuid>,
    pub recurrence: RecurrenceKind,
    pub installment_count: Option<i32>,
    pub current_installment: i32,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
    #[sea_orm(has_many = "super::template_exclusions::Entity")]
    TemplateExclusions,
    #[sea_orm(has_many = "super::transaction_instances::Entity")]
    TransactionInstances,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::template_exclusions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TemplateExclusions.def()
    }
}

impl Related<super::transaction_instances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionInstances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
