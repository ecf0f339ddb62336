//! `SeaORM` Entity for template_exclusions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "template_exclusions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub template_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false, column_type = "Char(Some(7))")]
    pub month_year: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::provisioned_templates::Entity",
        from = "Column::TemplateId",
        to = "super::provisioned_templates::Column::Id",
        on_delete = "Cascade"
    )]
    ProvisionedTemplates,
}

impl Related<super::provisioned_templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProvisionedTemplates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
