//! `SeaORM` entities, one module per table.

pub mod prelude;

pub mod accounts;
pub mod bank_accounts;
pub mod boxes;
pub mod card_invoices;
pub mod cards;
pub mod ledger_movements;
pub mod provisioned_templates;
pub mod sea_orm_active_enums;
pub mod template_exclusions;
pub mod transaction_instances;
pub mod transfers;
