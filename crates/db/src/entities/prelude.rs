//! Entity re-exports.

pub use super::accounts::Entity as Accounts;
pub use super::bank_accounts::Entity as BankAccounts;
pub use super::boxes::Entity as Boxes;
pub use super::card_invoices::Entity as CardInvoices;
pub use super::cards::Entity as Cards;
pub use super::ledger_movements::Entity as LedgerMovements;
pub use super::provisioned_templates::Entity as ProvisionedTemplates;
pub use super::template_exclusions::Entity as TemplateExclusions;
pub use super::transaction_instances::Entity as TransactionInstances;
pub use super::transfers::Entity as Transfers;
