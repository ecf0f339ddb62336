//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Each state-changing operation runs in a single database transaction and
//! locks the holder rows whose cached balance it rewrites.

pub mod instance;
pub mod invoice;
pub mod ledger;
pub mod mapping;
pub mod projection;
pub mod reconciliation;
pub mod template;
pub mod transfer;

pub use instance::{InstanceRepoError, InstanceRepository};
pub use invoice::{InvoiceRepoError, InvoiceRepository, SettlementRecord};
pub use ledger::{LedgerRepoError, LedgerRepository};
pub use mapping::MappingError;
pub use projection::{ProjectionRepoError, ProjectionRepository};
pub use reconciliation::{PurgeReport, ReconciliationRepoError, ReconciliationRepository};
pub use template::{TemplateRepoError, TemplateRepository};
pub use transfer::{TransferRepoError, TransferRepository};
