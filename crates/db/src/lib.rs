//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations, including the triggers that keep ledger movements
//!   immutable and transfer legs balanced

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    InstanceRepository, InvoiceRepository, LedgerRepository, ProjectionRepository,
    ReconciliationRepository, TemplateRepository, TransferRepository,
};

use std::time::Duration;

use moneybox_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection pool sized from configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(8))
        .sqlx_logging(false);
    Database::connect(options).await
}
