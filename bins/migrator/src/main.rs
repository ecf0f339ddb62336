//! Database migration runner for Moneybox.
//!
//! Usage:
//!   migrator up      - Run all pending migrations
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations
//!
//! The connection string is read from `DATABASE_URL` (a `.env` file is
//! honoured).

use moneybox_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // The migrator CLI sets up its own tracing.
    cli::run_cli(Migrator).await;
}
