//! Shared types, errors, and configuration for Moneybox.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - The `MonthYear` calendar key used by the monthly ledger
//! - Decimal money helpers (cent rounding, reconciliation tolerance)
//! - Pagination types for ledger listings
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, BoxInitialBalance};
pub use error::{AppError, AppResult};
