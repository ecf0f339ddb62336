//! Core business logic for Moneybox.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here; the
//! persistence layer applies the decisions made here inside one database
//! transaction per request.
//!
//! # Modules
//!
//! - `classification` - Income/expense classification accounts
//! - `ledger` - Append-only movement log and cached balances
//! - `schedule` - Template expansion into month-scoped instances
//! - `instance` - Transaction instance lifecycle (confirm, revert, delete)
//! - `transfer` - Zero-sum transfers between balance holders
//! - `invoice` - Card invoice aggregation and two-phase settlement
//! - `reconcile` - Cached balance repair against the ledger
//! - `projection` - Forward-looking month-by-month balance simulation

pub mod classification;
pub mod instance;
pub mod invoice;
pub mod ledger;
pub mod projection;
pub mod reconcile;
pub mod schedule;
pub mod transfer;

#[cfg(test)]
mod scenarios;

pub use classification::{Account, AccountType};
pub use ledger::{HolderAccount, HolderRef, LedgerBook, LedgerMovement, MovementKind};
