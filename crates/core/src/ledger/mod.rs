//! Append-only movement ledger.
//!
//! Every balance change of a bank account or box is an immutable movement.
//! Cached balances are kept alongside and must always equal the holder's
//! baseline plus the sum of its movements.

pub mod balance;
pub mod book;
pub mod error;
pub mod types;

#[cfg(test)]
mod book_props;

pub use balance::RunningBalance;
pub use book::{LedgerBook, PurgeSummary};
pub use error::LedgerError;
pub use types::{
    BankAccount, HolderAccount, HolderRef, LedgerMovement, MoneyBox, MovementKind, NewMovement,
};
