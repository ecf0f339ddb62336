//! Zero-sum transfers between balance holders.

pub mod error;
pub mod service;
pub mod types;

pub use error::TransferError;
pub use service::TransferService;
pub use types::{Transfer, TransferKind, TransferRequest};
