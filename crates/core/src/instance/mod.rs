//! Transaction instance lifecycle.
//!
//! An instance is a month-scoped materialization of a template or an ad-hoc
//! entry. Confirming posts to the ledger (or, for card instances, to the
//! card invoice), unconfirming appends compensating movements and deleting
//! cascades to every movement the instance produced.

pub mod error;
pub mod lifecycle;
pub mod types;

pub use error::InstanceError;
pub use lifecycle::InstanceLifecycle;
pub use types::{
    Confirmation, Deletion, InstanceStatus, InvoiceKey, ManualInstanceInput, PaymentMethod,
    PostingTarget, Reversion, TransactionInstance,
};
