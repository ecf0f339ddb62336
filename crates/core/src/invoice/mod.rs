//! Card invoice aggregation and two-phase settlement.
//!
//! A card's instances for one billing month roll up into a single invoice.
//! Settling the invoice marks it paid and emits [`InvoiceSettled`]; the
//! instance lifecycle turns that event into a pending payment instance, and
//! money only moves when that payment is confirmed.

pub mod error;
pub mod service;
pub mod types;


pub use error::InvoiceError;
pub use service::InvoiceService;
pub use types::{Card, CardInvoice, InvoiceSettled, InvoiceStatus, SettleRequest, Settlement};
