//! Template expansion.
//!
//! Turns provisioned templates into month-scoped pending instances. The
//! `(template, month)` index guarantees at most one instance per pair.

pub mod error;
pub mod expander;
pub mod types;


pub use error::ScheduleError;
pub use expander::TemplateExpander;
pub use types::{
    ExpansionOutcome, Materialization, MaterializationIndex, PaymentSource, ProvisionedTemplate,
    Recurrence,
};
