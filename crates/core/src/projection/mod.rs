//! Forward-looking balance projection.
//!
//! Simulates a holder's balance month by month from its current cached
//! balance, pending and confirmed instances, transfers and templates that
//! have not been materialized yet. Projection never writes anything.

pub mod engine;
pub mod error;
pub mod types;


pub use engine::{MAX_MONTHS_AHEAD, ProjectionEngine};
pub use error::ProjectionError;
pub use types::{LineSource, MonthProjection, ProjectionInput, ProjectionLine, Provenance};
