//! Common types used across the application.

pub mod id;
pub mod money;
pub mod month;
pub mod pagination;

pub use id::*;
pub use month::{MonthYear, MonthYearError};
pub use pagination::{PageRequest, PageResponse};
