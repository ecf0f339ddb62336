//! Month-and-year calendar key.
//!
//! Every transaction instance, invoice and projection step is scoped to a
//! calendar month. `MonthYear` orders by `(year, month)`.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest accepted year (4-digit years only).
pub const MIN_YEAR: i32 = 1000;
/// Largest accepted year (4-digit years only).
pub const MAX_YEAR: i32 = 9999;

/// Errors raised when building a `MonthYear`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MonthYearError {
    /// Month outside 1-12.
    #[error("Month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    /// Year is not a 4-digit year.
    #[error("Year must have 4 digits, got {0}")]
    InvalidYear(i32),

    /// Text is not in `YYYY-MM` form.
    #[error("Expected a month in YYYY-MM form, got '{0}'")]
    Malformed(String),
}

/// A calendar month, e.g. `2025-03`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthYear {
    year: i32,
    month: u32,
}

impl MonthYear {
    /// Creates a month key, validating month 1-12 and a 4-digit year.
    ///
    /// # Errors
    ///
    /// Returns `MonthYearError` when either component is out of range.
    pub fn new(year: i32, month: u32) -> Result<Self, MonthYearError> {
        if !(1..=12).contains(&month) {
            return Err(MonthYearError::InvalidMonth(month));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(MonthYearError::InvalidYear(year));
        }
        Ok(Self { year, month })
    }

    /// Returns the month containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Calendar month (1-12).
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// The following month.
    #[must_use]
    pub const fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The month `n` months after this one.
    #[must_use]
    pub fn plus_months(self, n: u32) -> Self {
        let zero_based = i64::from(self.month - 1) + i64::from(n);
        #[allow(clippy::cast_possible_truncation)]
        let year = self.year + (zero_based / 12) as i32;
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let month = (zero_based % 12) as u32 + 1;
        Self { year, month }
    }

    /// First day of the month.
    #[must_use]
    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the month.
    #[must_use]
    pub fn last_day(self) -> NaiveDate {
        self.succ()
            .first_day()
            .pred_opt()
            .unwrap_or_else(|| self.first_day())
    }

    /// Number of days in the month.
    #[must_use]
    pub fn days(self) -> u32 {
        self.last_day().day()
    }

    /// The given day of this month, clamped to the month's length.
    #[must_use]
    pub fn day_clamped(self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.days());
        NaiveDate::from_ymd_opt(self.year, self.month, day).unwrap_or_else(|| self.first_day())
    }

    /// Returns true if `date` falls within this month.
    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthYear {
    type Err = MonthYearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| MonthYearError::Malformed(s.to_string()))?;
        if year.len() != 4 {
            return Err(MonthYearError::Malformed(s.to_string()));
        }
        let year = year
            .parse::<i32>()
            .map_err(|_| MonthYearError::Malformed(s.to_string()))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| MonthYearError::Malformed(s.to_string()))?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for MonthYear {
    type Error = MonthYearError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthYear> for String {
    fn from(value: MonthYear) -> Self {
        value.to_string()
    }
}
