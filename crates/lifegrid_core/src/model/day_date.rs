//! Calendar day reference.
//!
//! # Responsibility
//! - Define the `(year, month, day)` reference shared by grid, codec and store.
//! - Provide Gregorian calendar arithmetic used by grid generation.
//!
//! # Invariants
//! - `month` is zero-indexed (January = 0) everywhere in core.
//! - `DayDate::PADDING` (all fields `-1`) is a layout-only cell and is never
//!   a valid addressable day.
//! - Supported years are `MIN_YEAR..=MAX_YEAR` so date keys stay fixed-width.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Smallest year addressable by core.
pub const MIN_YEAR: i32 = 0;
/// Largest year addressable by core.
pub const MAX_YEAR: i32 = 9999;
/// Number of months in a year.
pub const MONTHS_IN_YEAR: i32 = 12;

/// Validation failures for calendar day references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayDateError {
    /// The value is the padding sentinel.
    Padding,
    YearOutOfRange(i32),
    /// Month outside `0..=11`.
    MonthOutOfRange(i32),
    DayOutOfRange { day: i32, days_in_month: i32 },
}

impl Display for DayDateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Padding => write!(f, "padding cell is not an addressable day"),
            Self::YearOutOfRange(year) => {
                write!(f, "year {year} is outside {MIN_YEAR}..={MAX_YEAR}")
            }
            Self::MonthOutOfRange(month) => {
                write!(f, "month {month} is outside 0..=11 (zero-indexed)")
            }
            Self::DayOutOfRange { day, days_in_month } => {
                write!(f, "day {day} is outside 1..={days_in_month}")
            }
        }
    }
}

impl Error for DayDateError {}

/// A calendar day, or the padding sentinel used by month grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DayDate {
    pub year: i32,
    /// Zero-indexed month (January = 0).
    pub month: i32,
    /// One-indexed day of month.
    pub day: i32,
}

impl DayDate {
    /// Layout-only grid cell.
    pub const PADDING: DayDate = DayDate {
        year: -1,
        month: -1,
        day: -1,
    };

    /// Creates a validated day reference.
    ///
    /// # Errors
    /// - Returns `DayDateError` when any field is out of calendar range.
    pub fn new(year: i32, month: i32, day: i32) -> Result<Self, DayDateError> {
        let date = Self { year, month, day };
        date.validate()?;
        Ok(date)
    }

    /// Returns whether this value is the padding sentinel.
    pub fn is_padding(&self) -> bool {
        *self == Self::PADDING
    }

    /// Validates that this value addresses a real calendar day.
    pub fn validate(&self) -> Result<(), DayDateError> {
        if self.is_padding() {
            return Err(DayDateError::Padding);
        }
        let days_in_month = days_in_month(self.year, self.month)?;
        if !(1..=days_in_month).contains(&self.day) {
            return Err(DayDateError::DayOutOfRange {
                day: self.day,
                days_in_month,
            });
        }
        Ok(())
    }

    /// Converts to a chrono date. Fails for padding or invalid values.
    pub fn to_naive_date(&self) -> Result<NaiveDate, DayDateError> {
        self.validate()?;
        let month = u32::try_from(self.month + 1).ok();
        let day = u32::try_from(self.day).ok();
        month
            .zip(day)
            .and_then(|(month, day)| NaiveDate::from_ymd_opt(self.year, month, day))
            .ok_or(DayDateError::YearOutOfRange(self.year))
    }

    /// Builds a day reference from a chrono date.
    pub fn from_naive_date(date: NaiveDate) -> Result<Self, DayDateError> {
        // month0() is 0..=11 and day() is 1..=31, both fit in i32.
        Self::new(date.year(), date.month0() as i32, date.day() as i32)
    }

    /// Returns today's date in the local time zone.
    pub fn today() -> Result<Self, DayDateError> {
        Self::from_naive_date(chrono::Local::now().date_naive())
    }
}

/// Returns whether `year` is a Gregorian leap year.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Returns the number of days in a zero-indexed month.
///
/// # Errors
/// - Returns an error when year or month is out of the supported range.
pub fn days_in_month(year: i32, month: i32) -> Result<i32, DayDateError> {
    validate_year_month(year, month)?;
    let days = match month {
        1 if is_leap_year(year) => 29,
        1 => 28,
        3 | 5 | 8 | 10 => 30,
        _ => 31,
    };
    Ok(days)
}

/// Validates a `(year, zero-indexed month)` pair.
pub fn validate_year_month(year: i32, month: i32) -> Result<(), DayDateError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(DayDateError::YearOutOfRange(year));
    }
    if !(0..MONTHS_IN_YEAR).contains(&month) {
        return Err(DayDateError::MonthOutOfRange(month));
    }
    Ok(())
}
