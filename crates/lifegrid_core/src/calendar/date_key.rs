//! Canonical string keys for calendar days.
//!
//! # Responsibility
//! - Encode a `DayDate` as a fixed-width `YYYY_MM_DD` key.
//! - Decode keys back into validated `DayDate` values.
//!
//! # Invariants
//! - Encoding is injective over `MIN_YEAR..=MAX_YEAR`.
//! - Lexicographic key order equals calendar order.
//! - The month segment is the zero-indexed month field, written as stored.
//! - `decode_date_key(encode_date_key(d)?) == Ok(d)` for every valid `d`.

use crate::model::day_date::{DayDate, DayDateError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static DATE_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})_(\d{2})_(\d{2})$").expect("valid date key regex"));

/// Date key encode/decode failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateKeyError {
    /// Padding cells have no key.
    Padding,
    InvalidDate(DayDateError),
    /// Input does not match `YYYY_MM_DD`.
    Malformed(String),
}

impl Display for DateKeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Padding => write!(f, "padding cell cannot be encoded as a date key"),
            Self::InvalidDate(err) => write!(f, "invalid date: {err}"),
            Self::Malformed(value) => write!(f, "malformed date key `{value}`"),
        }
    }
}

impl Error for DateKeyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDate(err) => Some(err),
            Self::Padding | Self::Malformed(_) => None,
        }
    }
}

impl From<DayDateError> for DateKeyError {
    fn from(value: DayDateError) -> Self {
        match value {
            DayDateError::Padding => Self::Padding,
            other => Self::InvalidDate(other),
        }
    }
}

/// Encodes a real day as `YYYY_MM_DD`.
///
/// # Errors
/// - `DateKeyError::Padding` for the padding sentinel.
/// - `DateKeyError::InvalidDate` for out-of-range fields.
pub fn encode_date_key(day: DayDate) -> Result<String, DateKeyError> {
    day.validate()?;
    Ok(format!("{:04}_{:02}_{:02}", day.year, day.month, day.day))
}

/// Decodes a `YYYY_MM_DD` key into a validated day.
///
/// # Errors
/// - `DateKeyError::Malformed` when the shape does not match.
/// - `DateKeyError::InvalidDate` when the fields are not a calendar day.
pub fn decode_date_key(value: &str) -> Result<DayDate, DateKeyError> {
    let captures = DATE_KEY_RE
        .captures(value)
        .ok_or_else(|| DateKeyError::Malformed(value.to_string()))?;

    let field = |index: usize| -> Result<i32, DateKeyError> {
        captures
            .get(index)
            .and_then(|group| group.as_str().parse::<i32>().ok())
            .ok_or_else(|| DateKeyError::Malformed(value.to_string()))
    };

    Ok(DayDate::new(field(1)?, field(2)?, field(3)?)?)
}

/// Re-encodes a key in canonical form.
pub fn canonicalize_date_key(value: &str) -> Result<String, DateKeyError> {
    encode_date_key(decode_date_key(value)?)
}
