//! Calendar-date helpers shared by the calculator, the store and the CLI.
//!
//! Dates are stored as `YYYY-MM-DD` text and shown as `Sat 15 Aug 2020`.
use chrono::{Duration, NaiveDate};
use thiserror::Error;

const DISPLAY_FORMAT: &str = "%a %-d %b %Y";
const ISO_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("expected YYYY-MM-DD, got {0:?}")]
    WrongShape(String),

    #[error("{part:?} in {input:?} is not a number")]
    NotANumber { input: String, part: String },

    #[error("{0:?} is not a calendar date")]
    OutOfRange(String),
}

/// Parse a `YYYY-MM-DD` date.
///
/// The input is split on `-` into exactly three components and each one is
/// parsed as an integer; anything else is an error.
pub fn parse_iso_date(input: &str) -> Result<NaiveDate, DateParseError> {
    let parts: Vec<&str> = input.split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return Err(DateParseError::WrongShape(input.to_string()));
    };

    let number = |part: &str| {
        part.parse::<i64>().map_err(|_| DateParseError::NotANumber {
            input: input.to_string(),
            part: part.to_string(),
        })
    };
    let (year, month, day) = (number(year)?, number(month)?, number(day)?);

    let year = i32::try_from(year).map_err(|_| DateParseError::OutOfRange(input.to_string()))?;
    let month = u32::try_from(month).map_err(|_| DateParseError::OutOfRange(input.to_string()))?;
    let day = u32::try_from(day).map_err(|_| DateParseError::OutOfRange(input.to_string()))?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DateParseError::OutOfRange(input.to_string()))
}

/// Storage form of a date, the inverse of [`parse_iso_date`].
pub fn to_iso_date(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

/// Human form, e.g. `Sat 15 Aug 2020`.
pub fn format_display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

/// Calendar days from `start` to `end`; negative when `end` is earlier.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

pub fn tomorrow(today: NaiveDate) -> NaiveDate {
    today + Duration::days(1)
}
