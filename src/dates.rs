//! Calendar-date helpers shared by the store boundary and the CLI.
//!
//! Dates cross every boundary as `yyyy-MM-dd` text. Nothing in the core
//! compares date-times.

use chrono::{Datelike, Local, NaiveDate};

use crate::error::StoreError;

/// Wire format for persisted dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `yyyy-MM-dd` string. Malformed input is an error, never repaired.
pub fn parse_date(s: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| StoreError::MalformedDate(s.to_string()))
}

/// Formats a date as `yyyy-MM-dd`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// The local calendar date right now.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Days since 1970-01-01, negative before it.
pub fn epoch_day(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) - i64::from(UNIX_EPOCH_DAYS_FROM_CE)
}

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Last calendar day of the given month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    if month == 12 {
        return NaiveDate::from_ymd_opt(year, 12, 31);
    }
    NaiveDate::from_ymd_opt(year, month + 1, 1)?.pred_opt()
}

/// Number of days in the given month, 0 for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    last_day_of_month(year, month).map_or(0, |d| d.day())
}
