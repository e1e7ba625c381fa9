//! Database utility functions.

use chrono::{DateTime, NaiveDate, Utc};

#[cfg(test)]
use mockall::automock;

/// Timestamp format stored in every `*_at` field.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of the current time. Injected so streak and date logic can be tested.
#[cfg_attr(test, automock)]
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Format a point in time as stored in the database.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Get current datetime as string in SQLite format
pub fn current_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Calendar date of a point in time, as stored in `*_date` fields.
pub fn format_date(date: NaiveDate) -> String {
    date.format(crate::db::models::DATE_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, crate::db::models::DATE_FORMAT).ok()
}
