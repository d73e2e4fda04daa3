//! Derived financial tables built on the cached upstream data.
//!
//! Each submodule is a pure computation over fetched payloads plus a thin
//! async entry point that does the fetching. Keeping the math free of I/O
//! makes it directly testable.

pub mod acciones;
pub mod carry;
pub mod duales;
pub mod fija;
pub mod inflation;

use chrono::{Datelike, NaiveDate, Utc};

/// Today's calendar date in Buenos Aires.
pub(crate) fn today_art() -> NaiveDate {
    Utc::now().with_timezone(&crate::cache::art()).date_naive()
}

/// Round to two decimals for display values.
pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Whole days from `start` to `end` (negative when `end` precedes `start`).
pub(crate) fn days_between(end: NaiveDate, start: NaiveDate) -> i64 {
    (end - start).num_days()
}

pub(crate) fn is_weekend(date: NaiveDate) -> bool {
    matches!(
        date.weekday(),
        chrono::Weekday::Sat | chrono::Weekday::Sun
    )
}

/// `dd/MM/yyyy`, the display convention for Argentine dates.
pub fn format_date_ar(date: NaiveDate) -> String {
    format!("{:02}/{:02}/{}", date.day(), date.month(), date.year())
}
