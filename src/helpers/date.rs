//! Date helper functions

use chrono::{DateTime, TimeZone};

/// Format a date with a strftime pattern, falling back to ISO dates on a bad pattern
///
/// # Examples
/// ```ignore
/// format_date(&date, "%B %-d, %Y") // -> "January 15, 2024"
/// ```
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    use std::fmt::Write;

    let mut out = String::new();
    match write!(out, "{}", date.format(format)) {
        Ok(()) => out,
        Err(_) => {
            tracing::warn!("Invalid date format {:?}, using %Y-%m-%d", format);
            date.format("%Y-%m-%d").to_string()
        }
    }
}

/// Format a date in ISO 8601 / XML format, as used in `<time>` and meta tags
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}
