//! Local-time parsing and formatting for the forecast time series
//!
//! Open-Meteo reports every timestamp as a local date-time string. The hourly
//! series is keyed by top-of-hour strings such as "2024-05-25T07:00", and the
//! only way to correlate "now" with a sample is an exact string match against
//! that series, so producing the identical format (zero padding included) is
//! a correctness requirement, not cosmetics.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Error for a timestamp or date string that cannot be parsed
#[derive(Debug, Error)]
#[error("invalid local timestamp: {0}")]
pub struct TimestampError(pub String);

/// Formats an instant as the top-of-hour key used by the hourly time series
/// (e.g., "2024-05-25T07:00")
pub fn hour_bucket_key(t: NaiveDateTime) -> String {
    t.format("%Y-%m-%dT%H:00").to_string()
}

/// Parses a full local date-time string ("2024-05-25T07:15", optionally with
/// seconds) into a `NaiveDateTime`
///
/// A malformed value fails only itself; callers processing a series skip the
/// bad entry and continue.
pub fn parse_local_timestamp(s: &str) -> Result<NaiveDateTime, TimestampError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| TimestampError(s.to_string()))
}

/// Parses a date string ("2024-05-25") from the daily time series
pub fn parse_local_date(s: &str) -> Result<NaiveDate, TimestampError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| TimestampError(s.to_string()))
}

/// Finds the position of `key` in a time series by exact string equality
pub fn find_hour_index<'a, I>(series: I, key: &str) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    series.into_iter().position(|t| t == key)
}

/// Formats an instant as a display clock time ("07:15")
pub fn clock_time(t: NaiveDateTime) -> String {
    t.format("%H:%M").to_string()
}

/// Formats a date as the key used by the daily time series ("2024-05-25")
pub fn date_key(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}
