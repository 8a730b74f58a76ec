//! Time utility functions

use chrono::{DurationRound, NaiveDateTime, TimeDelta, Utc};
use serde::Serializer;

use crate::core::constants::{QUERY_TIME_FORMAT, RECORD_TIME_FORMAT};

/// Current UTC wall-clock time without timezone
pub fn utc_now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Drop seconds and sub-seconds
pub fn truncate_to_minute(ts: NaiveDateTime) -> NaiveDateTime {
    ts.duration_trunc(TimeDelta::minutes(1)).unwrap_or(ts)
}

/// Parse a `YYYY-MM-DDTHH:MM` query parameter
pub fn parse_query_time(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), QUERY_TIME_FORMAT).ok()
}

/// Format a timestamp at query (minute) precision
pub fn format_query_time(ts: &NaiveDateTime) -> String {
    ts.format(QUERY_TIME_FORMAT).to_string()
}

/// Format a timestamp as `YYYY-MM-DD HH:MM:SS`
pub fn format_record_time(ts: &NaiveDateTime) -> String {
    ts.format(RECORD_TIME_FORMAT).to_string()
}

/// Parse a backend timestamp, accepting an optional fractional-seconds suffix
pub fn parse_record_time(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S%.f").ok()
}

/// Serde helper writing timestamps in record format
pub fn serialize_record_time<S: Serializer>(
    ts: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_record_time(ts))
}
