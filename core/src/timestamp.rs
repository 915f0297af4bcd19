//! Deterministic timestamp overrides.
//!
//! Accepts epoch seconds or ISO 8601 and normalizes to UTC epoch seconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid timestamp override: {0}")]
pub struct TimestampError(pub String);

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse `raw` as epoch seconds (all digits) or an ISO 8601 date-time.
///
/// A date-time without an offset is taken as UTC; a bare date is midnight UTC.
pub fn parse_timestamp(raw: &str) -> Result<i64, TimestampError> {
    let raw = raw.trim();
    let invalid = || TimestampError(raw.to_owned());

    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw.parse::<i64>().map_err(|_| invalid());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp());
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc().timestamp());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?.and_utc().timestamp());
    }
    Err(invalid())
}
