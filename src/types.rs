//! Common types used throughout recharge-tap
//!
//! This module contains shared type definitions and the datetime helpers
//! used for replication-key handling.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Replication Method
// ============================================================================

/// Replication method for streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicationMethod {
    /// Only fetch rows at or after the stream bookmark
    Incremental,
    /// Full snapshot every run, no bookmark
    FullTable,
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Datetime helpers
// ============================================================================

/// The bookmark serialization format: UTC with six-digit fractional seconds,
/// the same shape Recharge uses for `updated_at` values.
pub const BOOKMARK_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Parse a replication-key value.
///
/// Accepts full RFC 3339 timestamps, the `...Z`-suffixed variants Recharge
/// emits, and bare dates (interpreted as midnight UTC).
pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc());
    }
    Err(Error::decode(format!("unparseable datetime: '{value}'")))
}

/// Format a datetime as a bookmark string
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.format(BOOKMARK_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_replication_method_serde() {
        let method: ReplicationMethod = serde_json::from_str("\"INCREMENTAL\"").unwrap();
        assert_eq!(method, ReplicationMethod::Incremental);

        let json = serde_json::to_string(&ReplicationMethod::FullTable).unwrap();
        assert_eq!(json, "\"FULL_TABLE\"");
    }

    #[test]
    fn test_parse_datetime_rfc3339() {
        let dt = parse_datetime("2021-10-11T00:01:32.000000Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2021, 10, 11, 0, 1, 32).unwrap());
    }

    #[test]
    fn test_parse_datetime_offset() {
        let dt = parse_datetime("2021-10-11T02:01:32+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2021, 10, 11, 0, 1, 32).unwrap());
    }

    #[test]
    fn test_parse_datetime_bare_date() {
        let dt = parse_datetime("2021-09-16").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2021, 9, 16, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_datetime_invalid() {
        assert!(parse_datetime("not a date").is_err());
    }

    #[test]
    fn test_format_round_trip() {
        let formatted = format_datetime(&Utc.with_ymd_and_hms(2021, 10, 11, 0, 1, 32).unwrap());
        assert_eq!(formatted, "2021-10-11T00:01:32.000000Z");
        assert_eq!(parse_datetime(&formatted).unwrap(), parse_datetime("2021-10-11T00:01:32Z").unwrap());
    }
}
