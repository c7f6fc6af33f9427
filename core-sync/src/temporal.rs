//! # Temporal Filter
//!
//! Narrows the local collection to records changed on or after a cutoff date.
//!
//! ## Overview
//!
//! Listings carry their modification time under many names and in many
//! shapes. [`item_timestamp`] walks [`TS_FIELDS`] in order and returns the
//! first value that parses:
//!
//! - Numbers are Unix epoch seconds, UTC.
//! - Strings are trimmed and tried against the naive formats (read as UTC),
//!   then the offset formats, then RFC 3339 with `Z` accepted.
//!
//! A record with no parseable timestamp never passes the filter.

use bridge_traits::{FieldValue, Item};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::debug;

/// Candidate timestamp fields, in probe order
pub const TS_FIELDS: [&str; 12] = [
    "updated_at",
    "modified",
    "last_modified",
    "lastUpdate",
    "last_updated",
    "mtime",
    "modified_at",
    "date_modified",
    "changed_at",
    "created",
    "created_at",
    "listed_at",
];

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
];

/// Parse a `YYYY-MM-DD` cutoff as midnight UTC
pub fn parse_cutoff(raw: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}

/// Interpret one field value as a UTC instant
pub fn parse_timestamp(value: &FieldValue) -> Option<DateTime<Utc>> {
    match value {
        FieldValue::Integer(secs) => DateTime::from_timestamp(*secs, 0),
        FieldValue::Float(secs) if secs.is_finite() => {
            DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
        }
        FieldValue::Text(text) => parse_text(text.trim()),
        _ => None,
    }
}

fn parse_text(text: &str) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// First parseable timestamp of a record
pub fn item_timestamp(item: &Item) -> Option<DateTime<Utc>> {
    TS_FIELDS
        .iter()
        .filter_map(|field| item.get(field))
        .find_map(parse_timestamp)
}

/// Keep records whose timestamp is at or after `cutoff`, preserving order
pub fn select_since(items: Vec<Item>, cutoff: DateTime<Utc>) -> Vec<Item> {
    items
        .into_iter()
        .filter(|item| match item_timestamp(item) {
            Some(ts) => ts >= cutoff,
            None => {
                debug!("Excluding record without a parseable timestamp");
                false
            }
        })
        .collect()
}
