//! Date parsing for `<time datetime>` attributes and listing dates.

use chrono::{NaiveDate, NaiveDateTime};
use wob_core::ItemDate;

use crate::NormalizeError;

pub const TIME_ATTRIBUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";

const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

const NAIVE_ISO_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses a `datetime` attribute in the fixed `YYYY-MM-DDThh:mm` shape.
pub fn parse_time_attribute(value: &str) -> Result<NaiveDateTime, NormalizeError> {
    NaiveDateTime::parse_from_str(value.trim(), TIME_ATTRIBUTE_FORMAT).map_err(|e| {
        NormalizeError::MalformedDate {
            value: value.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Parses an ISO-8601 date or datetime. Values without an offset are taken as UTC.
pub fn parse_iso8601(value: &str) -> Result<ItemDate, NormalizeError> {
    let trimmed = value.trim();
    if let Ok(parsed) = ItemDate::parse_from_rfc3339(trimmed) {
        return Ok(parsed);
    }
    for format in NAIVE_ISO_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(as_item_date(naive));
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(as_item_date)
        .ok_or_else(|| NormalizeError::MalformedDate {
            value: value.to_string(),
            reason: "not an ISO-8601 date or datetime".to_string(),
        })
}

pub fn as_item_date(naive: NaiveDateTime) -> ItemDate {
    naive.and_utc().fixed_offset()
}

pub fn archive_timestamp(date: NaiveDateTime) -> String {
    date.format(ARCHIVE_TIMESTAMP_FORMAT).to_string()
}
