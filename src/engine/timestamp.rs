use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::config::TimestampPolicy;
use crate::error::{ConvertError, ConvertResult};

/// Canonical output shape: UTC, second precision, trailing `Z`.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Zone-less input formats, assumed UTC. The first is the ServiceNow table
/// API format; the rest show up in exported or hand-edited records.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// Null or empty input; closed_at is legitimately absent for open
    /// incidents, so this passes through as null rather than erroring.
    Absent,
    Canonical(String),
    /// Lenient policy only: no recognized format parsed, original kept.
    Unparsed(String),
}

/// Normalize one source timestamp. `path` names the source field for error
/// reporting.
pub fn normalize(
    raw: Option<&str>,
    path: &str,
    policy: TimestampPolicy,
) -> ConvertResult<Normalized> {
    let Some(raw) = raw else {
        return Ok(Normalized::Absent);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Normalized::Absent);
    }

    if let Some(utc) = parse_any(trimmed) {
        return Ok(Normalized::Canonical(utc.format(CANONICAL_FORMAT).to_string()));
    }

    match policy {
        TimestampPolicy::Strict => Err(ConvertError::Normalization {
            path: path.to_string(),
            value: trimmed.to_string(),
        }),
        TimestampPolicy::Lenient => Ok(Normalized::Unparsed(raw.to_string())),
    }
}

fn parse_any(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, NAIVE_FORMATS[0]) {
        return Some(naive.and_utc());
    }
    if let Ok(offset) = DateTime::parse_from_rfc3339(s) {
        return Some(offset.with_timezone(&Utc));
    }
    for format in &NAIVE_FORMATS[1..] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    None
}
