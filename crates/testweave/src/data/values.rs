//! Cell-level parsing helpers: numbers, date layouts, number formatting.

use crate::types::DateFormat;
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

/// Date layouts in match order. The ISO datetime check runs first so that a
/// timestamp is not reported as a bare date.
fn date_patterns() -> &'static [(DateFormat, Regex)] {
    static PATTERNS: OnceLock<Vec<(DateFormat, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            (
                DateFormat::IsoDateTime,
                Regex::new(concat!(
                    r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}",
                    r"(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?$",
                ))
                .expect("iso datetime regex is valid"),
            ),
            (
                DateFormat::IsoDate,
                Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("iso date regex is valid"),
            ),
            (
                DateFormat::UsDate,
                Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").expect("us date regex is valid"),
            ),
        ]
    })
}

/// Parse a cell as a finite float.
pub fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Return the first date layout the value matches.
pub fn detect_date_format(value: &str) -> Option<DateFormat> {
    let trimmed = value.trim();
    date_patterns()
        .iter()
        .find(|(_, re)| re.is_match(trimmed))
        .map(|(format, _)| *format)
}

/// Parse a value in the given layout down to its calendar date.
pub fn parse_date(value: &str, format: DateFormat) -> Option<NaiveDate> {
    let trimmed = value.trim();
    match format {
        DateFormat::IsoDate => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok(),
        DateFormat::UsDate => NaiveDate::parse_from_str(trimmed, "%m/%d/%Y").ok(),
        DateFormat::IsoDateTime => chrono::DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.date_naive())
            .ok()
            .or_else(|| {
                ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"]
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                    .map(|dt| dt.date())
            }),
    }
}

/// Render a number without a trailing `.0` for integral values.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
