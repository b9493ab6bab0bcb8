// src/process/deadline.rs

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use super::CellValue;

/// Shown when a deadline cell is empty.
pub const PLACEHOLDER: &str = "—";

/// `Date(YYYY, M, D)` — the zero-based-month encoding the gviz endpoint
/// emits for date-typed cells.
static SERIALIZED_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^Date\(\s*(\d{4}),\s*(\d{1,2}),\s*(\d{1,2})\s*\)$").unwrap()
});

/// Formats accepted by the generic fallback parse.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Best-effort deadline rendering: every input produces a string, never an
/// error.
///
/// `shift_month` applies the documented +1 correction to the `Date(Y,M,D)`
/// branch. The live sheet has been observed to serve months one low; the
/// toggle exists so the correction can be dropped without a code change if
/// the source is ever fixed.
pub fn format_deadline(value: &CellValue, shift_month: bool) -> String {
    let text = match value.to_text() {
        Some(text) => text,
        None => return PLACEHOLDER.to_string(),
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return PLACEHOLDER.to_string();
    }

    if let Some(caps) = SERIALIZED_DATE.captures(trimmed) {
        // unvalidated on purpose: an out-of-range source month is passed
        // through zero-padded rather than rejected
        let year = &caps[1];
        let mut month: u32 = caps[2].parse().unwrap_or(0);
        if shift_month {
            month += 1;
        }
        let day: u32 = caps[3].parse().unwrap_or(0);
        return format!("{}-{:02}-{:02}", year, month, day);
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }

    text
}
