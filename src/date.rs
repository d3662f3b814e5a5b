//! Works out which market day a screenshot belongs to.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static NUMERIC_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})\b").unwrap());
static NAMED_MONTH_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s*(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?\s*(\d{4}|\d{2})\b")
        .unwrap()
});
static FILENAME_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(\d{4})[-/_.]?(\d{2})[-/_.]?(\d{2})(?:\D|$)").unwrap());

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    NumericText,
    NamedMonthText,
    Filename,
    Modified,
}

fn full_year(year: i32) -> Option<i32> {
    match year {
        0..=99 => Some(2000 + year),
        1000..=9999 => Some(year),
        _ => None,
    }
}

/// `DD/MM/YY(YY)` or `DD-MM-YY(YY)`, day first. Falls back to month first
/// when the day-first reading is not a real date.
pub fn numeric_date(text: &str) -> Option<NaiveDate> {
    let caps = NUMERIC_DATE.captures(text)?;
    let first: u32 = caps[1].parse().ok()?;
    let second: u32 = caps[2].parse().ok()?;
    let year = full_year(caps[3].parse().ok()?)?;
    NaiveDate::from_ymd_opt(year, second, first).or_else(|| NaiveDate::from_ymd_opt(year, first, second))
}

/// `DD <Month> YYYY`, e.g. `11 Dec 2025` or `6 November 2025`.
pub fn named_month_date(text: &str) -> Option<NaiveDate> {
    let caps = NAMED_MONTH_DATE.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month_name = caps[2].to_lowercase();
    let month = MONTHS.iter().position(|m| *m == month_name)? as u32 + 1;
    let year = full_year(caps[3].parse().ok()?)?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `YYYY-MM-DD` and its `_`, `.`, `/` or unseparated variants in a file name.
pub fn filename_date(name: &str) -> Option<NaiveDate> {
    let caps = FILENAME_DATE.captures(name)?;
    NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
}

fn modified_date(path: &Path) -> Option<NaiveDate> {
    let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok()?;
    Some(DateTime::<Utc>::from(modified).date_naive())
}

/// Tries the OCR text, then the file name, then the file's modification time.
pub fn resolve_date(text: &str, path: &Path) -> (NaiveDate, DateSource) {
    if let Some(date) = numeric_date(text) {
        return (date, DateSource::NumericText);
    }
    if let Some(date) = named_month_date(text) {
        return (date, DateSource::NamedMonthText);
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if let Some(date) = filename_date(&name) {
        return (date, DateSource::Filename);
    }
    match modified_date(path) {
        Some(date) => (date, DateSource::Modified),
        None => {
            log::warn!("No usable date for {}, using today", path.display());
            (Utc::now().date_naive(), DateSource::Modified)
        }
    }
}
