pub mod guess;

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

/// Metadata fields consumed by the resolver, in priority order.
pub const FIELD_DATE_TIME_ORIGINAL: &str = "DateTimeOriginal";
pub const FIELD_CREATE_DATE: &str = "CreateDate";

/// Capture date resolved for a file. Derived once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub year: i32,
    pub month: u32,
    pub day: Option<u32>,
}

impl ResolvedDate {
    pub fn from_naive(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: Some(date.day()),
        }
    }

    /// Zero-padded directory components.
    pub fn year_dir(&self) -> String {
        format!("{:04}", self.year)
    }

    pub fn month_dir(&self) -> String {
        format!("{:02}", self.month)
    }
}

/// Resolve a capture date from metadata fields and the filename.
/// Priority: DateTimeOriginal, then CreateDate, then a filename pattern.
/// Malformed field values are treated as absent and the chain continues.
pub fn resolve(fields: &HashMap<String, String>, filename: &str) -> Option<ResolvedDate> {
    for key in [FIELD_DATE_TIME_ORIGINAL, FIELD_CREATE_DATE] {
        if let Some(value) = fields.get(key) {
            if let Some(date) = parse_metadata_date(value) {
                return Some(date);
            }
        }
    }
    guess::date_from_filename(filename)
}

/// Parse a metadata datetime string. EXIF uses "YYYY:MM:DD HH:MM:SS" but
/// tools emit `-`, `/`, `\` and `.` separated variants too.
fn parse_metadata_date(value: &str) -> Option<ResolvedDate> {
    let cleaned = value
        .trim()
        .replace('-', ":")
        .replace('/', ":")
        .replace('\\', ":")
        .replace('.', ":");

    let date_part = cleaned.split(' ').next()?;
    let date = NaiveDate::parse_from_str(date_part, "%Y:%m:%d").ok()?;
    if !plausible_year(date.year()) {
        return None;
    }
    Some(ResolvedDate::from_naive(date))
}

pub(crate) fn plausible_year(year: i32) -> bool {
    (1800..=2099).contains(&year)
}
