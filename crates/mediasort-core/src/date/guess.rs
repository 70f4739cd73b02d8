use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::{plausible_year, ResolvedDate};

static RE_SEPARATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<y>(18|19|20)\d{2})[-_](?P<m>\d{2})[-_](?P<d>\d{2})").unwrap()
});
static RE_COMPACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<y>(18|19|20)\d{2})(?P<m>\d{2})(?P<d>\d{2})").unwrap());

static PATTERNS: &[&LazyLock<Regex>] = &[&RE_SEPARATED, &RE_COMPACT];

/// Guess a capture date from the filename. Patterns are tried in order; for
/// each, candidate substrings are scanned left to right and the first that
/// validates as a real calendar date wins.
pub fn date_from_filename(filename: &str) -> Option<ResolvedDate> {
    let basename = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    for pattern in PATTERNS {
        for caps in pattern.captures_iter(basename) {
            let year: i32 = caps["y"].parse().ok()?;
            let month: u32 = caps["m"].parse().ok()?;
            let day: u32 = caps["d"].parse().ok()?;
            if !plausible_year(year) {
                continue;
            }
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(ResolvedDate::from_naive(date));
            }
        }
    }

    None
}
