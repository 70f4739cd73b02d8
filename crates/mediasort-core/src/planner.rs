use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::date::ResolvedDate;
use crate::error::SortError;
use crate::media::MediaCategory;

/// Quarantine folder for files without a determinable capture date.
pub const REVIEW_DIR: &str = "ToReview";

/// Collision suffix search bound; exhaustion is a per-file failure.
pub const MAX_SUFFIX: u32 = 10_000;

/// Compute the destination directory for a file. Duplicate status overrides
/// dated placement and review: duplicates always land flat under
/// `<CATEGORY>_DUPLICATES`.
pub fn destination_dir(
    dest_root: &Path,
    category: MediaCategory,
    duplicate: bool,
    date: Option<&ResolvedDate>,
) -> PathBuf {
    if duplicate {
        return dest_root.join(category.duplicates_dir_name());
    }
    match date {
        Some(d) => dest_root
            .join(category.dir_name())
            .join(d.year_dir())
            .join(d.month_dir()),
        None => dest_root.join(REVIEW_DIR),
    }
}

/// Pick a free filename in a destination directory. If `filename` is taken,
/// append `__1`, `__2`, ... before the extension until an unused name is
/// found (lowest unused integer, deterministic for a given name set).
pub fn unique_name(
    dir: &Path,
    existing: &HashSet<String>,
    filename: &str,
) -> Result<String, SortError> {
    if !existing.contains(filename) {
        return Ok(filename.to_string());
    }

    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let ext = Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    for n in 1..=MAX_SUFFIX {
        let candidate = if ext.is_empty() {
            format!("{}__{}", stem, n)
        } else {
            format!("{}__{}.{}", stem, n, ext)
        };
        if !existing.contains(&candidate) {
            return Ok(candidate);
        }
    }

    Err(SortError::CollisionExhausted {
        dir: dir.to_path_buf(),
        name: filename.to_string(),
        limit: MAX_SUFFIX,
    })
}
