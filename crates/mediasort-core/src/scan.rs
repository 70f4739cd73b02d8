use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::media::{MediaCategory, MediaFile};

/// Outcome of the source scan.
pub struct ScanResult {
    pub files: Vec<MediaFile>,
    /// Files whose extension is not in the allow-lists
    pub unsupported: u64,
    /// Entries the walk could not read (unreadable directories, stat
    /// failures); logged and skipped, never fatal
    pub errors: u64,
}

/// Recursively scan the source tree and classify files by extension.
/// Entries are sorted by file name so processing order is deterministic.
/// An unreadable entry is that entry's failure, not the scan's.
pub fn scan_source(
    source: &Path,
    extensions: &HashMap<String, MediaCategory>,
) -> anyhow::Result<ScanResult> {
    let mut files = Vec::new();
    let mut unsupported = 0u64;
    let mut errors = 0u64;

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("source walk error: {err}");
                errors += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let Some(&category) = extensions.get(&ext) else {
            debug!(path = %path.display(), extension = %ext, "ignored unsupported file");
            unsupported += 1;
            continue;
        };

        let filename = entry.file_name().to_string_lossy().to_string();
        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(err) => {
                warn!(path = %path.display(), "failed to stat file: {err}");
                errors += 1;
                continue;
            }
        };
        files.push(MediaFile::new(
            path.to_path_buf(),
            filename,
            ext,
            category,
            size,
        ));
    }

    Ok(ScanResult {
        files,
        unsupported,
        errors,
    })
}
