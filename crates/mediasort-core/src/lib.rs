pub mod config;
pub mod date;
pub mod error;
pub mod fsops;
pub mod hash;
pub mod media;
pub mod metadata;
pub mod planner;
pub mod reset;
pub mod scan;
pub mod store;

use std::fs;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

pub use config::Config;
pub use error::SortError;
pub use store::{MigrationRecord, RecordStatus, RecordStore, SqliteStore};

use fsops::{DirNameIndex, DiskProbe, SpaceProbe};
use media::MediaFile;
use metadata::{ExifExtractor, MetadataExtractor};

/// Progress callback: (stage, current, total, message).
pub type ProgressCallback = dyn Fn(&str, u64, u64, &str) + Send + Sync;

/// Rate-limits progress reporting; the final update always goes through.
pub struct ThrottledProgress<'a> {
    inner: &'a ProgressCallback,
    min_interval: Duration,
    last_emit: Mutex<Option<Instant>>,
}

impl<'a> ThrottledProgress<'a> {
    pub fn new(inner: &'a ProgressCallback) -> Self {
        Self {
            inner,
            min_interval: Duration::from_millis(200),
            last_emit: Mutex::new(None),
        }
    }

    pub fn report(&self, stage: &str, current: u64, total: u64, message: &str) {
        if current + 1 < total {
            let mut last = self.last_emit.lock().unwrap();
            match *last {
                Some(at) if at.elapsed() < self.min_interval => return,
                _ => *last = Some(Instant::now()),
            }
        }
        (self.inner)(stage, current, total, message);
    }
}

/// End-of-run summary counts.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub moved: u64,
    pub duplicates: u64,
    pub review: u64,
    pub failed: u64,
    /// Files already recorded with the same hash + source path (re-runs)
    pub skipped: u64,
    pub unsupported: u64,
    pub warnings: Vec<String>,
}

/// Run the pipeline with the production collaborators: EXIF metadata, the
/// SQLite store at the configured path, and the real disk probe.
pub fn process(config: &Config, progress_callback: &ProgressCallback) -> anyhow::Result<RunReport> {
    let mut store = SqliteStore::open(&config.database)?;
    run(
        config,
        &ExifExtractor,
        &mut store,
        &DiskProbe,
        progress_callback,
    )
}

/// Run the pipeline with injected collaborators. Per-file failures are
/// logged and counted; only the capacity pre-flight aborts the whole run.
pub fn run(
    config: &Config,
    extractor: &dyn MetadataExtractor,
    store: &mut dyn RecordStore,
    probe: &dyn SpaceProbe,
    progress_callback: &ProgressCallback,
) -> anyhow::Result<RunReport> {
    let tp = ThrottledProgress::new(progress_callback);
    let started = Instant::now();

    let extensions = config.extension_map();
    let scan = scan::scan_source(&config.source, &extensions)?;

    let mut report = RunReport {
        unsupported: scan.unsupported,
        failed: scan.errors,
        ..Default::default()
    };
    if scan.unsupported > 0 {
        info!(count = scan.unsupported, "ignored unsupported files");
    }
    if scan.errors > 0 {
        warn!(count = scan.errors, "unreadable entries skipped during scan");
    }
    if scan.files.is_empty() {
        info!("no supported files found in source directory");
        return Ok(report);
    }

    // Pre-flight: the whole batch must fit before any copy starts.
    fs::create_dir_all(&config.destination)?;
    let required: u64 = scan.files.iter().map(|f| f.size).sum();
    let available = probe.available_space(&config.destination)?;
    if available < required {
        return Err(SortError::InsufficientSpace {
            destination: config.destination.clone(),
            required,
            available,
        }
        .into());
    }

    let total = scan.files.len() as u64;
    let mut dir_index = DirNameIndex::new();
    for (idx, file) in scan.files.iter().enumerate() {
        tp.report("sort", idx as u64, total, &file.filename);
        if let Err(err) = process_file(file, config, extractor, store, &mut dir_index, &mut report)
        {
            warn!(path = %file.path.display(), "failed to process file: {err:#}");
            report.failed += 1;
        }
    }

    for (hash, count) in store.moved_hash_conflicts()? {
        let msg = format!("hash {} recorded as moved {} times", hash, count);
        warn!("{}", msg);
        report.warnings.push(msg);
    }

    info!(
        moved = report.moved,
        duplicates = report.duplicates,
        review = report.review,
        failed = report.failed,
        skipped = report.skipped,
        unsupported = report.unsupported,
        elapsed_secs = started.elapsed().as_secs_f64(),
        "run complete"
    );
    Ok(report)
}

/// DISCOVERED -> HASHED -> DATE_RESOLVED -> PLANNED -> COPIED -> RECORDED for
/// a single file. Any error here is that file's failure, not the run's.
fn process_file(
    file: &MediaFile,
    config: &Config,
    extractor: &dyn MetadataExtractor,
    store: &mut dyn RecordStore,
    dir_index: &mut DirNameIndex,
    report: &mut RunReport,
) -> anyhow::Result<()> {
    let source_path = file.path.to_string_lossy().to_string();
    let hash = hash::hash_file(&file.path)?;

    if store.already_processed(&hash, &source_path)? {
        debug!(path = %file.path.display(), "already recorded, skipping");
        report.skipped += 1;
        return Ok(());
    }

    let fields = extractor.extract_fields(&file.path)?;
    let date = date::resolve(&fields, &file.filename);
    let duplicate = store.is_duplicate(&hash, &source_path)?;

    let dir = planner::destination_dir(&config.destination, file.category, duplicate, date.as_ref());
    fs::create_dir_all(&dir)?;
    let name = planner::unique_name(&dir, dir_index.names(&dir), &file.filename)?;
    let dest = dir.join(&name);

    fsops::copy_preserving_mtime(&file.path, &dest)?;
    dir_index.insert(&dir, name);

    let status = if duplicate {
        RecordStatus::Duplicate
    } else if date.is_some() {
        RecordStatus::Moved
    } else {
        RecordStatus::Review
    };

    store.append(&MigrationRecord {
        source_path,
        dest_path: dest.to_string_lossy().to_string(),
        hash: hash.clone(),
        date,
        category: file.category,
        status,
        processed_at: Utc::now(),
    })?;

    match status {
        RecordStatus::Moved => report.moved += 1,
        RecordStatus::Duplicate => report.duplicates += 1,
        RecordStatus::Review => report.review += 1,
    }
    info!(
        status = status.as_str(),
        dest = %dest.display(),
        hash = %hash,
        "file processed"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_throttled_progress_rate_limits_but_always_emits_final() {
        let count = std::sync::Arc::new(AtomicU64::new(0));
        let cb_count = count.clone();
        let callback = move |_: &str, _: u64, _: u64, _: &str| {
            cb_count.fetch_add(1, Ordering::SeqCst);
        };
        let tp = ThrottledProgress::new(&callback);

        tp.report("sort", 0, 100, "first");
        tp.report("sort", 1, 100, "suppressed");
        tp.report("sort", 2, 100, "suppressed");
        tp.report("sort", 99, 100, "final");

        // first report and the completing one; the rapid middle two are
        // inside the throttle window
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
