use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Seam for the destination free-space lookup, so the capacity pre-flight is
/// testable without filling a disk.
pub trait SpaceProbe {
    fn available_space(&self, path: &Path) -> io::Result<u64>;
}

/// Real filesystem probe.
pub struct DiskProbe;

impl SpaceProbe for DiskProbe {
    fn available_space(&self, path: &Path) -> io::Result<u64> {
        fs2::available_space(path)
    }
}

/// Copy a file and carry over the source modification time. The mtime is
/// best-effort: the copied bytes matter, the timestamp does not.
pub fn copy_preserving_mtime(src: &Path, dest: &Path) -> io::Result<u64> {
    let bytes = fs::copy(src, dest)?;
    if let Ok(meta) = fs::metadata(src) {
        let mtime = filetime::FileTime::from_last_modification_time(&meta);
        if let Err(err) = filetime::set_file_mtime(dest, mtime) {
            debug!(dest = %dest.display(), "could not preserve mtime: {err}");
        }
    }
    Ok(bytes)
}

/// Per-directory cache of names present at a destination. Each directory is
/// read once on first access; names chosen during the run are added so
/// collision checks stay consistent without re-statting.
#[derive(Default)]
pub struct DirNameIndex {
    names: HashMap<PathBuf, HashSet<String>>,
}

impl DirNameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names currently taken in `dir`, seeding from the filesystem on first
    /// access. A missing directory seeds empty.
    pub fn names(&mut self, dir: &Path) -> &HashSet<String> {
        self.names
            .entry(dir.to_path_buf())
            .or_insert_with(|| read_dir_names(dir))
    }

    pub fn insert(&mut self, dir: &Path, name: String) {
        self.names
            .entry(dir.to_path_buf())
            .or_insert_with(|| read_dir_names(dir))
            .insert(name);
    }
}

fn read_dir_names(dir: &Path) -> HashSet<String> {
    let mut names = HashSet::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return names;
    };
    for entry in entries.flatten() {
        names.insert(entry.file_name().to_string_lossy().to_string());
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_seeds_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("existing.jpg"), b"x").unwrap();

        let mut index = DirNameIndex::new();
        assert!(index.names(dir.path()).contains("existing.jpg"));

        index.insert(dir.path(), "chosen.jpg".to_string());
        assert!(index.names(dir.path()).contains("chosen.jpg"));
    }

    #[test]
    fn test_missing_directory_seeds_empty() {
        let mut index = DirNameIndex::new();
        assert!(index.names(Path::new("/nonexistent/dir")).is_empty());
    }

    #[test]
    fn test_copy_preserves_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.jpg");
        let dest = dir.path().join("dest.jpg");
        fs::write(&src, b"payload").unwrap();
        let old = filetime::FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&src, old).unwrap();

        let bytes = copy_preserving_mtime(&src, &dest).unwrap();
        assert_eq!(bytes, 7);
        let meta = fs::metadata(&dest).unwrap();
        assert_eq!(
            filetime::FileTime::from_last_modification_time(&meta).unix_seconds(),
            1_600_000_000
        );
    }
}
