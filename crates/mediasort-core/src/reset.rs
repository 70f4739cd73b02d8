use std::fs;

use tracing::info;

use crate::config::Config;
use crate::media::MediaCategory;
use crate::planner::REVIEW_DIR;

/// Irrecoverably delete persisted state and generated output: the record
/// database, the log file, and the generated destination folders. Source
/// files are untouched.
pub fn reset(config: &Config) -> anyhow::Result<()> {
    if config.database.exists() {
        fs::remove_file(&config.database)?;
        info!(path = %config.database.display(), "removed record database");
    }
    if config.log.exists() {
        fs::remove_file(&config.log)?;
        info!(path = %config.log.display(), "removed log file");
    }

    let folders = [
        MediaCategory::Photo.dir_name(),
        MediaCategory::Video.dir_name(),
        MediaCategory::Photo.duplicates_dir_name(),
        MediaCategory::Video.duplicates_dir_name(),
        REVIEW_DIR,
    ];
    for folder in folders {
        let path = config.destination.join(folder);
        if path.exists() {
            fs::remove_dir_all(&path)?;
            info!(path = %path.display(), "removed destination folder");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Extensions;

    #[test]
    fn test_reset_removes_generated_state() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("archive");
        fs::create_dir_all(dest.join("PHOTO/2024/04")).unwrap();
        fs::create_dir_all(dest.join("ToReview")).unwrap();
        fs::create_dir_all(dest.join("untouched")).unwrap();
        let database = dir.path().join("records.sqlite");
        let log = dir.path().join("run.log");
        fs::write(&database, b"db").unwrap();
        fs::write(&log, b"log").unwrap();

        let config = Config {
            source: dir.path().join("source"),
            destination: dest.clone(),
            database: database.clone(),
            log: log.clone(),
            extensions: Extensions {
                photo: vec!["jpg".to_string()],
                video: vec![],
            },
        };

        reset(&config).unwrap();
        assert!(!database.exists());
        assert!(!log.exists());
        assert!(!dest.join("PHOTO").exists());
        assert!(!dest.join("ToReview").exists());
        assert!(dest.join("untouched").exists());
    }
}
