use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::media::MediaCategory;

/// Runtime configuration, loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory to scan for media files
    pub source: PathBuf,
    /// Root of the destination archive tree
    pub destination: PathBuf,
    /// SQLite migration record database
    pub database: PathBuf,
    /// Log file path
    pub log: PathBuf,
    pub extensions: Extensions,
}

/// Recognized file extensions per category. Entries may be given with or
/// without a leading dot, any case.
#[derive(Debug, Clone, Deserialize)]
pub struct Extensions {
    pub photo: Vec<String>,
    pub video: Vec<String>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.extensions.photo.is_empty() || !self.extensions.video.is_empty(),
            "config lists no recognized extensions"
        );
        Ok(())
    }

    /// Normalized extension -> category lookup table.
    pub fn extension_map(&self) -> HashMap<String, MediaCategory> {
        let mut map = HashMap::new();
        for ext in &self.extensions.photo {
            map.insert(normalize_extension(ext), MediaCategory::Photo);
        }
        for ext in &self.extensions.video {
            map.insert(normalize_extension(ext), MediaCategory::Video);
        }
        map
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_map() {
        let text = r#"
            source = "/data/incoming"
            destination = "/data/archive"
            database = "/data/state/records.sqlite"
            log = "/data/state/mediasort.log"

            [extensions]
            photo = [".jpg", ".JPEG", "png"]
            video = [".mp4", ".mov"]
        "#;
        let config: Config = toml::from_str(text).unwrap();
        let map = config.extension_map();
        assert_eq!(map.get("jpg"), Some(&MediaCategory::Photo));
        assert_eq!(map.get("jpeg"), Some(&MediaCategory::Photo));
        assert_eq!(map.get("png"), Some(&MediaCategory::Photo));
        assert_eq!(map.get("mp4"), Some(&MediaCategory::Video));
        assert_eq!(map.get("gif"), None);
    }
}
