use std::path::PathBuf;

/// Media category, derived from the configured extension allow-lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaCategory {
    Photo,
    Video,
}

impl MediaCategory {
    /// Archive folder name for this category.
    pub fn dir_name(&self) -> &'static str {
        match self {
            MediaCategory::Photo => "PHOTO",
            MediaCategory::Video => "VIDEO",
        }
    }

    /// Folder name for duplicates of this category.
    pub fn duplicates_dir_name(&self) -> &'static str {
        match self {
            MediaCategory::Photo => "PHOTO_DUPLICATES",
            MediaCategory::Video => "VIDEO_DUPLICATES",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PHOTO" => Some(MediaCategory::Photo),
            "VIDEO" => Some(MediaCategory::Video),
            _ => None,
        }
    }
}

/// A media file discovered during the source scan. Immutable once read.
#[derive(Debug, Clone)]
pub struct MediaFile {
    /// Absolute path in the source tree
    pub path: PathBuf,
    /// Just the filename
    pub filename: String,
    /// Lowercased extension without the dot
    pub extension: String,
    /// Photo or video, from the extension allow-list
    pub category: MediaCategory,
    /// File size in bytes
    pub size: u64,
}

impl MediaFile {
    pub fn new(
        path: PathBuf,
        filename: String,
        extension: String,
        category: MediaCategory,
        size: u64,
    ) -> Self {
        Self {
            path,
            filename,
            extension,
            category,
            size,
        }
    }
}
