use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{In, Tag};

use crate::date::{FIELD_CREATE_DATE, FIELD_DATE_TIME_ORIGINAL};

/// Capability seam for the external metadata-extraction tool. Returns a
/// field-name -> value mapping; fields the resolver ignores are harmless.
pub trait MetadataExtractor {
    fn extract_fields(&self, path: &Path) -> anyhow::Result<HashMap<String, String>>;
}

/// EXIF-backed extractor. Non-image files and images without a parseable
/// EXIF container yield an empty mapping; only an unreadable file is an
/// error.
pub struct ExifExtractor;

impl MetadataExtractor for ExifExtractor {
    fn extract_fields(&self, path: &Path) -> anyhow::Result<HashMap<String, String>> {
        if !is_image(path) {
            return Ok(HashMap::new());
        }

        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let Ok(data) = exif::Reader::new().read_from_container(&mut reader) else {
            return Ok(HashMap::new());
        };

        let mut fields = HashMap::new();
        for (tag, name) in [
            (Tag::DateTimeOriginal, FIELD_DATE_TIME_ORIGINAL),
            // exiftool's CreateDate is EXIF DateTimeDigitized
            (Tag::DateTimeDigitized, FIELD_CREATE_DATE),
        ] {
            if let Some(field) = data.get_field(tag, In::PRIMARY) {
                fields.insert(name.to_string(), field.display_value().to_string());
            }
        }
        Ok(fields)
    }
}

fn is_image(path: &Path) -> bool {
    mime_guess::from_path(path)
        .first()
        .map_or(false, |mime| mime.type_() == mime_guess::mime::IMAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_non_image_yields_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        fs::write(&path, b"not really a video").unwrap();
        let fields = ExifExtractor.extract_fields(&path).unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_image_without_exif_yields_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.jpg");
        fs::write(&path, b"\xff\xd8\xff\xdbnot-exif").unwrap();
        let fields = ExifExtractor.extract_fields(&path).unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_unreadable_image_is_error() {
        assert!(ExifExtractor
            .extract_fields(Path::new("/nonexistent/photo.jpg"))
            .is_err());
    }
}
