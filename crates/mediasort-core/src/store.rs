use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::date::ResolvedDate;
use crate::error::SortError;
use crate::media::MediaCategory;

/// Terminal outcome recorded for a successfully processed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Moved,
    Duplicate,
    Review,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Moved => "moved",
            RecordStatus::Duplicate => "duplicate",
            RecordStatus::Review => "review",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "moved" => Some(RecordStatus::Moved),
            "duplicate" => Some(RecordStatus::Duplicate),
            "review" => Some(RecordStatus::Review),
            _ => None,
        }
    }
}

/// One append-only record per processed file.
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub source_path: String,
    pub dest_path: String,
    pub hash: String,
    pub date: Option<ResolvedDate>,
    pub category: MediaCategory,
    pub status: RecordStatus,
    pub processed_at: DateTime<Utc>,
}

/// Persistent migration record store. Appending is the only mutation; the
/// duplicate oracle is `is_duplicate` (same hash, different source path).
pub trait RecordStore {
    /// True iff this content hash was already recorded for a different
    /// source path.
    fn is_duplicate(&self, hash: &str, source_path: &str) -> Result<bool, SortError>;

    /// True iff this exact (hash, source path) pair was already recorded;
    /// re-runs skip such files.
    fn already_processed(&self, hash: &str, source_path: &str) -> Result<bool, SortError>;

    fn append(&mut self, record: &MigrationRecord) -> Result<(), SortError>;

    fn all_records(&self) -> Result<Vec<MigrationRecord>, SortError>;

    /// Hashes recorded as moved more than once, for post-run validation.
    fn moved_hash_conflicts(&self) -> Result<Vec<(String, u64)>, SortError>;
}

/// SQLite-backed record store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    pub fn open(path: &Path) -> Result<Self, SortError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory store, for tests.
    pub fn in_memory() -> Result<Self, SortError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), SortError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS migration_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_path TEXT NOT NULL,
                dest_path TEXT NOT NULL,
                hash TEXT NOT NULL,
                year INTEGER,
                month INTEGER,
                day INTEGER,
                category TEXT NOT NULL,
                status TEXT NOT NULL,
                processed_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_migration_records_hash
                ON migration_records(hash);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_migration_records_hash_source
                ON migration_records(hash, source_path);
            "#,
        )?;
        Ok(())
    }
}

impl RecordStore for SqliteStore {
    fn is_duplicate(&self, hash: &str, source_path: &str) -> Result<bool, SortError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM migration_records WHERE hash = ?1 AND source_path <> ?2",
            params![hash, source_path],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn already_processed(&self, hash: &str, source_path: &str) -> Result<bool, SortError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM migration_records WHERE hash = ?1 AND source_path = ?2",
            params![hash, source_path],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn append(&mut self, record: &MigrationRecord) -> Result<(), SortError> {
        self.conn.execute(
            "INSERT INTO migration_records
                (source_path, dest_path, hash, year, month, day, category, status, processed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.source_path,
                record.dest_path,
                record.hash,
                record.date.map(|d| d.year),
                record.date.map(|d| d.month),
                record.date.and_then(|d| d.day),
                record.category.dir_name(),
                record.status.as_str(),
                record.processed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn all_records(&self) -> Result<Vec<MigrationRecord>, SortError> {
        let mut stmt = self.conn.prepare(
            "SELECT source_path, dest_path, hash, year, month, day, category, status, processed_at
             FROM migration_records ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            let year: Option<i32> = row.get(3)?;
            let month: Option<u32> = row.get(4)?;
            let day: Option<u32> = row.get(5)?;
            let category: String = row.get(6)?;
            let status: String = row.get(7)?;
            let processed_at: String = row.get(8)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                year,
                month,
                day,
                category,
                status,
                processed_at,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (source_path, dest_path, hash, year, month, day, category, status, processed_at) =
                row?;
            let date = match (year, month) {
                (Some(year), Some(month)) => Some(ResolvedDate { year, month, day }),
                _ => None,
            };
            let category = MediaCategory::from_str(&category)
                .ok_or_else(|| SortError::CorruptRecord(format!("category {:?}", category)))?;
            let status = RecordStatus::from_str(&status)
                .ok_or_else(|| SortError::CorruptRecord(format!("status {:?}", status)))?;
            let processed_at = DateTime::parse_from_rfc3339(&processed_at)
                .map_err(|e| SortError::CorruptRecord(e.to_string()))?
                .with_timezone(&Utc);
            records.push(MigrationRecord {
                source_path,
                dest_path,
                hash,
                date,
                category,
                status,
                processed_at,
            });
        }
        Ok(records)
    }

    fn moved_hash_conflicts(&self) -> Result<Vec<(String, u64)>, SortError> {
        let mut stmt = self.conn.prepare(
            "SELECT hash, COUNT(*) AS n FROM migration_records
             WHERE status = 'moved' GROUP BY hash HAVING n > 1",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;
        let mut conflicts = Vec::new();
        for row in rows {
            conflicts.push(row?);
        }
        Ok(conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: &str, hash: &str, status: RecordStatus) -> MigrationRecord {
        MigrationRecord {
            source_path: source.to_string(),
            dest_path: format!("/archive/{}", source),
            hash: hash.to_string(),
            date: Some(ResolvedDate {
                year: 2024,
                month: 4,
                day: Some(10),
            }),
            category: MediaCategory::Photo,
            status,
            processed_at: Utc::now(),
        }
    }

    #[test]
    fn test_append_and_read_back() {
        let mut store = SqliteStore::in_memory().unwrap();
        store
            .append(&record("/src/a.jpg", "h1", RecordStatus::Moved))
            .unwrap();

        let records = store.all_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hash, "h1");
        assert_eq!(records[0].status, RecordStatus::Moved);
        assert_eq!(records[0].category, MediaCategory::Photo);
        assert_eq!(
            records[0].date,
            Some(ResolvedDate {
                year: 2024,
                month: 4,
                day: Some(10)
            })
        );
    }

    #[test]
    fn test_duplicate_oracle_needs_different_source() {
        let mut store = SqliteStore::in_memory().unwrap();
        store
            .append(&record("/src/a.jpg", "h1", RecordStatus::Moved))
            .unwrap();

        assert!(store.is_duplicate("h1", "/src/b.jpg").unwrap());
        assert!(!store.is_duplicate("h1", "/src/a.jpg").unwrap());
        assert!(!store.is_duplicate("h2", "/src/b.jpg").unwrap());
    }

    #[test]
    fn test_already_processed() {
        let mut store = SqliteStore::in_memory().unwrap();
        store
            .append(&record("/src/a.jpg", "h1", RecordStatus::Moved))
            .unwrap();

        assert!(store.already_processed("h1", "/src/a.jpg").unwrap());
        assert!(!store.already_processed("h1", "/src/b.jpg").unwrap());
    }

    #[test]
    fn test_dateless_record_round_trip() {
        let mut store = SqliteStore::in_memory().unwrap();
        let mut r = record("/src/x.jpg", "h9", RecordStatus::Review);
        r.date = None;
        store.append(&r).unwrap();

        let records = store.all_records().unwrap();
        assert_eq!(records[0].date, None);
        assert_eq!(records[0].status, RecordStatus::Review);
    }

    #[test]
    fn test_moved_hash_conflicts() {
        let mut store = SqliteStore::in_memory().unwrap();
        store
            .append(&record("/src/a.jpg", "h1", RecordStatus::Moved))
            .unwrap();
        store
            .append(&record("/src/b.jpg", "h1", RecordStatus::Moved))
            .unwrap();
        store
            .append(&record("/src/c.jpg", "h2", RecordStatus::Moved))
            .unwrap();

        let conflicts = store.moved_hash_conflicts().unwrap();
        assert_eq!(conflicts, vec![("h1".to_string(), 2)]);
    }
}
