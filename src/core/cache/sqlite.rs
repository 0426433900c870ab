//! SQLite cache backend for persistent storage.

use super::{unix_secs, CacheBackend, CacheEntry, CacheStats, HashKey};
use crate::error::CacheError;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// SQLite-backed persistent cache
///
/// Uses WAL mode so readers proceed while a batch is being written.
pub struct SqliteCache {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

fn query_failed(e: rusqlite::Error) -> CacheError {
    CacheError::QueryFailed(e.to_string())
}

fn from_timestamp(timestamp: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(timestamp.max(0) as u64)
}

impl SqliteCache {
    /// Open or create a cache database at the given path
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        let open_failed = |reason: String| CacheError::OpenFailed {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| open_failed(e.to_string()))?;
        }

        let conn = Connection::open(path).map_err(|e| open_failed(e.to_string()))?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             CREATE TABLE IF NOT EXISTS partial_hashes (
                path TEXT PRIMARY KEY,
                hash TEXT NOT NULL,
                sample_size INTEGER NOT NULL,
                file_size INTEGER NOT NULL,
                file_modified INTEGER NOT NULL,
                cached_at INTEGER NOT NULL
             );",
        )
        .map_err(|e| open_failed(e.to_string()))?;

        tracing::debug!(path = %path.display(), "opened hash cache");

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::Corrupted {
            path: self.db_path.clone(),
        })
    }

    fn insert(conn: &Connection, entry: &CacheEntry) -> Result<(), CacheError> {
        conn.execute(
            "INSERT OR REPLACE INTO partial_hashes
             (path, hash, sample_size, file_size, file_modified, cached_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                entry.path.to_string_lossy(),
                entry.hash,
                entry.sample_size as i64,
                entry.file_size as i64,
                unix_secs(entry.file_modified) as i64,
                unix_secs(entry.cached_at) as i64,
            ],
        )
        .map_err(query_failed)?;
        Ok(())
    }
}

impl CacheBackend for SqliteCache {
    fn get(&self, key: &HashKey<'_>) -> Result<Option<CacheEntry>, CacheError> {
        let conn = self.lock()?;

        let entry = conn
            .query_row(
                "SELECT hash, sample_size, file_size, file_modified, cached_at
                 FROM partial_hashes WHERE path = ?1 AND sample_size = ?2",
                params![key.path.to_string_lossy(), key.sample_size as i64],
                |row| {
                    Ok(CacheEntry {
                        path: key.path.to_path_buf(),
                        hash: row.get(0)?,
                        sample_size: row.get::<_, i64>(1)? as u64,
                        file_size: row.get::<_, i64>(2)? as u64,
                        file_modified: from_timestamp(row.get(3)?),
                        cached_at: from_timestamp(row.get(4)?),
                    })
                },
            )
            .optional()
            .map_err(query_failed)?;

        Ok(entry.filter(|e| e.is_valid_for(key)))
    }

    fn set(&self, entry: CacheEntry) -> Result<(), CacheError> {
        let conn = self.lock()?;
        Self::insert(&conn, &entry)
    }

    fn set_batch(&self, entries: &[CacheEntry]) -> Result<(), CacheError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(query_failed)?;
        for entry in entries {
            Self::insert(&tx, entry)?;
        }
        tx.commit().map_err(query_failed)
    }

    fn remove(&self, path: &Path) -> Result<(), CacheError> {
        self.lock()?
            .execute(
                "DELETE FROM partial_hashes WHERE path = ?",
                [path.to_string_lossy()],
            )
            .map_err(query_failed)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.lock()?
            .execute("DELETE FROM partial_hashes", [])
            .map_err(query_failed)?;
        Ok(())
    }

    fn stats(&self) -> Result<CacheStats, CacheError> {
        let conn = self.lock()?;
        let (total, oldest, newest): (i64, Option<i64>, Option<i64>) = conn
            .query_row(
                "SELECT COUNT(*), MIN(cached_at), MAX(cached_at) FROM partial_hashes",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_failed)?;

        Ok(CacheStats {
            total_entries: total as usize,
            oldest_entry: oldest.map(from_timestamp),
            newest_entry: newest.map(from_timestamp),
        })
    }

    fn prune_orphans(&self) -> Result<usize, CacheError> {
        let conn = self.lock()?;

        let paths: Vec<String> = {
            let mut stmt = conn
                .prepare("SELECT path FROM partial_hashes")
                .map_err(query_failed)?;
            let rows = stmt.query_map([], |row| row.get(0)).map_err(query_failed)?;
            rows.filter_map(|r| r.ok()).collect()
        };

        let mut count = 0;
        for path in paths {
            if !Path::new(&path).exists() {
                conn.execute("DELETE FROM partial_hashes WHERE path = ?", [&path])
                    .map_err(query_failed)?;
                count += 1;
            }
        }

        if count > 0 {
            tracing::info!(removed = count, "pruned cache entries for missing files");
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn whole_second() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    fn key(path: &str, modified: SystemTime) -> HashKey<'_> {
        HashKey {
            path: Path::new(path),
            file_size: 1000,
            file_modified: modified,
            sample_size: 1024,
        }
    }

    fn create_entry(path: &str) -> CacheEntry {
        key(path, whole_second()).entry("cafe".into())
    }

    #[test]
    fn creates_database() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("nested").join("hashes.db");

        let cache = SqliteCache::open(&db_path).unwrap();
        assert!(db_path.exists());
        assert_eq!(cache.path(), db_path);
        assert_eq!(cache.stats().unwrap().total_entries, 0);
    }

    #[test]
    fn stores_and_retrieves() {
        let dir = TempDir::new().unwrap();
        let cache = SqliteCache::open(&dir.path().join("hashes.db")).unwrap();
        cache.set(create_entry("/heat.mkv")).unwrap();

        let hit = cache.get(&key("/heat.mkv", whole_second())).unwrap().unwrap();
        assert_eq!(hit.hash, "cafe");
        assert_eq!(hit.sample_size, 1024);
    }

    #[test]
    fn invalidates_on_modification() {
        let dir = TempDir::new().unwrap();
        let cache = SqliteCache::open(&dir.path().join("hashes.db")).unwrap();
        cache.set(create_entry("/heat.mkv")).unwrap();

        let later = whole_second() + Duration::from_secs(60);
        assert!(cache.get(&key("/heat.mkv", later)).unwrap().is_none());
    }

    #[test]
    fn other_sample_window_misses() {
        let dir = TempDir::new().unwrap();
        let cache = SqliteCache::open(&dir.path().join("hashes.db")).unwrap();
        cache.set(create_entry("/heat.mkv")).unwrap();

        let wider = HashKey {
            sample_size: 2048,
            ..key("/heat.mkv", whole_second())
        };
        assert!(cache.get(&wider).unwrap().is_none());
    }

    #[test]
    fn survives_reopen() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("hashes.db");
        {
            let cache = SqliteCache::open(&db_path).unwrap();
            cache
                .set_batch(&[create_entry("/a.mkv"), create_entry("/b.mkv")])
                .unwrap();
        }
        let cache = SqliteCache::open(&db_path).unwrap();
        assert_eq!(cache.stats().unwrap().total_entries, 2);
    }

    #[test]
    fn remove_prune_and_clear() {
        let dir = TempDir::new().unwrap();
        let cache = SqliteCache::open(&dir.path().join("hashes.db")).unwrap();
        cache
            .set_batch(&[
                create_entry("/nonexistent/a.mkv"),
                create_entry("/nonexistent/b.mkv"),
                create_entry("/nonexistent/c.mkv"),
            ])
            .unwrap();

        cache.remove(Path::new("/nonexistent/a.mkv")).unwrap();
        assert_eq!(cache.prune_orphans().unwrap(), 2);

        cache.set(create_entry("/x.mkv")).unwrap();
        cache.clear().unwrap();
        assert_eq!(cache.stats().unwrap().total_entries, 0);
    }
}
