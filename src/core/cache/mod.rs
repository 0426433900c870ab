//! # Cache Module
//!
//! Persists partial content hashes so rescans only read new or changed files.
//!
//! An entry is reused only while the file keeps the size and modification
//! time (second precision) it had when hashed, and only for the same sample
//! window size.
//!
//! ## Backends
//! - `SqliteCache` - Persistent storage using SQLite
//! - `InMemoryCache` - For testing

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryCache;
pub use sqlite::SqliteCache;
pub use traits::CacheBackend;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// File name of the default cache database
pub const CACHE_FILE_NAME: &str = "hashes.db";

/// `<user cache dir>/media-library-cleaner/hashes.db`, when the platform has one
pub fn default_cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("media-library-cleaner").join(CACHE_FILE_NAME))
}

/// The file as it is now, plus the window it would be hashed with
#[derive(Debug, Clone, Copy)]
pub struct HashKey<'a> {
    pub path: &'a Path,
    pub file_size: u64,
    pub file_modified: SystemTime,
    pub sample_size: u64,
}

impl HashKey<'_> {
    /// Entry recording `hash` as the fingerprint of this key
    pub fn entry(&self, hash: String) -> CacheEntry {
        CacheEntry::new(
            self.path.to_path_buf(),
            hash,
            self.sample_size,
            self.file_size,
            self.file_modified,
        )
    }
}

/// A cached partial hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Path to the video file
    pub path: PathBuf,
    /// Hex fingerprint
    pub hash: String,
    /// Window size the fingerprint was computed with
    pub sample_size: u64,
    /// File size at time of hashing
    pub file_size: u64,
    /// File modification time at time of hashing
    pub file_modified: SystemTime,
    /// When the entry was cached
    pub cached_at: SystemTime,
}

pub(crate) fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl CacheEntry {
    pub fn new(path: PathBuf, hash: String, sample_size: u64, file_size: u64, file_modified: SystemTime) -> Self {
        Self {
            path,
            hash,
            sample_size,
            file_size,
            file_modified,
            cached_at: SystemTime::now(),
        }
    }

    /// Whether the entry still describes the file and was hashed with the
    /// same window. Timestamps compare at second precision (SQLite stores seconds).
    pub fn is_valid_for(&self, key: &HashKey<'_>) -> bool {
        self.sample_size == key.sample_size
            && self.file_size == key.file_size
            && unix_secs(self.file_modified) == unix_secs(key.file_modified)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub oldest_entry: Option<SystemTime>,
    pub newest_entry: Option<SystemTime>,
}
