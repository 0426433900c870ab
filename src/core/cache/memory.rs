//! In-memory cache backend.

use super::{CacheBackend, CacheEntry, CacheStats, HashKey};
use crate::error::CacheError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cache that lives for one run; used with `--no-cache` and in tests
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
}

fn poisoned() -> CacheError {
    CacheError::Corrupted {
        path: PathBuf::from("memory"),
    }
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<PathBuf, CacheEntry>>, CacheError> {
        self.entries.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<PathBuf, CacheEntry>>, CacheError> {
        self.entries.write().map_err(|_| poisoned())
    }
}

impl CacheBackend for InMemoryCache {
    fn get(&self, key: &HashKey<'_>) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self
            .read()?
            .get(key.path)
            .filter(|entry| entry.is_valid_for(key))
            .cloned())
    }

    fn set(&self, entry: CacheEntry) -> Result<(), CacheError> {
        self.write()?.insert(entry.path.clone(), entry);
        Ok(())
    }

    fn set_batch(&self, entries: &[CacheEntry]) -> Result<(), CacheError> {
        let mut map = self.write()?;
        for entry in entries {
            map.insert(entry.path.clone(), entry.clone());
        }
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<(), CacheError> {
        self.write()?.remove(path);
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.write()?.clear();
        Ok(())
    }

    fn stats(&self) -> Result<CacheStats, CacheError> {
        let entries = self.read()?;
        Ok(CacheStats {
            total_entries: entries.len(),
            oldest_entry: entries.values().map(|e| e.cached_at).min(),
            newest_entry: entries.values().map(|e| e.cached_at).max(),
        })
    }

    fn prune_orphans(&self) -> Result<usize, CacheError> {
        let mut entries = self.write()?;
        let before = entries.len();
        entries.retain(|path, _| path.exists());
        Ok(before - entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn key(path: &str) -> HashKey<'_> {
        HashKey {
            path: Path::new(path),
            file_size: 1000,
            file_modified: UNIX_EPOCH + Duration::from_secs(1_700_000_000),
            sample_size: 1024,
        }
    }

    fn create_entry(path: &str) -> CacheEntry {
        key(path).entry("deadbeef".into())
    }

    #[test]
    fn cache_miss_returns_none() {
        let cache = InMemoryCache::new();
        assert!(cache.get(&key("/missing.mkv")).unwrap().is_none());
    }

    #[test]
    fn cache_hit_returns_entry() {
        let cache = InMemoryCache::new();
        cache.set(create_entry("/heat.mkv")).unwrap();

        let result = cache.get(&key("/heat.mkv")).unwrap();
        assert_eq!(result.unwrap().hash, "deadbeef");
    }

    #[test]
    fn changed_size_misses() {
        let cache = InMemoryCache::new();
        cache.set(create_entry("/heat.mkv")).unwrap();

        let shrunk = HashKey {
            file_size: 999,
            ..key("/heat.mkv")
        };
        assert!(cache.get(&shrunk).unwrap().is_none());
    }

    #[test]
    fn changed_sample_window_misses() {
        let cache = InMemoryCache::new();
        cache.set(create_entry("/heat.mkv")).unwrap();

        let narrower = HashKey {
            sample_size: 512,
            ..key("/heat.mkv")
        };
        assert!(cache.get(&narrower).unwrap().is_none());
        assert_eq!(
            cache.stats().unwrap().total_entries,
            1,
            "a miss does not evict"
        );
    }

    #[test]
    fn batch_then_stats_then_clear() {
        let cache = InMemoryCache::new();
        cache
            .set_batch(&[create_entry("/a.mkv"), create_entry("/b.mkv")])
            .unwrap();
        assert_eq!(cache.stats().unwrap().total_entries, 2);

        cache.remove(Path::new("/a.mkv")).unwrap();
        assert_eq!(cache.stats().unwrap().total_entries, 1);

        cache.clear().unwrap();
        assert_eq!(cache.stats().unwrap().total_entries, 0);
    }

    #[test]
    fn prune_drops_missing_files() {
        let cache = InMemoryCache::new();
        cache.set(create_entry("/nonexistent/a.mkv")).unwrap();
        assert_eq!(cache.prune_orphans().unwrap(), 1);
    }
}
