//! Storage seam for partial hashes.

use super::{CacheEntry, CacheStats, HashKey};
use crate::error::CacheError;
use std::path::Path;

/// Where partial hashes live between runs. Shared by the analysis workers.
pub trait CacheBackend: Send + Sync {
    /// The stored fingerprint for `key.path`, or `None` when there is none or
    /// it no longer matches the key's size, modification second or window.
    fn get(&self, key: &HashKey<'_>) -> Result<Option<CacheEntry>, CacheError>;

    fn set(&self, entry: CacheEntry) -> Result<(), CacheError>;

    /// The pipeline writes a whole run's fresh hashes through this once
    /// analysis finishes.
    fn set_batch(&self, entries: &[CacheEntry]) -> Result<(), CacheError> {
        entries.iter().try_for_each(|entry| self.set(entry.clone()))
    }

    fn remove(&self, path: &Path) -> Result<(), CacheError>;

    fn clear(&self) -> Result<(), CacheError>;

    fn stats(&self) -> Result<CacheStats, CacheError>;

    /// Forget videos that were deleted or moved. Returns how many entries went.
    fn prune_orphans(&self) -> Result<usize, CacheError>;
}
