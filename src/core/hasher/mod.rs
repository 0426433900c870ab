//! # Hasher Module
//!
//! Cheap content fingerprints for exact-duplicate detection.
//!
//! ## How It Works
//! Video files are large, so only a head window, a tail window and the total
//! length are hashed. Re-downloads of the same release are byte-identical and
//! match; different encodes almost never share both windows and the length.
//! Files no larger than two windows are hashed whole.
//!
//! The digest is XXH3-128: fast, non-cryptographic, and plenty for a
//! fingerprint that is never a security boundary.
//!
//! ## Example
//! ```rust,ignore
//! let hasher = PartialHasher::new();
//! if let Some(hash) = hasher.hash_file(&path) {
//!     println!("{hash}");
//! }
//! ```

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use xxhash_rust::xxh3::Xxh3;

/// Default window size at each end of the file
pub const DEFAULT_SAMPLE_SIZE: u64 = 1024 * 1024;

/// Head + tail + length fingerprinting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialHasher {
    sample_size: u64,
}

impl Default for PartialHasher {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl PartialHasher {
    /// Hasher with the default 1 MiB windows
    pub fn new() -> Self {
        Self::default()
    }

    /// Hasher with custom window size (at least one byte)
    pub fn with_sample_size(sample_size: u64) -> Self {
        Self {
            sample_size: sample_size.max(1),
        }
    }

    pub fn sample_size(&self) -> u64 {
        self.sample_size
    }

    /// Fingerprint a file as a hex string. `None` on any I/O error.
    pub fn hash_file(&self, path: &Path) -> Option<String> {
        match self.try_hash(path) {
            Ok(hash) => Some(hash),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "partial hash failed");
                None
            }
        }
    }

    fn try_hash(&self, path: &Path) -> io::Result<String> {
        let mut file = File::open(path)?;
        let len = file.metadata()?.len();
        let mut hasher = Xxh3::new();

        if len <= self.sample_size.saturating_mul(2) {
            let mut content = Vec::with_capacity(len as usize);
            file.read_to_end(&mut content)?;
            hasher.update(&content);
        } else {
            let window = self.sample_size as usize;
            let mut buffer = vec![0u8; window];

            file.read_exact(&mut buffer)?;
            hasher.update(&buffer);

            file.seek(SeekFrom::End(-(self.sample_size as i64)))?;
            file.read_exact(&mut buffer)?;
            hasher.update(&buffer);

            hasher.update(&len.to_le_bytes());
        }

        Ok(format!("{:032x}", hasher.digest128()))
    }
}

/// Fingerprint with an explicit window size
pub fn partial_hash(path: &Path, sample_size: u64) -> Option<String> {
    PartialHasher::with_sample_size(sample_size).hash_file(path)
}
