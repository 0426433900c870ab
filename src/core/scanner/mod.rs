//! # Scanner Module
//!
//! Discovers library items under one or more roots.
//!
//! ## Layout
//! Each root is a library: every top-level folder is one movie, represented
//! by its largest video file. Video files lying directly in the root are items
//! of their own. `_Trailers` and hidden folders are skipped.
//!
//! ## Example
//! ```rust,ignore
//! use media_library_cleaner::core::scanner::{LibraryScanner, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let result = scanner.scan(&["/media/Movies".into()])?;
//! ```

mod filter;
mod walker;

pub use filter::VideoFilter;
pub use walker::{ScanConfig, WalkDirScanner, TRAILERS_FOLDER};

use crate::error::ScanError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// One movie in the library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    /// Movie folder, or the video file itself for loose files
    pub path: PathBuf,
    /// Folder or file name
    pub display_name: String,
    /// The video that represents the item
    pub video_file: PathBuf,
    /// Size of `video_file` in bytes
    pub size: u64,
    pub modified: SystemTime,
}

impl MediaItem {
    /// Whether the item is a video file directly in a library root
    pub fn is_loose_file(&self) -> bool {
        self.path == self.video_file
    }

    /// Video file name, which usually carries richer release tags than the folder
    pub fn video_file_name(&self) -> &str {
        self.video_file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// Result of a scan operation
#[derive(Debug)]
pub struct ScanResult {
    /// Discovered items in root order, then name order
    pub items: Vec<MediaItem>,
    /// Non-fatal errors
    pub errors: Vec<ScanError>,
}

/// Trait for library scanners
pub trait LibraryScanner: Send + Sync {
    fn scan(&self, paths: &[PathBuf]) -> Result<ScanResult, ScanError>;

    /// Scan with progress reporting via events
    fn scan_with_events(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
    ) -> Result<ScanResult, ScanError>;
}
