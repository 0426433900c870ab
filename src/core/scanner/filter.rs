//! File filtering logic for the scanner.

use crate::core::title::VIDEO_EXTENSIONS;
use std::collections::HashSet;
use std::path::Path;

/// Name fragments of extras that never represent the movie itself
const EXTRA_MARKERS: &[&str] = &["sample", "trailer", "teaser", "proof"];

/// Decides which files count as the video of a library item
pub struct VideoFilter {
    extensions: HashSet<String>,
    include_hidden: bool,
}

impl VideoFilter {
    /// Filter accepting the known video extensions
    pub fn new() -> Self {
        Self {
            extensions: VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Override the list of extensions to accept
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn is_hidden(name: &str) -> bool {
        name.starts_with('.')
    }

    /// Samples, trailers and similar extras
    pub fn is_extra(path: &Path) -> bool {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return false;
        };
        let stem = stem.to_lowercase();
        stem.split(|c: char| !c.is_ascii_alphanumeric())
            .any(|word| EXTRA_MARKERS.contains(&word))
    }

    /// Whether a file is a candidate movie video
    pub fn should_include(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if !self.include_hidden && Self::is_hidden(name) {
            return false;
        }
        if Self::is_extra(path) {
            return false;
        }
        self.has_video_extension(path)
    }

    /// Extension check alone, extras and hidden files included
    pub fn has_video_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }
}

impl Default for VideoFilter {
    fn default() -> Self {
        Self::new()
    }
}
