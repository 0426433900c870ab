//! Directory walking implementation using walkdir.

use super::{filter::VideoFilter, LibraryScanner, MediaItem, ScanResult};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent, ScanProgress};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Folder where trailers are collected; never a movie
pub const TRAILERS_FOLDER: &str = "_Trailers";

/// Configuration for the library scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and folders
    pub include_hidden: bool,
    /// How deep inside a movie folder to look for its video (1 = direct children)
    pub item_depth: usize,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: false,
            item_depth: 1,
            extensions: None,
        }
    }
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: VideoFilter,
}

struct VideoFile {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
}

fn walk_error(e: walkdir::Error) -> ScanError {
    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
    if e.io_error().map(|e| e.kind()) == Some(std::io::ErrorKind::PermissionDenied) {
        ScanError::PermissionDenied { path }
    } else {
        ScanError::ReadDirectory {
            path,
            source: std::io::Error::other(e.to_string()),
        }
    }
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl WalkDirScanner {
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = VideoFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions.clone());
        }

        Self { config, filter }
    }

    fn report_error(error: ScanError, events: &EventSender, errors: &mut Vec<ScanError>) {
        let path = match &error {
            ScanError::PermissionDenied { path }
            | ScanError::ReadDirectory { path, .. }
            | ScanError::DirectoryNotFound { path } => path.clone(),
            ScanError::Cancelled => PathBuf::new(),
        };
        tracing::warn!(path = %path.display(), error = %error, "scan error");
        events.scan_error(path, error.to_string());
        errors.push(error);
    }

    fn video_file(&self, path: &Path, metadata: &std::fs::Metadata) -> VideoFile {
        VideoFile {
            path: path.to_path_buf(),
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }

    /// Largest video inside a movie folder. Equal sizes keep the first by name.
    fn largest_video(
        &self,
        folder: &Path,
        events: &EventSender,
        errors: &mut Vec<ScanError>,
    ) -> Option<VideoFile> {
        let walker = WalkDir::new(folder)
            .min_depth(1)
            .max_depth(self.config.item_depth.max(1))
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        let mut best: Option<VideoFile> = None;
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    Self::report_error(walk_error(e), events, errors);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.filter.should_include(entry.path()) {
                continue;
            }
            match entry.metadata() {
                Ok(metadata) => {
                    let video = self.video_file(entry.path(), &metadata);
                    if best.as_ref().map_or(true, |b| video.size > b.size) {
                        best = Some(video);
                    }
                }
                Err(e) => Self::report_error(walk_error(e), events, errors),
            }
        }
        best
    }

    /// Scan a single library root
    fn scan_root(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<(Vec<MediaItem>, Vec<ScanError>), ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut items = Vec::new();
        let mut errors = Vec::new();
        let mut directories_scanned = 0;

        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    Self::report_error(walk_error(e), events, &mut errors);
                    continue;
                }
            };
            let path = entry.path();
            let name = name_of(path);

            if entry.file_type().is_dir() {
                if name == TRAILERS_FOLDER
                    || (!self.config.include_hidden && VideoFilter::is_hidden(&name))
                {
                    continue;
                }
                directories_scanned += 1;
                events.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                    directories_scanned,
                    items_found: items.len(),
                    current_path: path.to_path_buf(),
                })));

                match self.largest_video(path, events, &mut errors) {
                    Some(video) => items.push(MediaItem {
                        path: path.to_path_buf(),
                        display_name: name,
                        video_file: video.path,
                        size: video.size,
                        modified: video.modified,
                    }),
                    None => {
                        tracing::debug!(folder = %path.display(), "no video in folder");
                        continue;
                    }
                }
            } else if entry.file_type().is_file() && self.filter.should_include(path) {
                match entry.metadata() {
                    Ok(metadata) => {
                        let video = self.video_file(path, &metadata);
                        items.push(MediaItem {
                            path: video.path.clone(),
                            display_name: name,
                            video_file: video.path,
                            size: video.size,
                            modified: video.modified,
                        });
                    }
                    Err(e) => {
                        Self::report_error(walk_error(e), events, &mut errors);
                        continue;
                    }
                }
            } else {
                continue;
            }

            if let Some(item) = items.last() {
                events.send(Event::Scan(ScanEvent::ItemFound {
                    path: item.path.clone(),
                }));
            }
        }

        Ok((items, errors))
    }
}

impl LibraryScanner for WalkDirScanner {
    fn scan(&self, paths: &[PathBuf]) -> Result<ScanResult, ScanError> {
        self.scan_with_events(paths, &crate::events::null_sender())
    }

    fn scan_with_events(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        events.send(Event::Scan(ScanEvent::Started {
            paths: paths.to_vec(),
        }));

        let mut all_items = Vec::new();
        let mut all_errors = Vec::new();

        for path in paths {
            match self.scan_root(path, events) {
                Ok((items, errors)) => {
                    all_items.extend(items);
                    all_errors.extend(errors);
                }
                Err(e) => Self::report_error(e, events, &mut all_errors),
            }
        }

        tracing::info!(items = all_items.len(), errors = all_errors.len(), "scan complete");
        events.send(Event::Scan(ScanEvent::Completed {
            total_items: all_items.len(),
        }));

        Ok(ScanResult {
            items: all_items,
            errors: all_errors,
        })
    }
}
