//! # Stats Module
//!
//! Library-wide codec analysis: how files break down by resolution, video
//! codec and container, and which files would benefit from a remux or a
//! transcode for player compatibility.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::core::probe::MediaProbe;
use crate::core::quality::{QualityProfile, QualityScorer};
use crate::core::scanner::{ScanConfig, VideoFilter};
use crate::error::ScanError;

const LEGACY_CODEC: &str = "XviD/MPEG-4";
const AVC_CODEC: &str = "AVC/H.264";

/// One row of a breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountEntry {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

/// What a compatibility fix would involve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscodeMode {
    /// Rewrap without re-encoding
    Remux,
    Transcode,
}

impl std::fmt::Display for TranscodeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscodeMode::Remux => write!(f, "remux"),
            TranscodeMode::Transcode => write!(f, "transcode"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeCandidate {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub resolution: String,
    pub codec: String,
    pub container: String,
    pub mode: TranscodeMode,
    pub reason: String,
}

/// Codec analysis over a set of video files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryStats {
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub by_resolution: Vec<CountEntry>,
    pub by_codec: Vec<CountEntry>,
    pub by_container: Vec<CountEntry>,
    pub transcode_candidates: Vec<TranscodeCandidate>,
}

/// Upper-case extension, `UNKNOWN` when there is none
pub fn container_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_uppercase)
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

/// Whether a file needs work to play everywhere, and what kind
pub fn transcode_need(codec: &str, container: &str) -> Option<(TranscodeMode, &'static str)> {
    if codec == LEGACY_CODEC {
        Some((TranscodeMode::Transcode, "Legacy codec, transcode to H.264"))
    } else if container == "AVI" {
        if codec == AVC_CODEC {
            Some((TranscodeMode::Remux, "H.264 in AVI, remux to MKV"))
        } else {
            Some((TranscodeMode::Transcode, "AVI with legacy codec, transcode to H.264"))
        }
    } else {
        None
    }
}

fn breakdown(counts: HashMap<String, usize>, total: usize) -> Vec<CountEntry> {
    let mut entries: Vec<CountEntry> = counts
        .into_iter()
        .map(|(label, count)| CountEntry {
            percent: if total == 0 {
                0.0
            } else {
                (count as f64 / total as f64 * 1000.0).round() / 10.0
            },
            label,
            count,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    entries
}

impl LibraryStats {
    /// Aggregate scored files. Candidates keep the input order.
    pub fn collect<'a, I>(files: I) -> Self
    where
        I: IntoIterator<Item = (&'a Path, &'a QualityProfile)>,
    {
        let mut stats = LibraryStats::default();
        let mut resolutions = HashMap::new();
        let mut codecs = HashMap::new();
        let mut containers = HashMap::new();

        for (path, quality) in files {
            let container = container_of(path);
            let resolution = quality.resolution.to_string();

            stats.total_files += 1;
            stats.total_size_bytes += quality.file_size_bytes;
            *resolutions.entry(resolution.clone()).or_insert(0) += 1;
            *codecs.entry(quality.video_codec.clone()).or_insert(0) += 1;
            *containers.entry(container.clone()).or_insert(0) += 1;

            if let Some((mode, reason)) = transcode_need(&quality.video_codec, &container) {
                stats.transcode_candidates.push(TranscodeCandidate {
                    path: path.to_path_buf(),
                    size_bytes: quality.file_size_bytes,
                    resolution,
                    codec: quality.video_codec.clone(),
                    container,
                    mode,
                    reason: reason.to_string(),
                });
            }
        }

        stats.by_resolution = breakdown(resolutions, stats.total_files);
        stats.by_codec = breakdown(codecs, stats.total_files);
        stats.by_container = breakdown(containers, stats.total_files);
        stats
    }
}

/// Every video file under the roots, recursively, in name order
pub fn find_video_files(
    roots: &[PathBuf],
    config: &ScanConfig,
) -> (Vec<(PathBuf, u64)>, Vec<ScanError>) {
    let filter = VideoFilter::new().with_hidden(config.include_hidden);
    let mut files = Vec::new();
    let mut errors = Vec::new();

    for root in roots {
        if !root.is_dir() {
            errors.push(ScanError::DirectoryNotFound { path: root.clone() });
            continue;
        }
        let walker = WalkDir::new(root)
            .follow_links(config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || config.include_hidden
                    || !VideoFilter::is_hidden(&e.file_name().to_string_lossy())
            });

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() && filter.should_include(entry.path()) => {
                    let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                    files.push((entry.into_path(), size));
                }
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                    errors.push(ScanError::ReadDirectory {
                        path,
                        source: std::io::Error::other(e.to_string()),
                    });
                }
            }
        }
    }

    (files, errors)
}

/// Find, probe and score every video under the roots, then aggregate
pub fn analyze_codecs(
    roots: &[PathBuf],
    config: &ScanConfig,
    probe: Option<&dyn MediaProbe>,
) -> (LibraryStats, Vec<ScanError>) {
    let (files, errors) = find_video_files(roots, config);
    let scorer = QualityScorer::new();

    let scored: Vec<(PathBuf, QualityProfile)> = files
        .into_par_iter()
        .map(|(path, size)| {
            let probed = probe.and_then(|p| p.probe(&path));
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let quality = scorer.score(&name, probed.as_ref(), Some(size), None);
            (path, quality)
        })
        .collect();

    let stats = LibraryStats::collect(scored.iter().map(|(p, q)| (p.as_path(), q)));
    (stats, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn profile(name: &str, size: u64) -> QualityProfile {
        QualityScorer::new().score(name, None, Some(size), None)
    }

    #[test]
    fn legacy_codecs_and_avi_need_work() {
        assert_eq!(
            transcode_need(LEGACY_CODEC, "MKV").map(|(m, _)| m),
            Some(TranscodeMode::Transcode)
        );
        assert_eq!(
            transcode_need(AVC_CODEC, "AVI").map(|(m, _)| m),
            Some(TranscodeMode::Remux)
        );
        assert_eq!(
            transcode_need("Unknown", "AVI").map(|(m, _)| m),
            Some(TranscodeMode::Transcode)
        );
        assert!(transcode_need("HEVC/x265", "MKV").is_none());
    }

    #[test]
    fn breakdowns_sort_by_count_then_label() {
        let files = [
            (PathBuf::from("/a/one.1080p.x265.mkv"), profile("one.1080p.x265.mkv", 10)),
            (PathBuf::from("/a/two.1080p.x264.mkv"), profile("two.1080p.x264.mkv", 20)),
            (PathBuf::from("/a/three.720p.xvid.avi"), profile("three.720p.xvid.avi", 30)),
        ];
        let stats = LibraryStats::collect(files.iter().map(|(p, q)| (p.as_path(), q)));

        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.total_size_bytes, 60);
        assert_eq!(stats.by_resolution[0].label, "1080p");
        assert_eq!(stats.by_resolution[0].count, 2);
        assert_eq!(stats.by_resolution[0].percent, 66.7);
        assert_eq!(stats.by_container[0].label, "MKV");
        assert_eq!(stats.by_codec.len(), 3);

        assert_eq!(stats.transcode_candidates.len(), 1);
        assert_eq!(stats.transcode_candidates[0].mode, TranscodeMode::Transcode);
        assert_eq!(stats.transcode_candidates[0].container, "AVI");
    }

    #[test]
    fn empty_input_gives_empty_stats() {
        let stats = LibraryStats::collect(std::iter::empty());
        assert_eq!(stats.total_files, 0);
        assert!(stats.by_codec.is_empty());
    }

    #[test]
    fn analyze_walks_recursively_without_probe() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("Show").join("Season 1");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("show.s01e01.720p.x264.avi"), b"abc").unwrap();
        fs::write(dir.path().join("movie.2160p.hevc.mkv"), b"abcdef").unwrap();
        fs::write(dir.path().join("readme.txt"), b"x").unwrap();

        let (stats, errors) =
            analyze_codecs(&[dir.path().to_path_buf()], &ScanConfig::default(), None);
        assert!(errors.is_empty());
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.total_size_bytes, 9);
        assert_eq!(stats.transcode_candidates.len(), 1);
        assert_eq!(stats.transcode_candidates[0].mode, TranscodeMode::Remux);
    }

    #[test]
    fn missing_root_is_reported() {
        let (files, errors) =
            find_video_files(&[PathBuf::from("/nonexistent/x")], &ScanConfig::default());
        assert!(files.is_empty());
        assert_eq!(errors.len(), 1);
    }
}
