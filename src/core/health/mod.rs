//! # Health Module
//!
//! Read-only library audit. Walks every root and reports the clutter a
//! duplicate scan does not deal with:
//! - folders with nothing in them
//! - movie folders without a video file
//! - zero-byte files
//! - suspiciously small videos that are not extras
//! - folder names that break the `Title (Year)` convention
//!
//! Nothing is moved or deleted.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

use crate::core::scanner::{ScanConfig, VideoFilter, TRAILERS_FOLDER};
use crate::error::ScanError;

/// Videos below this size are flagged unless they are extras
pub const SMALL_VIDEO_BYTES: u64 = 50 * 1024 * 1024;

static DOTTED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\..*\.").expect("valid regex"));
static BRACKETED_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\d{4}\)").expect("valid regex"));
static ANY_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(19|20)\d{2}").expect("valid regex"));

/// Ways a top-level folder name can deviate from `Title (Year)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamingIssue {
    /// Release-style dots instead of spaces
    DottedName,
    MissingYear,
}

impl std::fmt::Display for NamingIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NamingIssue::DottedName => write!(f, "Contains dots (should be spaces)"),
            NamingIssue::MissingYear => write!(f, "Missing year"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmallVideo {
    pub path: PathBuf,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingProblem {
    pub path: PathBuf,
    pub issue: NamingIssue,
}

/// Which checks run
#[derive(Debug, Clone, Copy)]
pub struct HealthOptions {
    /// Flag top-level folders without a year. Off for series libraries.
    pub expect_year: bool,
}

impl Default for HealthOptions {
    fn default() -> Self {
        Self { expect_year: true }
    }
}

/// Findings of one audit, each list in walk order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthReport {
    pub empty_folders: Vec<PathBuf>,
    pub no_video_folders: Vec<PathBuf>,
    pub zero_byte_files: Vec<PathBuf>,
    pub small_videos: Vec<SmallVideo>,
    pub naming_issues: Vec<NamingProblem>,
}

impl HealthReport {
    pub fn total_issues(&self) -> usize {
        self.empty_folders.len()
            + self.no_video_folders.len()
            + self.zero_byte_files.len()
            + self.small_videos.len()
            + self.naming_issues.len()
    }

    pub fn is_healthy(&self) -> bool {
        self.total_issues() == 0
    }
}

/// Naming problems of a single top-level folder name
pub fn naming_issues(name: &str, expect_year: bool) -> Vec<NamingIssue> {
    let mut issues = Vec::new();
    if DOTTED_NAME.is_match(name) && !BRACKETED_YEAR.is_match(name) {
        issues.push(NamingIssue::DottedName);
    }
    if expect_year && !ANY_YEAR.is_match(name) {
        issues.push(NamingIssue::MissingYear);
    }
    issues
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path).is_ok_and(|mut entries| entries.next().is_none())
}

fn has_direct_video(folder: &Path, filter: &VideoFilter) -> bool {
    let Ok(entries) = fs::read_dir(folder) else {
        return false;
    };
    entries
        .flatten()
        .any(|e| e.file_type().is_ok_and(|t| t.is_file()) && filter.has_video_extension(&e.path()))
}

/// Audit every root. Missing roots and unreadable entries are returned as
/// errors and the rest of the walk goes on.
pub fn health_check(
    roots: &[PathBuf],
    config: &ScanConfig,
    options: HealthOptions,
) -> (HealthReport, Vec<ScanError>) {
    let filter = match &config.extensions {
        Some(exts) => VideoFilter::new().with_extensions(exts.clone()),
        None => VideoFilter::new(),
    }
    .with_hidden(config.include_hidden);

    let mut report = HealthReport::default();
    let mut errors = Vec::new();

    for root in roots {
        if !root.is_dir() {
            errors.push(ScanError::DirectoryNotFound { path: root.clone() });
            continue;
        }
        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                config.include_hidden || !VideoFilter::is_hidden(&e.file_name().to_string_lossy())
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                    errors.push(ScanError::ReadDirectory {
                        path,
                        source: std::io::Error::other(e.to_string()),
                    });
                    continue;
                }
            };
            let path = entry.path();

            if entry.file_type().is_dir() {
                if is_empty_dir(path) {
                    report.empty_folders.push(path.to_path_buf());
                }
                let name = entry.file_name().to_string_lossy();
                if entry.depth() == 1 && name != TRAILERS_FOLDER {
                    if !has_direct_video(path, &filter) {
                        report.no_video_folders.push(path.to_path_buf());
                    }
                    for issue in naming_issues(&name, options.expect_year) {
                        report.naming_issues.push(NamingProblem {
                            path: path.to_path_buf(),
                            issue,
                        });
                    }
                }
                continue;
            }

            if !entry.file_type().is_file() {
                continue;
            }
            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "no metadata");
                    continue;
                }
            };
            if size == 0 {
                report.zero_byte_files.push(path.to_path_buf());
            } else if size < SMALL_VIDEO_BYTES && filter.should_include(path) {
                report.small_videos.push(SmallVideo {
                    path: path.to_path_buf(),
                    size_bytes: size,
                });
            }
        }
    }

    tracing::info!(
        roots = roots.len(),
        issues = report.total_issues(),
        errors = errors.len(),
        "health check complete"
    );
    (report, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn audit(dir: &TempDir) -> HealthReport {
        let (report, errors) = health_check(
            &[dir.path().to_path_buf()],
            &ScanConfig::default(),
            HealthOptions::default(),
        );
        assert!(errors.is_empty());
        report
    }

    #[test]
    fn tidy_library_is_healthy() {
        let dir = TempDir::new().unwrap();
        let movie = dir.path().join("Heat (1995)");
        fs::create_dir(&movie).unwrap();
        let video = fs::File::create(movie.join("Heat.mkv")).unwrap();
        video.set_len(SMALL_VIDEO_BYTES).unwrap();

        assert!(audit(&dir).is_healthy());
    }

    #[test]
    fn videos_under_the_threshold_are_small() {
        let dir = TempDir::new().unwrap();
        let movie = dir.path().join("Heat (1995)");
        fs::create_dir(&movie).unwrap();
        let video = fs::File::create(movie.join("Heat.mkv")).unwrap();
        video.set_len(SMALL_VIDEO_BYTES - 1).unwrap();

        let report = audit(&dir);

        assert_eq!(report.total_issues(), 1);
        assert_eq!(report.small_videos[0].size_bytes, SMALL_VIDEO_BYTES - 1);
    }

    #[test]
    fn empty_folder_also_lacks_video() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("Ronin (1998)")).unwrap();
        fs::create_dir_all(dir.path().join("Heat (1995)").join("Subs")).unwrap();

        let report = audit(&dir);

        assert_eq!(
            report.empty_folders,
            vec![
                dir.path().join("Heat (1995)").join("Subs"),
                dir.path().join("Ronin (1998)"),
            ]
        );
        assert_eq!(report.no_video_folders.len(), 2);
    }

    #[test]
    fn video_in_a_subfolder_does_not_count_for_the_movie_folder() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("Alien (1979)").join("Disc 1");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("alien.mkv"), b"x").unwrap();

        let report = audit(&dir);

        assert_eq!(report.no_video_folders, vec![dir.path().join("Alien (1979)")]);
    }

    #[test]
    fn zero_byte_files_are_not_also_small_videos() {
        let dir = TempDir::new().unwrap();
        let movie = dir.path().join("Heat (1995)");
        fs::create_dir(&movie).unwrap();
        fs::write(movie.join("Heat.mkv"), b"").unwrap();
        fs::write(movie.join("poster.jpg"), b"").unwrap();

        let report = audit(&dir);

        assert_eq!(report.zero_byte_files.len(), 2);
        assert!(report.small_videos.is_empty());
    }

    #[test]
    fn extras_and_non_videos_are_not_small_videos() {
        let dir = TempDir::new().unwrap();
        let movie = dir.path().join("Heat (1995)");
        fs::create_dir(&movie).unwrap();
        fs::write(movie.join("heat-sample.mkv"), b"abc").unwrap();
        fs::write(movie.join("Heat Teaser.mp4"), b"abc").unwrap();
        fs::write(movie.join("movie.nfo"), b"abc").unwrap();

        let report = audit(&dir);

        assert!(report.small_videos.is_empty());
        // a sample still counts as a video being present
        assert!(report.no_video_folders.is_empty());
    }

    #[test]
    fn trailers_folder_skips_folder_checks() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(TRAILERS_FOLDER)).unwrap();

        let report = audit(&dir);

        assert_eq!(report.empty_folders, vec![dir.path().join(TRAILERS_FOLDER)]);
        assert!(report.no_video_folders.is_empty());
        assert!(report.naming_issues.is_empty());
    }

    #[test]
    fn dotted_and_yearless_names_are_flagged() {
        assert_eq!(
            naming_issues("Heat.1995.1080p.BluRay", true),
            vec![NamingIssue::DottedName]
        );
        assert!(naming_issues("Mr. Smith (2005) v1.2", true).is_empty());
        assert_eq!(naming_issues("Solaris", true), vec![NamingIssue::MissingYear]);
        assert!(naming_issues("Solaris", false).is_empty());
        assert_eq!(
            naming_issues("Some.Show.S01", true),
            vec![NamingIssue::DottedName, NamingIssue::MissingYear]
        );
    }

    #[test]
    fn hidden_entries_are_skipped_by_default() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".cache")).unwrap();

        assert!(audit(&dir).is_healthy());

        let config = ScanConfig {
            include_hidden: true,
            ..ScanConfig::default()
        };
        let (report, _) =
            health_check(&[dir.path().to_path_buf()], &config, HealthOptions::default());
        assert_eq!(report.empty_folders.len(), 1);
    }

    #[test]
    fn missing_root_is_an_error_not_an_issue() {
        let (report, errors) = health_check(
            &[PathBuf::from("/nonexistent/library")],
            &ScanConfig::default(),
            HealthOptions::default(),
        );
        assert!(report.is_healthy());
        assert_eq!(errors.len(), 1);
    }
}
