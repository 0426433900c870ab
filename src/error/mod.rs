//! # Error Module
//!
//! Error types for the media library cleaner.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Degrade quietly** - a missing probe tool, an unreadable sidecar or a
//!   failed hash is a fallback, not an error
//! - **Include context** - paths, tool names, what went wrong
//! - **Recovery hints** - suggest how to fix when possible

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum MediaLibraryError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Report generation error: {0}")]
    Report(#[from] ReportError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while walking a library
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Library directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scan was cancelled")]
    Cancelled,
}

/// Errors raised by a technical probe tool (MediaInfo, ffprobe).
///
/// These never reach the scorer's caller; the probe adapters log them and
/// report "no probe result" so scoring falls back to the file name.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("{tool} is not installed or not on PATH")]
    ToolMissing { tool: String },

    #[error("{tool} failed on {path}: {reason}")]
    Failed {
        tool: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Could not parse {tool} output for {path}: {reason}")]
    InvalidOutput {
        tool: String,
        path: PathBuf,
        reason: String,
    },
}

/// Errors reading a sidecar metadata file
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to read sidecar {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed sidecar {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Errors that occur with the hash cache
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to open cache database at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("Cache corruption detected at {path}. Delete this file and try again.")]
    Corrupted { path: PathBuf },
}

/// Errors that occur during report generation
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialization(String),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, MediaLibraryError>;
