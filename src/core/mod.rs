//! # Core Module
//!
//! The GUI-agnostic library engine.
//!
//! ## Modules
//! - `title` - Normalizes release names into comparable titles and years
//! - `quality` - Scores a copy from its name and probe data
//! - `probe` - MediaInfo / ffprobe adapters
//! - `hasher` - Partial content fingerprints
//! - `metadata` - `.nfo` sidecar reading
//! - `matcher` - Five-tier duplicate cascade, ranking and resolution plans
//! - `scanner` - Discovers movie folders and loose videos
//! - `cache` - Persists partial hashes to avoid re-reading files
//! - `pipeline` - Orchestrates the full workflow
//! - `reporter` - Explains groups and exports reports
//! - `stats` - Codec breakdown and transcode queue
//! - `health` - Read-only audit for empty folders, stray files and naming

pub mod cache;
pub mod hasher;
pub mod health;
pub mod matcher;
pub mod metadata;
pub mod pipeline;
pub mod probe;
pub mod quality;
pub mod reporter;
pub mod scanner;
pub mod stats;
pub mod title;

// Re-export commonly used types
pub use matcher::{find_duplicates, CandidateEntry, Confidence, DuplicateGroup, MatchTier};
pub use quality::{QualityProfile, QualityScorer};
pub use reporter::{GroupReport, LibraryReport};
pub use scanner::MediaItem;
pub use title::{normalize, NormalizedTitle};
