//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::matcher::MatchTier;

/// All events emitted by the library pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Scanning phase events
    Scan(ScanEvent),
    /// Per-item analysis (probe, score, hash, sidecar) events
    Analyze(AnalyzeEvent),
    /// Duplicate matching events
    Match(MatchEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { paths: Vec<PathBuf> },
    /// Progress update during scanning
    Progress(ScanProgress),
    /// A library item (movie folder or loose video) was found
    ItemFound { path: PathBuf },
    /// An error occurred but scanning continues
    Error { path: PathBuf, message: String },
    /// Scanning completed
    Completed { total_items: usize },
}

/// Progress information during scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Number of directories scanned so far
    pub directories_scanned: usize,
    /// Number of items found so far
    pub items_found: usize,
    /// Current directory being scanned
    pub current_path: PathBuf,
}

/// Events during the analysis phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AnalyzeEvent {
    /// Analysis has started
    Started { total_items: usize },
    /// Progress update during analysis
    Progress(AnalyzeProgress),
    /// The partial hash was loaded from cache
    CacheHit { path: PathBuf },
    /// The probe tool gave no answer and the file name was used instead
    ProbeFallback { path: PathBuf },
    /// Analysis completed
    Completed {
        total_analyzed: usize,
        cache_hits: usize,
        probed: usize,
    },
}

/// Progress information during analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeProgress {
    /// Number of items analyzed so far
    pub completed: usize,
    /// Total number of items to analyze
    pub total: usize,
    /// Item currently being analyzed
    pub current_path: PathBuf,
}

/// Events during duplicate matching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatchEvent {
    /// Matching has started
    Started { total_entries: usize },
    /// A tier finished
    TierCompleted { tier: MatchTier, groups_found: usize },
    /// A duplicate group was found
    DuplicateFound { group_id: String, member_count: usize },
    /// Matching completed
    Completed {
        total_groups: usize,
        total_duplicates: usize,
    },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
    /// Pipeline was cancelled
    Cancelled,
    /// Pipeline encountered a fatal error
    Error { message: String },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Analyzing,
    Matching,
    Reporting,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Total library items scanned
    pub total_items: usize,
    /// Number of duplicate groups found
    pub duplicate_groups: usize,
    /// Total number of redundant copies (excluding the kept ones)
    pub duplicate_count: usize,
    /// Potential space savings in bytes
    pub potential_savings_bytes: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Analyzing => write!(f, "Analyzing"),
            PipelinePhase::Matching => write!(f, "Matching"),
            PipelinePhase::Reporting => write!(f, "Reporting"),
        }
    }
}
