//! # Matcher Module
//!
//! Groups copies of the same title with a five-tier cascade.
//!
//! ## How It Works
//! Each tier groups the entries not yet claimed by a stronger tier, keyed by
//! a different signal. Every member of every group of two or more is claimed
//! and invisible to the tiers below.
//!
//! | Tier | Key | Confidence |
//! |------|-----|------------|
//! | 1 | IMDb-style id | High |
//! | 2 | TMDB-style id | High |
//! | 3 | Partial content hash | High |
//! | 4 | Normalized title + year | Medium |
//! | 5 | Normalized title, similar size | Low |
//!
//! Members are ranked for keeping (see [`ranking`]); the first member of a
//! group is the copy to keep.

pub mod ranking;
pub mod resolution;
mod tiers;

pub use ranking::{keep_rank_key, rank_members};
pub use resolution::{resolve, PlannedAction, ResolutionPlan, ResolutionStrategy};
pub use tiers::{size_filter, ClaimTracker, SIZE_TOLERANCE};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::core::metadata::SidecarMetadata;
use crate::core::quality::QualityProfile;
use crate::core::title::{normalize, NormalizedTitle};
use crate::events::{Event, EventSender, MatchEvent};

/// One media item considered for matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEntry {
    /// Identity of the item within a scan
    pub path: PathBuf,
    /// Folder or file name shown to users
    pub display_name: String,
    pub quality: QualityProfile,
    pub file_hash: Option<String>,
    pub external_id_primary: Option<String>,
    pub external_id_secondary: Option<String>,
    pub normalized_title: String,
    pub year: Option<String>,
    pub file_size_bytes: u64,
}

impl CandidateEntry {
    /// Assemble an entry from per-item analysis.
    ///
    /// A sidecar year fills a missing name year, and a sidecar title is used
    /// only when the name normalized to nothing. The normalized title is never
    /// empty unless every name is.
    pub fn from_analysis(
        path: PathBuf,
        display_name: impl Into<String>,
        quality: QualityProfile,
        file_hash: Option<String>,
        title: NormalizedTitle,
        sidecar: Option<&SidecarMetadata>,
    ) -> Self {
        let display_name = display_name.into();
        let NormalizedTitle {
            mut normalized_title,
            mut year,
        } = title;

        if let Some(sidecar) = sidecar {
            if year.is_none() {
                year = sidecar.year.clone();
            }
            if normalized_title.is_empty() {
                if let Some(title) = &sidecar.title {
                    normalized_title = normalize(title, false).normalized_title;
                }
            }
        }

        if normalized_title.is_empty() {
            normalized_title = display_name_of(&path, &display_name).to_lowercase();
        }

        Self {
            file_size_bytes: quality.file_size_bytes,
            path,
            display_name,
            quality,
            file_hash,
            external_id_primary: sidecar.and_then(|s| s.external_id_primary.clone()),
            external_id_secondary: sidecar.and_then(|s| s.external_id_secondary.clone()),
            normalized_title,
            year,
        }
    }

    /// The display name, or the last path component when none was given
    pub fn name(&self) -> &str {
        display_name_of(&self.path, &self.display_name)
    }
}

fn display_name_of<'a>(path: &'a Path, display_name: &'a str) -> &'a str {
    if !display_name.trim().is_empty() {
        return display_name;
    }
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

/// Which signal matched a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchTier {
    ExternalIdPrimary,
    ExternalIdSecondary,
    ContentHash,
    TitleYear,
    TitleOnly,
}

impl MatchTier {
    /// All tiers in evaluation order
    pub const ALL: [MatchTier; 5] = [
        MatchTier::ExternalIdPrimary,
        MatchTier::ExternalIdSecondary,
        MatchTier::ContentHash,
        MatchTier::TitleYear,
        MatchTier::TitleOnly,
    ];

    pub fn confidence(&self) -> Confidence {
        match self {
            MatchTier::ExternalIdPrimary | MatchTier::ExternalIdSecondary | MatchTier::ContentHash => {
                Confidence::High
            }
            MatchTier::TitleYear => Confidence::Medium,
            MatchTier::TitleOnly => Confidence::Low,
        }
    }
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchTier::ExternalIdPrimary => write!(f, "IMDb ID"),
            MatchTier::ExternalIdSecondary => write!(f, "TMDB ID"),
            MatchTier::ContentHash => write!(f, "Content hash"),
            MatchTier::TitleYear => write!(f, "Title + year"),
            MatchTier::TitleOnly => write!(f, "Title only"),
        }
    }
}

/// How sure a match is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    /// Should be reviewed by a person before acting
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "High"),
            Confidence::Medium => write!(f, "Medium"),
            Confidence::Low => write!(f, "Low"),
        }
    }
}

/// Copies of the same title, best copy first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Stable identifier derived from the tier and member paths
    pub id: Uuid,
    /// Members in keep order
    pub members: Vec<CandidateEntry>,
    pub match_types: BTreeSet<MatchTier>,
    pub confidence: Confidence,
}

impl DuplicateGroup {
    /// Build a group from members matched by `tier`, ranking them for keeping
    pub fn new(tier: MatchTier, mut members: Vec<CandidateEntry>) -> Self {
        rank_members(&mut members);
        Self {
            id: group_id(tier, &members),
            members,
            match_types: BTreeSet::from([tier]),
            confidence: tier.confidence(),
        }
    }

    /// The copy to keep
    pub fn keep(&self) -> Option<&CandidateEntry> {
        self.members.first()
    }

    /// Everything except the copy to keep
    pub fn duplicates(&self) -> &[CandidateEntry] {
        self.members.get(1..).unwrap_or_default()
    }

    pub fn duplicate_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    /// Bytes freed by removing every non-kept member
    pub fn reclaimable_bytes(&self) -> u64 {
        self.duplicates().iter().map(|m| m.file_size_bytes).sum()
    }

    pub fn needs_review(&self) -> bool {
        self.confidence == Confidence::Low
    }
}

fn group_id(tier: MatchTier, members: &[CandidateEntry]) -> Uuid {
    let mut paths: Vec<String> = members
        .iter()
        .map(|m| m.path.to_string_lossy().into_owned())
        .collect();
    paths.sort();
    let name = format!("{tier:?}\n{}", paths.join("\n"));
    Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes())
}

/// Run the five-tier cascade over a complete list of entries.
///
/// Groups come out in tier order, then in order of first appearance of their
/// key in `entries`. Pure and single-threaded.
pub fn find_duplicates(entries: &[CandidateEntry]) -> Vec<DuplicateGroup> {
    run_cascade(entries, None)
}

/// [`find_duplicates`] that reports progress through `events`
pub fn find_duplicates_with_events(
    entries: &[CandidateEntry],
    events: &EventSender,
) -> Vec<DuplicateGroup> {
    run_cascade(entries, Some(events))
}

fn run_cascade(entries: &[CandidateEntry], events: Option<&EventSender>) -> Vec<DuplicateGroup> {
    let send = |event: MatchEvent| {
        if let Some(events) = events {
            events.send(Event::Match(event));
        }
    };

    send(MatchEvent::Started {
        total_entries: entries.len(),
    });

    let mut claims = ClaimTracker::new(entries.len());
    let mut groups = Vec::new();

    for tier in MatchTier::ALL {
        let found = tiers::run_tier(tier, entries, &mut claims);
        tracing::debug!(%tier, groups = found.len(), claimed = claims.claimed_count(), "tier complete");

        send(MatchEvent::TierCompleted {
            tier,
            groups_found: found.len(),
        });

        for indices in found {
            let members = indices.iter().map(|&i| entries[i].clone()).collect();
            let group = DuplicateGroup::new(tier, members);
            send(MatchEvent::DuplicateFound {
                group_id: group.id.to_string(),
                member_count: group.members.len(),
            });
            groups.push(group);
        }
    }

    let total_duplicates = groups.iter().map(DuplicateGroup::duplicate_count).sum();
    send(MatchEvent::Completed {
        total_groups: groups.len(),
        total_duplicates,
    });

    groups
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::quality::{DataSource, Resolution, Source};

    pub fn profile(score: i32, size: u64) -> QualityProfile {
        QualityProfile {
            score,
            resolution: Resolution::Unknown,
            video_codec: "Unknown".to_string(),
            audio_codec: "Unknown".to_string(),
            source: Source::Unknown,
            hdr: false,
            hdr_format: None,
            bitrate_bps: 0,
            width: 0,
            height: 0,
            audio_channels: 0,
            duration_ms: 0,
            file_size_bytes: size,
            data_source: DataSource::FilenameOnly,
            streaming_service: None,
            release_group: None,
            details: Vec::new(),
            concerns: Vec::new(),
        }
    }

    pub fn entry(path: &str, title: &str, year: Option<&str>) -> CandidateEntry {
        CandidateEntry {
            path: PathBuf::from(path),
            display_name: String::new(),
            quality: profile(0, 0),
            file_hash: None,
            external_id_primary: None,
            external_id_secondary: None,
            normalized_title: title.to_string(),
            year: year.map(str::to_string),
            file_size_bytes: 0,
        }
    }

    pub const MB: u64 = 1_048_576;
}
