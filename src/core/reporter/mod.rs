//! # Reporter Module
//!
//! Explains each duplicate group: what matched, what every copy scored and
//! why one copy is kept.
//!
//! Nothing is removed without a reason a person can read, so each report
//! carries the score details and concerns of every member next to the plan.

mod export;

pub use export::{export_csv, export_inventory_csv, export_json, write_report, ExportFormat};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::matcher::{
    keep_rank_key, CandidateEntry, Confidence, DuplicateGroup, ResolutionPlan,
};
use crate::core::pipeline::PipelineResult;
use crate::core::title::has_parenthesized_year;

/// Complete report for a duplicate group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupReport {
    pub group_id: String,
    /// One-line summary for quick scanning
    pub summary: String,
    pub confidence: Confidence,
    pub match_types: Vec<String>,
    /// Members in keep order
    pub members: Vec<MemberInfo>,
    pub keep: PathBuf,
    pub keep_reason: KeepReason,
    pub needs_review: bool,
    pub reclaimable_bytes: u64,
    /// Human-readable planned actions
    pub actions: Vec<String>,
}

/// What the report shows about one copy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberInfo {
    pub path: PathBuf,
    pub display_name: String,
    pub score: i32,
    pub resolution: String,
    pub video_codec: String,
    pub audio_codec: String,
    pub source: String,
    pub hdr_format: Option<String>,
    pub file_size_bytes: u64,
    pub data_source: String,
    pub details: Vec<String>,
    pub concerns: Vec<String>,
}

impl From<&CandidateEntry> for MemberInfo {
    fn from(entry: &CandidateEntry) -> Self {
        let q = &entry.quality;
        Self {
            path: entry.path.clone(),
            display_name: entry.name().to_string(),
            score: q.score,
            resolution: q.resolution.to_string(),
            video_codec: q.video_codec.clone(),
            audio_codec: q.audio_codec.clone(),
            source: q.source.to_string(),
            hdr_format: q.hdr_format.map(|h| h.to_string()),
            file_size_bytes: entry.file_size_bytes,
            data_source: q.data_source.to_string(),
            details: q.details.clone(),
            concerns: q.concerns.clone(),
        }
    }
}

/// Why the first member won
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeepReason {
    HigherScore,
    /// Same score, but the folder follows `Title (Year)` naming
    BetterNaming,
    LargerFile,
    /// Nothing separated the copies; the first one found is kept
    FirstFound,
}

impl std::fmt::Display for KeepReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeepReason::HigherScore => write!(f, "Highest quality score"),
            KeepReason::BetterNaming => write!(f, "Same score, properly named folder"),
            KeepReason::LargerFile => write!(f, "Same score, larger file"),
            KeepReason::FirstFound => write!(f, "Indistinguishable, first found"),
        }
    }
}

/// Explain why `keep` ranks above `runner_up`
pub fn keep_reason(keep: &CandidateEntry, runner_up: Option<&CandidateEntry>) -> KeepReason {
    let Some(other) = runner_up else {
        return KeepReason::FirstFound;
    };
    if keep.quality.score > other.quality.score {
        KeepReason::HigherScore
    } else if has_parenthesized_year(keep.name()) && !has_parenthesized_year(other.name()) {
        KeepReason::BetterNaming
    } else if keep_rank_key(keep) > keep_rank_key(other) {
        KeepReason::LargerFile
    } else {
        KeepReason::FirstFound
    }
}

impl GroupReport {
    pub fn new(group: &DuplicateGroup, plan: &ResolutionPlan) -> Self {
        let keep = group.keep();
        let title = keep
            .map(|k| match &k.year {
                Some(year) => format!("{} ({year})", k.normalized_title),
                None => k.normalized_title.clone(),
            })
            .unwrap_or_default();
        let match_types: Vec<String> = group.match_types.iter().map(|t| t.to_string()).collect();

        Self {
            group_id: group.id.to_string(),
            summary: format!(
                "{} copies of \"{title}\" matched by {}",
                group.members.len(),
                match_types.join(", ")
            ),
            confidence: group.confidence,
            match_types,
            members: group.members.iter().map(MemberInfo::from).collect(),
            keep: plan.keep.clone(),
            keep_reason: keep
                .map(|k| keep_reason(k, group.members.get(1)))
                .unwrap_or(KeepReason::FirstFound),
            needs_review: plan.needs_review,
            reclaimable_bytes: plan.reclaimable_bytes,
            actions: plan.actions.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Everything a scan found, ready for export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryReport {
    pub generated_at: DateTime<Utc>,
    pub total_items: usize,
    pub duplicate_count: usize,
    pub potential_savings_bytes: u64,
    pub groups: Vec<GroupReport>,
    pub errors: Vec<String>,
}

impl LibraryReport {
    pub fn from_result(result: &PipelineResult) -> Self {
        let groups = result
            .groups
            .iter()
            .zip(&result.plans)
            .map(|(group, plan)| GroupReport::new(group, plan))
            .collect();

        Self {
            generated_at: Utc::now(),
            total_items: result.total_items,
            duplicate_count: result.duplicate_count(),
            potential_savings_bytes: result.potential_savings_bytes(),
            groups,
            errors: result.errors.clone(),
        }
    }

    pub fn needs_review_count(&self) -> usize {
        self.groups.iter().filter(|g| g.needs_review).count()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::core::matcher::CandidateEntry;
    use crate::core::quality::QualityScorer;
    use crate::core::title::normalize;
    use std::path::PathBuf;

    /// Entry scored from its folder name alone
    pub fn scored_entry(folder: &str, size: u64) -> CandidateEntry {
        let quality = QualityScorer::new().score(folder, None, Some(size), None);
        CandidateEntry::from_analysis(
            PathBuf::from(format!("/movies/{folder}")),
            folder,
            quality,
            None,
            normalize(folder, false),
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::scored_entry;
    use super::*;
    use crate::core::matcher::{find_duplicates, resolve, ResolutionStrategy};

    const GB: u64 = 1 << 30;

    fn report_for(entries: &[CandidateEntry]) -> GroupReport {
        let groups = find_duplicates(entries);
        let plan = resolve(&groups[0], &ResolutionStrategy::Delete).unwrap();
        GroupReport::new(&groups[0], &plan)
    }

    #[test]
    fn higher_score_is_explained() {
        let report = report_for(&[
            scored_entry("Movie Name (2020) 720p WEBRip", 2 * GB),
            scored_entry("Movie.Name.2020.1080p.BluRay.x265", 6 * GB),
        ]);
        assert_eq!(report.keep_reason, KeepReason::HigherScore);
        assert_eq!(report.members.len(), 2);
        assert_eq!(report.members[0].resolution, "1080p");
        assert_eq!(report.reclaimable_bytes, 2 * GB);
        assert!(report.summary.starts_with("2 copies of \"movie name (2020)\""));
        assert_eq!(report.match_types, vec!["Title + year".to_string()]);
    }

    #[test]
    fn naming_is_explained() {
        let report = report_for(&[
            scored_entry("Movie Name 2020", GB),
            scored_entry("Movie Name (2020)", GB),
        ]);
        assert_eq!(report.keep_reason, KeepReason::BetterNaming);
        assert_eq!(report.keep, PathBuf::from("/movies/Movie Name (2020)"));
    }

    #[test]
    fn size_and_ties_are_explained() {
        let big = scored_entry("Movie Name 2020", 3 * GB);
        let small = scored_entry("Movie.Name.2020", GB);
        assert_eq!(keep_reason(&big, Some(&small)), KeepReason::LargerFile);
        assert_eq!(keep_reason(&big, Some(&big)), KeepReason::FirstFound);
        assert_eq!(keep_reason(&big, None), KeepReason::FirstFound);
    }

    #[test]
    fn keep_reason_display() {
        assert!(KeepReason::HigherScore.to_string().contains("score"));
        assert!(KeepReason::LargerFile.to_string().contains("larger"));
    }
}
