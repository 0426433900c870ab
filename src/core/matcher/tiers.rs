//! Tier keys and claim bookkeeping.

use std::collections::HashMap;

use super::{CandidateEntry, MatchTier};
use crate::core::title::is_valid_year;

/// Relative distance from the group mean at which a title-only member is dropped
pub const SIZE_TOLERANCE: f64 = 0.20;

/// Tracks which entries a stronger tier already grouped
#[derive(Debug, Clone)]
pub struct ClaimTracker {
    claimed: Vec<bool>,
}

impl ClaimTracker {
    pub fn new(len: usize) -> Self {
        Self {
            claimed: vec![false; len],
        }
    }

    pub fn is_claimed(&self, index: usize) -> bool {
        self.claimed.get(index).copied().unwrap_or(true)
    }

    pub fn claim(&mut self, index: usize) {
        if let Some(slot) = self.claimed.get_mut(index) {
            *slot = true;
        }
    }

    pub fn claimed_count(&self) -> usize {
        self.claimed.iter().filter(|c| **c).count()
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

fn valid_year(entry: &CandidateEntry) -> Option<&str> {
    entry.year.as_deref().filter(|y| is_valid_year(y))
}

fn tier_key(tier: MatchTier, entry: &CandidateEntry) -> Option<String> {
    match tier {
        MatchTier::ExternalIdPrimary => non_empty(&entry.external_id_primary),
        MatchTier::ExternalIdSecondary => non_empty(&entry.external_id_secondary),
        MatchTier::ContentHash => non_empty(&entry.file_hash),
        MatchTier::TitleYear => {
            let year = valid_year(entry)?;
            if entry.normalized_title.is_empty() {
                return None;
            }
            Some(format!("{}|{year}", entry.normalized_title))
        }
        MatchTier::TitleOnly => {
            if valid_year(entry).is_some() || entry.normalized_title.is_empty() {
                return None;
            }
            Some(entry.normalized_title.clone())
        }
    }
}

/// Bucket unclaimed entries by key, keeping first-appearance order
fn bucket(tier: MatchTier, entries: &[CandidateEntry], claims: &ClaimTracker) -> Vec<Vec<usize>> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<Vec<usize>> = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        if claims.is_claimed(index) {
            continue;
        }
        let Some(key) = tier_key(tier, entry) else {
            continue;
        };
        match positions.get(&key) {
            Some(&pos) => buckets[pos].push(index),
            None => {
                positions.insert(key, buckets.len());
                buckets.push(vec![index]);
            }
        }
    }

    buckets
}

/// Drop the member furthest from the mean size until every member is strictly
/// within [`SIZE_TOLERANCE`]. Ties drop the later member. Returns an empty list when
/// fewer than two members survive.
pub fn size_filter(indices: &[usize], entries: &[CandidateEntry]) -> Vec<usize> {
    let mut survivors = indices.to_vec();

    while survivors.len() >= 2 {
        let sizes: Vec<f64> = survivors
            .iter()
            .map(|&i| entries[i].file_size_bytes as f64)
            .collect();
        let mean = sizes.iter().sum::<f64>() / sizes.len() as f64;
        if mean == 0.0 {
            return survivors;
        }

        let mut worst = 0;
        let mut worst_deviation = -1.0;
        for (pos, size) in sizes.iter().enumerate() {
            let deviation = (size - mean).abs() / mean;
            if deviation >= worst_deviation {
                worst = pos;
                worst_deviation = deviation;
            }
        }

        if worst_deviation < SIZE_TOLERANCE {
            return survivors;
        }
        survivors.remove(worst);
    }

    Vec::new()
}

/// Find the groups for one tier and claim their members
pub(super) fn run_tier(
    tier: MatchTier,
    entries: &[CandidateEntry],
    claims: &mut ClaimTracker,
) -> Vec<Vec<usize>> {
    let groups: Vec<Vec<usize>> = bucket(tier, entries, claims)
        .into_iter()
        .map(|members| {
            if tier == MatchTier::TitleOnly && members.len() >= 2 {
                size_filter(&members, entries)
            } else {
                members
            }
        })
        .filter(|members| members.len() >= 2)
        .collect();

    for &index in groups.iter().flatten() {
        claims.claim(index);
    }
    groups
}
