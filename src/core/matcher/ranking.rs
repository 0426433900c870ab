//! Keep ranking within a group.
//!
//! Score dominates, a properly named folder (`Title (Year)`) breaks close
//! calls, and size in MiB breaks the rest.

use super::CandidateEntry;
use crate::core::title::has_parenthesized_year;

const SCORE_WEIGHT: i64 = 1000;
const NAMING_BONUS: i64 = 100;
const MIB: u64 = 1_048_576;

/// Higher is better
pub fn keep_rank_key(entry: &CandidateEntry) -> i64 {
    let naming = if has_parenthesized_year(entry.name()) {
        NAMING_BONUS
    } else {
        0
    };
    i64::from(entry.quality.score) * SCORE_WEIGHT + naming + (entry.file_size_bytes / MIB) as i64
}

/// Sort best first. Equal keys keep their input order.
pub fn rank_members(members: &mut [CandidateEntry]) {
    members.sort_by_key(|m| std::cmp::Reverse(keep_rank_key(m)));
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn scored(path: &str, score: i32, mb: u64) -> CandidateEntry {
        let mut e = entry(path, "movie", Some("2020"));
        e.quality.score = score;
        e.file_size_bytes = mb * MB;
        e
    }

    #[test]
    fn score_beats_size() {
        let mut members = vec![scored("/big", 60, 5000), scored("/good", 80, 1000)];
        rank_members(&mut members);
        assert_eq!(members[0].path.to_str(), Some("/good"));
    }

    #[test]
    fn naming_breaks_close_calls() {
        let mut plain = scored("/plain", 50, 40);
        plain.display_name = "Movie 2020".into();
        let mut named = scored("/named", 50, 10);
        named.display_name = "Movie (2020)".into();

        assert_eq!(keep_rank_key(&named), 50_000 + 100 + 10);
        let mut members = vec![plain, named];
        rank_members(&mut members);
        assert_eq!(members[0].path.to_str(), Some("/named"));
    }

    #[test]
    fn ties_keep_input_order() {
        let mut members = vec![scored("/first", 10, 5), scored("/second", 10, 5)];
        rank_members(&mut members);
        assert_eq!(members[0].path.to_str(), Some("/first"));
    }

    #[test]
    fn negative_scores_rank_below_zero() {
        let mut members = vec![scored("/bad", -15, 9000), scored("/plain", 0, 1)];
        rank_members(&mut members);
        assert_eq!(members[0].path.to_str(), Some("/plain"));
    }
}
