//! # Title Module
//!
//! Turns a raw file or folder name into a comparable title and year.
//!
//! ## Steps
//! 1. Strip a known video extension (exact, case-insensitive). A generic
//!    "drop the last dot suffix" would eat the end of `Dr. No`.
//! 2. Find the release year and cut it off together with everything after it.
//! 3. Trim release tags (`1080p`, `BluRay`, `x264`, `-GROUP`) from the tail.
//! 4. Normalize separators and punctuation, collapse whitespace, lowercase.
//!    Steps 3 and 4 repeat until the title stops changing, so tags hidden
//!    behind punctuation (`Director's Cut`, `Movie,1080p`) go on the first
//!    pass rather than the second.
//! 5. Drop one leading article unless running in strict mode. The article
//!    stays when the next word is an article too (`The A Team`).
//!
//! Normalization never fails. The worst case is a lowercased,
//! separator-normalized copy of the input with no year.

pub mod tags;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub use tags::{separator_tolerant_pattern, trailing_tag, ReleaseTag, TagKind, RELEASE_TAGS};

/// Video container extensions recognized by the normalizer
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "mov", "wmv", "flv", "m4v", "webm", "ts", "m2ts", "mpg", "mpeg",
];

/// A title reduced to its comparable form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedTitle {
    /// Lowercase, single-spaced title
    pub normalized_title: String,
    /// Four-digit release year when one was found
    pub year: Option<String>,
}

static HYPHEN_BETWEEN_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s-)+\s").expect("valid regex"));

const ARTICLES: &[&str] = &["the", "a", "an"];

static LEADING_ARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:the|a|an)\s+(\S.*)$").expect("valid regex"));

static TRAILING_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)-([A-Za-z0-9]+)$").expect("valid regex"));

static PARENTHESIZED_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((?:19|20)\d{2}\)").expect("valid regex"));

/// Normalize a raw name into a title and optional year.
///
/// `strict` keeps a leading article (`The Thing` stays `the thing`).
pub fn normalize(raw: &str, strict: bool) -> NormalizedTitle {
    let trimmed = raw.trim();
    let without_ext = strip_video_extension(trimmed);

    let (head, year) = match find_year(without_ext) {
        Some((start, year)) => (&without_ext[..start], Some(year)),
        None => (without_ext, None),
    };

    let mut title = clean_separators(strip_release_tags(head));
    loop {
        let again = clean_separators(strip_release_tags(&title));
        if again == title {
            break;
        }
        title = again;
    }

    if !strict {
        if let Some(rest) = drop_leading_article(&title) {
            title = rest.to_string();
        }
    }

    if title.is_empty() {
        tracing::debug!(raw, "name reduced to nothing, falling back to raw text");
        title = clean_separators(trimmed);
        if title.is_empty() {
            title = trimmed.to_lowercase();
        }
    }

    NormalizedTitle {
        normalized_title: title,
        year,
    }
}

/// The title without its leading article, unless another article follows
fn drop_leading_article(title: &str) -> Option<&str> {
    let rest = LEADING_ARTICLE.captures(title)?.get(1)?.as_str();
    let next = rest.split_whitespace().next()?;
    (!ARTICLES.contains(&next)).then_some(rest)
}

/// Remove a trailing known video extension, leaving any other dot suffix alone
pub fn strip_video_extension(name: &str) -> &str {
    if let Some(dot) = name.rfind('.') {
        let ext = &name[dot + 1..];
        if VIDEO_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
        {
            return &name[..dot];
        }
    }
    name
}

/// True when `value` is exactly four ASCII digits
pub fn is_valid_year(value: &str) -> bool {
    value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit())
}

/// True when the name carries a `(YYYY)` year, the usual library folder style
pub fn has_parenthesized_year(name: &str) -> bool {
    PARENTHESIZED_YEAR.is_match(name)
}

/// The release-tag part of a name, empty when the name is all title.
///
/// With a year this is everything after it. Without one it starts at the
/// first word, past the first, that is a known release tag. Words such as
/// `Cam` in `Cam.2018.1080p.WEB-DL` are then never read as tags.
pub fn release_tail(name: &str) -> &str {
    let name = strip_video_extension(name.trim());

    if let Some((cut, year)) = find_year(name) {
        let year_end = name[cut..]
            .find(year.as_str())
            .map_or(cut, |i| cut + i + year.len());
        return &name[year_end..];
    }

    let mut word_start = None;
    let mut first_word = true;
    let ends = name.char_indices().chain(std::iter::once((name.len(), ' ')));
    for (i, c) in ends {
        if is_year_delimiter(c) {
            if let Some(start) = word_start.take() {
                if !first_word && is_whole_tag(&name[start..i]) {
                    return &name[start..];
                }
                first_word = false;
            }
        } else if word_start.is_none() {
            word_start = Some(i);
        }
    }
    ""
}

fn is_whole_tag(word: &str) -> bool {
    trailing_tag(word).is_some_and(|(_, start)| start == 0)
}

fn is_year_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '.' | '_' | '-')
}

/// Locate the release year. Returns the byte offset where the title ends and
/// the year itself.
///
/// A candidate at the very start of the name is never taken, so
/// `2001: A Space Odyssey` keeps its number. The last bracketed candidate wins,
/// otherwise the last bare one.
fn find_year(name: &str) -> Option<(usize, String)> {
    static YEAR_TOKEN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?:19|20)\d{2}").expect("valid regex"));

    let mut bracketed: Option<(usize, &str)> = None;
    let mut bare: Option<(usize, &str)> = None;

    // find_iter does not overlap, so walk every offset to catch "19992000"-style runs
    let mut offset = 0;
    while let Some(m) = YEAR_TOKEN.find_at(name, offset) {
        offset = m.start() + 1;

        let before = name[..m.start()].chars().next_back();
        let after = name[m.end()..].chars().next();

        let before_ok = before.map_or(true, is_year_delimiter);
        let after_ok = after.map_or(true, is_year_delimiter);
        if !before_ok || !after_ok {
            continue;
        }

        let prefix = &name[..m.start()];
        if !prefix.chars().any(|c| c.is_alphanumeric()) {
            continue;
        }

        let is_bracketed = matches!(before, Some('(') | Some('['));
        let cut = if is_bracketed {
            m.start() - 1
        } else {
            m.start()
        };

        if is_bracketed {
            bracketed = Some((cut, m.as_str()));
        } else {
            bare = Some((cut, m.as_str()));
        }
    }

    bracketed
        .or(bare)
        .map(|(cut, year)| (cut, year.to_string()))
}

fn trim_tail_separators(s: &str) -> &str {
    s.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '.' | '_' | '-' | '(' | '['))
}

/// Repeatedly strip release tags and a trailing `-GROUP` from the end of `s`.
/// A strip that would leave nothing is not applied.
fn strip_release_tags(s: &str) -> &str {
    let mut current = trim_tail_separators(s);

    loop {
        if let Some((_, start)) = trailing_tag(current) {
            let rest = trim_tail_separators(&current[..start]);
            if rest.is_empty() {
                break;
            }
            current = rest;
            continue;
        }

        if let Some(caps) = TRAILING_GROUP.captures(current) {
            let before = caps.get(1).map_or("", |m| m.as_str());
            let before_trimmed = trim_tail_separators(before);
            if !before_trimmed.is_empty() && trailing_tag(before_trimmed).is_some() {
                current = before_trimmed;
                continue;
            }
        }

        break;
    }

    current
}

/// Separator and punctuation cleanup shared by every path
fn clean_separators(s: &str) -> String {
    let spaced: String = s
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}'))
        .map(|c| match c {
            '.' | '_' => ' ',
            c if c.is_alphanumeric() || c.is_whitespace() || c == '-' => c,
            _ => ' ',
        })
        .collect();

    let dehyphenated = HYPHEN_BETWEEN_SPACES.replace_all(&spaced, " ");

    dehyphenated
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches('-')
        .trim()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(raw: &str) -> String {
        normalize(raw, false).normalized_title
    }

    #[test]
    fn dotted_release_name_is_reduced_to_title_and_year() {
        let result = normalize("Movie.Name.2020.1080p.BluRay.x264-GROUP.mkv", false);
        assert_eq!(result.normalized_title, "movie name");
        assert_eq!(result.year.as_deref(), Some("2020"));
    }

    #[test]
    fn parenthesized_folder_name_matches_release_name() {
        let folder = normalize("Movie Name (2020) 720p WEBRip", false);
        let release = normalize("Movie.Name.2020.1080p.BluRay", false);
        assert_eq!(folder, release);
    }

    #[test]
    fn bare_year_is_found() {
        let result = normalize("Movie Name 1999", false);
        assert_eq!(result.year.as_deref(), Some("1999"));
        assert_eq!(result.normalized_title, "movie name");
    }

    #[test]
    fn year_inside_a_word_is_ignored() {
        let result = normalize("Movie1999Name", false);
        assert_eq!(result.year, None);
        assert_eq!(result.normalized_title, "movie1999name");
    }

    #[test]
    fn leading_number_is_not_a_year() {
        let result = normalize("2001: A Space Odyssey", false);
        assert_eq!(result.year, None);
        assert!(result.normalized_title.contains("2001"));
    }

    #[test]
    fn bracketed_year_is_preferred_over_later_bare_year() {
        let result = normalize("Blade Runner (1982) Final Cut 2007", false);
        assert_eq!(result.year.as_deref(), Some("1982"));
        assert_eq!(result.normalized_title, "blade runner");
    }

    #[test]
    fn last_bare_year_wins() {
        let result = normalize("1917.2019.1080p.WEB-DL", false);
        assert_eq!(result.year.as_deref(), Some("2019"));
        assert_eq!(result.normalized_title, "1917");
    }

    #[test]
    fn unknown_suffix_is_not_treated_as_extension() {
        assert_eq!(title("Dr. No"), "dr no");
        assert_eq!(strip_video_extension("Dr. No"), "Dr. No");
        assert_eq!(strip_video_extension("heat.MKV"), "heat");
    }

    #[test]
    fn separator_variants_of_a_tag_are_stripped() {
        assert_eq!(title("Some Movie BD Rip"), "some movie");
        assert_eq!(title("Some.Movie.BD-Rip"), "some movie");
        assert_eq!(title("Some_Movie_BDRip_x265"), "some movie");
    }

    #[test]
    fn release_group_after_tag_is_stripped() {
        assert_eq!(title("Arrival.1080p.WEB-DL.DDP5.1.H.264-NTG"), "arrival");
    }

    #[test]
    fn hyphenated_titles_survive() {
        assert_eq!(title("Spider-Man"), "spider-man");
        assert_eq!(title("Mission - Impossible"), "mission impossible");
    }

    #[test]
    fn stripping_never_empties_the_title() {
        assert_eq!(title("1080p"), "1080p");
        assert_eq!(title("HDR.x265"), "hdr");
    }

    #[test]
    fn apostrophes_are_dropped() {
        assert_eq!(title("Ocean's Eleven (2001)"), "oceans eleven");
    }

    #[test]
    fn leading_article_dropped_unless_strict() {
        assert_eq!(title("The Matrix (1999)"), "matrix");
        assert_eq!(normalize("The Matrix (1999)", true).normalized_title, "the matrix");
        assert_eq!(title("The"), "the");
    }

    #[test]
    fn tags_behind_punctuation_are_stripped_in_one_pass() {
        assert_eq!(title("Heat Director's Cut"), "heat");
        assert_eq!(title("Movie,1080p"), "movie");
        assert_eq!(title("Movie: 1080p; BluRay!"), "movie");
    }

    #[test]
    fn article_before_another_article_is_kept() {
        assert_eq!(title("The A Team"), "the a team");
        assert_eq!(title("the a team"), "the a team");
        assert_eq!(title("A Few Good Men"), "few good men");
        assert_eq!(title("An American Werewolf in London"), "american werewolf in london");
    }

    #[test]
    fn empty_input_stays_empty() {
        let result = normalize("   ", false);
        assert_eq!(result.normalized_title, "");
        assert_eq!(result.year, None);
    }

    #[test]
    fn normalization_is_idempotent_on_the_title() {
        for raw in [
            "Movie.Name.2020.1080p.BluRay.x264-GROUP.mkv",
            "The Lord of the Rings - The Fellowship of the Ring (2001)",
            "Amélie [2001] 1080p",
            "Some_Movie_BDRip_x265",
            "Spider-Man.Into.The.Spider-Verse.2018.2160p.UHD.BluRay.REMUX.HDR.HEVC.Atmos-EPSiLON",
            "Ocean's Eleven",
            "Heat Director's Cut",
            "Movie,1080p",
            "Movie: 1080p; BluRay!",
            "The A Team",
            "The An Affair",
        ] {
            let once = normalize(raw, false).normalized_title;
            let twice = normalize(&once, false).normalized_title;
            assert_eq!(once, twice, "{raw}");
        }
    }

    #[test]
    fn release_tail_starts_after_the_year() {
        assert_eq!(
            release_tail("Cam.2018.1080p.NF.WEB-DL.DDP5.1.x264-NTG.mkv"),
            ".1080p.NF.WEB-DL.DDP5.1.x264-NTG"
        );
        assert_eq!(release_tail("Heat (1995)"), ")");
        assert_eq!(release_tail("Ronin (1998) 1080p"), ") 1080p");
    }

    #[test]
    fn release_tail_without_year_starts_at_first_tag() {
        assert_eq!(release_tail("New.Movie.HDCAM.x264"), "HDCAM.x264");
        assert_eq!(release_tail("Cam.1080p.WEB-DL"), "1080p.WEB-DL");
        assert_eq!(release_tail("BluRay"), "");
        assert_eq!(release_tail("Just A Title"), "");
    }

    #[test]
    fn year_validation_requires_four_digits() {
        assert!(is_valid_year("1999"));
        assert!(!is_valid_year("199"));
        assert!(!is_valid_year("19a9"));
        assert!(!is_valid_year(""));
    }

    #[test]
    fn parenthesized_year_detection() {
        assert!(has_parenthesized_year("Heat (1995)"));
        assert!(!has_parenthesized_year("Heat.1995.1080p"));
    }
}
