//! Release-tag table used to trim scene/release noise from the end of a name.
//!
//! Every entry is written the way it usually appears in release names
//! (`BDRip`, `WEB-DL`, `DD5.1`) and compiled once into a pattern that also
//! accepts the separator variants people actually use (`BD Rip`, `BD-Rip`,
//! `BD.Rip`, `bd_rip`).

use regex::Regex;
use std::sync::LazyLock;

/// What a release tag describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Resolution,
    Source,
    VideoCodec,
    Audio,
    Hdr,
    ReleaseType,
    Language,
    Streaming,
    ReleaseGroup,
}

/// One compiled entry of the tag table
#[derive(Debug)]
pub struct ReleaseTag {
    /// The spelling used in the table (e.g. "BDRip")
    pub canonical: &'static str,
    /// Category of the tag
    pub kind: TagKind,
    /// Matches the tag as the last token of a string
    tail: Regex,
}

impl ReleaseTag {
    fn new(canonical: &'static str, kind: TagKind) -> Self {
        let pattern = format!(
            r"(?i)(?:^|[\s._\-\[\(])(?:{})[\s._\-\]\)]*$",
            separator_tolerant_pattern(canonical)
        );
        let tail = Regex::new(&pattern)
            .unwrap_or_else(|e| panic!("invalid release tag pattern for {canonical}: {e}"));
        Self {
            canonical,
            kind,
            tail,
        }
    }

    /// Byte offset where this tag starts if it is the last token of `text`
    pub fn tail_match(&self, text: &str) -> Option<usize> {
        self.tail.find(text).map(|m| {
            // The match may include the leading delimiter
            let matched = m.as_str();
            let skip = matched
                .char_indices()
                .find(|(_, c)| !matches!(c, ' ' | '\t' | '.' | '_' | '-' | '[' | '('))
                .map(|(i, _)| i)
                .unwrap_or(0);
            m.start() + skip
        })
    }
}

const SEPARATOR_CLASS: &str = r"[\s._\-]?";

/// Build a regex fragment for a tag that tolerates separator variants.
///
/// Separators already present in the tag (`-`, `.`, `_`, space) become an
/// optional separator class, and an optional separator is inserted at
/// camel-case boundaries: `BDRip` → `BD[\s._\-]?Rip`, `DolbyVision` →
/// `Dolby[\s._\-]?Vision`. The result is not anchored and carries no flags.
pub fn separator_tolerant_pattern(tag: &str) -> String {
    let chars: Vec<char> = tag.chars().collect();
    let mut out = String::new();
    let mut pending_separator = false;

    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '-' | '.' | '_' | ' ') {
            pending_separator = true;
            continue;
        }

        if i > 0 && !pending_separator && is_camel_boundary(&chars, i) {
            pending_separator = true;
        }

        if pending_separator && !out.is_empty() {
            out.push_str(SEPARATOR_CLASS);
        }
        pending_separator = false;

        out.push_str(&regex::escape(&c.to_string()));
    }

    out
}

/// `aB` is a boundary, and so is the last capital of an acronym followed by a
/// lowercase letter (`BDRip` splits as `BD|Rip`).
fn is_camel_boundary(chars: &[char], i: usize) -> bool {
    let prev = chars[i - 1];
    let cur = chars[i];

    if prev.is_lowercase() && cur.is_uppercase() {
        return true;
    }

    if prev.is_uppercase() && cur.is_uppercase() {
        if let Some(next) = chars.get(i + 1) {
            return next.is_lowercase();
        }
    }

    false
}

/// The ordered tag table. More specific spellings come before the shorter
/// tags they contain.
pub static RELEASE_TAGS: LazyLock<Vec<ReleaseTag>> = LazyLock::new(|| {
    use TagKind::*;

    let table: &[(&'static str, TagKind)] = &[
        // Resolution
        ("2160p", Resolution),
        ("1080p", Resolution),
        ("1080i", Resolution),
        ("720p", Resolution),
        ("576p", Resolution),
        ("480p", Resolution),
        ("4K", Resolution),
        ("2K", Resolution),
        ("UHD", Resolution),
        // Source
        ("BDRemux", Source),
        ("Remux", Source),
        ("BluRay", Source),
        ("BDRip", Source),
        ("BRRip", Source),
        ("WEB-DL", Source),
        ("WEBRip", Source),
        ("HDRip", Source),
        ("DVDRip", Source),
        ("DVDScr", Source),
        ("HDTV", Source),
        ("HDCAM", Source),
        ("DVD", Source),
        ("WEB", Source),
        // Video codec
        ("x264", VideoCodec),
        ("x265", VideoCodec),
        ("H.264", VideoCodec),
        ("H.265", VideoCodec),
        ("HEVC", VideoCodec),
        ("AVC", VideoCodec),
        ("AV1", VideoCodec),
        ("VP9", VideoCodec),
        ("XviD", VideoCodec),
        ("DivX", VideoCodec),
        ("10bit", VideoCodec),
        ("8bit", VideoCodec),
        // Audio
        ("DTS-HD.MA", Audio),
        ("DTS-HD", Audio),
        ("DTS-X", Audio),
        ("DTS", Audio),
        ("TrueHD", Audio),
        ("Atmos", Audio),
        ("DDP5.1", Audio),
        ("DD5.1", Audio),
        ("EAC3", Audio),
        ("AC3", Audio),
        ("AAC", Audio),
        ("FLAC", Audio),
        ("7.1", Audio),
        ("5.1", Audio),
        // HDR
        ("HDR10+", Hdr),
        ("HDR10", Hdr),
        ("HDR", Hdr),
        ("DolbyVision", Hdr),
        ("DoVi", Hdr),
        ("DV", Hdr),
        ("HLG", Hdr),
        ("SDR", Hdr),
        // Release type
        ("Extended", ReleaseType),
        ("Unrated", ReleaseType),
        ("Remastered", ReleaseType),
        ("DirectorsCut", ReleaseType),
        ("IMAX", ReleaseType),
        ("REPACK", ReleaseType),
        ("PROPER", ReleaseType),
        ("Limited", ReleaseType),
        ("Internal", ReleaseType),
        // Language / region
        ("Multi", Language),
        ("Dual", Language),
        ("Subbed", Language),
        ("Dubbed", Language),
        ("ENG", Language),
        // Streaming services
        ("AMZN", Streaming),
        ("NF", Streaming),
        ("DSNP", Streaming),
        ("HMAX", Streaming),
        ("ATVP", Streaming),
        ("PCOK", Streaming),
        ("PMTP", Streaming),
        ("HULU", Streaming),
        // Release groups
        ("YTS.MX", ReleaseGroup),
        ("YIFY", ReleaseGroup),
        ("YTS", ReleaseGroup),
        ("RARBG", ReleaseGroup),
        ("SPARKS", ReleaseGroup),
        ("GalaxyRG", ReleaseGroup),
        ("EVO", ReleaseGroup),
        ("FGT", ReleaseGroup),
        ("ETRG", ReleaseGroup),
    ];

    table
        .iter()
        .map(|&(canonical, kind)| ReleaseTag::new(canonical, kind))
        .collect()
});

/// Find the first table entry that is the last token of `text`
pub fn trailing_tag(text: &str) -> Option<(&'static ReleaseTag, usize)> {
    RELEASE_TAGS
        .iter()
        .find_map(|tag| tag.tail_match(text).map(|start| (tag, start)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_tags_get_optional_separator() {
        assert_eq!(separator_tolerant_pattern("BDRip"), r"BD[\s._\-]?Rip");
        assert_eq!(separator_tolerant_pattern("DolbyVision"), r"Dolby[\s._\-]?Vision");
        assert_eq!(separator_tolerant_pattern("WEBRip"), r"WEB[\s._\-]?Rip");
    }

    #[test]
    fn existing_separators_become_flexible() {
        assert_eq!(separator_tolerant_pattern("WEB-DL"), r"WEB[\s._\-]?DL");
        assert_eq!(separator_tolerant_pattern("DD5.1"), r"DD5[\s._\-]?1");
    }

    #[test]
    fn plain_tags_are_escaped_verbatim() {
        assert_eq!(separator_tolerant_pattern("HDTV"), "HDTV");
        assert_eq!(separator_tolerant_pattern("x264"), "x264");
        assert_eq!(separator_tolerant_pattern("HDR10+"), r"HDR10\+");
    }

    #[test]
    fn bdrip_matches_every_separator_variant() {
        for name in ["Movie BDRip", "Movie BD Rip", "Movie BD-Rip", "Movie.BD.Rip", "movie_bd_rip"] {
            let (tag, _) = trailing_tag(name).unwrap_or_else(|| panic!("no tag in {name}"));
            assert_eq!(tag.canonical, "BDRip", "{name}");
        }
    }

    #[test]
    fn tag_must_be_a_whole_token() {
        assert!(trailing_tag("Mad Max Fury Road").is_none());
        assert!(trailing_tag("Cinderella").is_none());
    }

    #[test]
    fn tail_match_points_at_tag_start() {
        let (tag, start) = trailing_tag("Movie.Name.1080p").unwrap();
        assert_eq!(tag.canonical, "1080p");
        assert_eq!(&"Movie.Name.1080p"[..start], "Movie.Name.");
    }

    #[test]
    fn bracketed_group_is_a_trailing_tag() {
        let (tag, _) = trailing_tag("Movie [YTS.MX]").unwrap();
        assert_eq!(tag.kind, TagKind::ReleaseGroup);
    }
}
