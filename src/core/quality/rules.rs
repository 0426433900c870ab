//! Ordered scoring tables.
//!
//! Every table is evaluated top to bottom and the first matching row wins, so
//! the row order is the tie-break policy.

use regex::Regex;
use std::sync::LazyLock;

use super::{HdrFormat, Resolution, Source};

/// One row of a text table: a token pattern and what it means
#[derive(Debug)]
pub struct TextRule<T> {
    pattern: Regex,
    pub value: T,
    pub label: &'static str,
    pub points: i32,
}

impl<T> TextRule<T> {
    /// `token` is wrapped in alphanumeric boundaries and matched against
    /// lowercase text
    fn token(token: &str, value: T, label: &'static str, points: i32) -> Self {
        let pattern = Regex::new(&format!(r"(?:^|[^a-z0-9])(?:{token})(?:$|[^a-z0-9])"))
            .unwrap_or_else(|e| panic!("invalid scoring pattern {token}: {e}"));
        Self {
            pattern,
            value,
            label,
            points,
        }
    }

    /// Raw regex, matched case-insensitively against a probe value
    fn raw(pattern: &str, value: T, label: &'static str, points: i32) -> Self {
        let pattern = Regex::new(&format!("(?i){pattern}"))
            .unwrap_or_else(|e| panic!("invalid probe pattern {pattern}: {e}"));
        Self {
            pattern,
            value,
            label,
            points,
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// First matching row of a table
pub fn first_match<'a, T>(rules: &'a [TextRule<T>], text: &str) -> Option<&'a TextRule<T>> {
    rules.iter().find(|rule| rule.is_match(text))
}

/// Source tiers, strongest first
pub static SOURCE_RULES: LazyLock<Vec<TextRule<Source>>> = LazyLock::new(|| {
    vec![
        TextRule::token(r"(?:bd)?remux", Source::Remux, "Remux", 35),
        TextRule::token(r"blu[\s.\-]?ray|bdrip|brrip", Source::BluRay, "BluRay", 30),
        TextRule::token(r"web[\s.\-]?dl", Source::WebDl, "WEB-DL", 25),
        TextRule::token(r"webrip", Source::WebRip, "WEBRip", 20),
        TextRule::token(r"hdtv", Source::Hdtv, "HDTV", 15),
        TextRule::token(r"dvdrip", Source::DvdRip, "DVDRip", 10),
        TextRule::token(r"hdrip", Source::HdRip, "HDRip", 8),
    ]
});

/// Resolution markers used when no probe is available
pub static RESOLUTION_RULES: LazyLock<Vec<TextRule<Resolution>>> = LazyLock::new(|| {
    vec![
        TextRule::token(r"2160p|4k|uhd", Resolution::P2160, "2160p", 100),
        TextRule::token(r"1080[pi]", Resolution::P1080, "1080p", 80),
        TextRule::token(r"720p", Resolution::P720, "720p", 60),
        TextRule::token(r"480p|576p|dvd(?:rip)?", Resolution::P480, "480p", 40),
    ]
});

/// Video codec markers in release names
pub static VIDEO_CODEC_RULES: LazyLock<Vec<TextRule<()>>> = LazyLock::new(|| {
    vec![
        TextRule::token(r"av1", (), "AV1", 25),
        TextRule::token(r"x265|h\.?265|hevc", (), "HEVC/x265", 20),
        TextRule::token(r"vp9", (), "VP9", 18),
        TextRule::token(r"x264|h\.?264|avc", (), "AVC/H.264", 15),
        TextRule::token(r"vc-?1", (), "VC-1", 8),
        TextRule::token(r"xvid|divx", (), "XviD/MPEG-4", 5),
    ]
});

/// Video codec families as reported by probe tools (`HEVC`, `hevc`, `AVC`,
/// `h264`, `MPEG-4 Visual`, `mpeg4`)
pub static PROBE_VIDEO_CODEC_RULES: LazyLock<Vec<TextRule<()>>> = LazyLock::new(|| {
    vec![
        TextRule::raw(r"hevc|h\.?265|x265", (), "HEVC/x265", 20),
        TextRule::raw(r"av1|av01", (), "AV1", 25),
        TextRule::raw(r"vp9", (), "VP9", 18),
        TextRule::raw(r"avc|h\.?264|x264", (), "AVC/H.264", 15),
        TextRule::raw(r"vc-?1|wmv", (), "VC-1", 8),
        TextRule::raw(r"mpeg-?4|xvid|divx|mp4v", (), "XviD/MPEG-4", 5),
    ]
});

/// Points for a probed codec that is not in the table
pub const OTHER_VIDEO_CODEC_POINTS: i32 = 10;

/// Audio markers in release names, strongest first. DTS:X is checked before
/// DTS-HD since DTS:X tracks usually carry a DTS-HD core.
pub static AUDIO_RULES: LazyLock<Vec<TextRule<()>>> = LazyLock::new(|| {
    vec![
        TextRule::token(r"atmos", (), "Atmos", 15),
        TextRule::token(r"dts[\s.:\-]?x", (), "DTS:X", 14),
        TextRule::token(r"truehd", (), "TrueHD", 12),
        TextRule::token(r"dts[\s.\-]?hd(?:[\s.\-]?ma)?", (), "DTS-HD", 10),
        TextRule::token(r"dts", (), "DTS", 8),
        TextRule::token(r"e-?ac-?3|ddp(?:\d[\s.]?\d)?|dd\+(?:\d[\s.]?\d)?", (), "EAC3/DD+", 7),
        TextRule::token(r"flac", (), "FLAC", 6),
        TextRule::token(r"ac-?3|dd(?:\d[\s.]?\d)", (), "AC3", 5),
        TextRule::token(r"l?pcm", (), "PCM", 4),
        TextRule::token(r"opus", (), "Opus", 4),
        TextRule::token(r"aac(?:\d[\s.]?\d)?", (), "AAC", 3),
        TextRule::token(r"vorbis", (), "Vorbis", 2),
        TextRule::token(r"mp3", (), "MP3", 1),
    ]
});

/// Audio formats as reported by probe tools (`MLP FBA`, `E-AC-3 JOC`,
/// `truehd Dolby TrueHD + Dolby Atmos`, `dts DTS-HD MA`, `MPEG Audio`)
pub static PROBE_AUDIO_RULES: LazyLock<Vec<TextRule<()>>> = LazyLock::new(|| {
    vec![
        TextRule::raw(r"atmos|\bjoc\b", (), "Atmos", 15),
        TextRule::raw(r"dts[\s:\-]?x\b", (), "DTS:X", 14),
        TextRule::raw(r"truehd|\bmlp\b", (), "TrueHD", 12),
        TextRule::raw(r"dts-?hd|dts.*\b(?:ma|hra|xll)\b", (), "DTS-HD", 10),
        TextRule::raw(r"dts", (), "DTS", 8),
        TextRule::raw(r"e-?ac-?3|dolby digital plus", (), "EAC3/DD+", 7),
        TextRule::raw(r"flac", (), "FLAC", 6),
        TextRule::raw(r"ac-?3|dolby digital", (), "AC3", 5),
        TextRule::raw(r"pcm", (), "PCM", 4),
        TextRule::raw(r"opus", (), "Opus", 4),
        TextRule::raw(r"aac", (), "AAC", 3),
        TextRule::raw(r"vorbis", (), "Vorbis", 2),
        TextRule::raw(r"mp3|mpeg audio", (), "MP3", 1),
    ]
});

/// Points for a probed audio codec that is not in the table
pub const OTHER_AUDIO_POINTS: i32 = 2;

/// HDR markers in release names
pub static HDR_RULES: LazyLock<Vec<TextRule<HdrFormat>>> = LazyLock::new(|| {
    vec![
        TextRule::token(
            r"dolby[\s.\-]?vision|dovi|dv",
            HdrFormat::DolbyVision,
            "Dolby Vision",
            18,
        ),
        TextRule::token(r"hdr10(?:\+|plus|p)", HdrFormat::Hdr10Plus, "HDR10+", 16),
        TextRule::token(r"hdr10", HdrFormat::Hdr10, "HDR10", 12),
        TextRule::token(r"hlg", HdrFormat::Hlg, "HLG", 10),
        TextRule::token(r"hdr", HdrFormat::Hdr, "HDR", 10),
    ]
});

/// HDR descriptions from probe tools, normalized to a format
pub static PROBE_HDR_RULES: LazyLock<Vec<TextRule<HdrFormat>>> = LazyLock::new(|| {
    vec![
        TextRule::raw(r"dolby vision|dovi", HdrFormat::DolbyVision, "Dolby Vision", 18),
        TextRule::raw(r"hdr10\+|smpte st 2094", HdrFormat::Hdr10Plus, "HDR10+", 16),
        TextRule::raw(r"smpte st 2086|hdr10", HdrFormat::Hdr10, "HDR10", 12),
        TextRule::raw(r"hlg|arib", HdrFormat::Hlg, "HLG", 10),
    ]
});

/// Points for HDR the probe reports without a recognizable format
pub const GENERIC_HDR_POINTS: i32 = 10;

/// Streaming services, matched as tokens of the release text
pub static STREAMING_RULES: LazyLock<Vec<TextRule<()>>> = LazyLock::new(|| {
    vec![
        TextRule::token(r"dsnp|disney\+?|disneyplus", (), "Disney+", 5),
        TextRule::token(r"amzn|amazon", (), "Amazon", 5),
        TextRule::token(r"nf|netflix", (), "Netflix", 5),
        TextRule::token(r"hmax|hbo(?:[\s.\-]?max)?", (), "HBO Max", 5),
        TextRule::token(r"atvp|apple[\s.\-]?tv\+?", (), "Apple TV+", 5),
        TextRule::token(r"pcok|peacock", (), "Peacock", 5),
        TextRule::token(r"pmtp|paramount\+?", (), "Paramount+", 5),
        TextRule::token(r"hulu", (), "Hulu", 5),
    ]
});

/// Release groups known for heavily compressed encodes
pub const LOW_QUALITY_GROUPS: &[&str] = &["YIFY", "YTS", "RARBG", "EVO", "FGT"];

/// Penalty for a low-quality release group
pub const LOW_QUALITY_GROUP_PENALTY: i32 = -15;

/// Bitrate bonus steps in Mbps, highest first
pub const BITRATE_STEPS: &[(f64, &str, i32)] = &[
    (40.0, "High bitrate", 20),
    (20.0, "Good bitrate", 15),
    (10.0, "Moderate bitrate", 10),
    (5.0, "Low bitrate", 5),
];

/// Resolution points from a probed pixel height
pub fn resolution_points(resolution: Resolution) -> i32 {
    match resolution {
        Resolution::P2160 => 100,
        Resolution::P1080 => 80,
        Resolution::P720 => 60,
        Resolution::P480 => 40,
        Resolution::Other(_) => 20,
        Resolution::Unknown => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_table_order_is_the_tie_break() {
        let rule = first_match(&SOURCE_RULES, "movie.2020.1080p.bluray.remux").unwrap();
        assert_eq!(rule.value, Source::Remux);

        let rule = first_match(&SOURCE_RULES, "movie.2020.web-dl.webrip").unwrap();
        assert_eq!(rule.value, Source::WebDl);
    }

    #[test]
    fn tokens_need_boundaries() {
        assert!(first_match(&STREAMING_RULES, "infinity.war.2018").is_none());
        assert!(first_match(&STREAMING_RULES, "movie.2018.nf.web-dl").is_some());
        assert!(first_match(&AUDIO_RULES, "the.adtsx.file").is_none());
    }

    #[test]
    fn audio_channel_suffixes_are_allowed() {
        let rule = first_match(&AUDIO_RULES, "movie.web-dl.ddp5.1.h.264").unwrap();
        assert_eq!(rule.label, "EAC3/DD+");

        let rule = first_match(&AUDIO_RULES, "movie.dvdrip.dd5.1.xvid").unwrap();
        assert_eq!(rule.label, "AC3");

        let rule = first_match(&AUDIO_RULES, "movie.webrip.aac2.0.x264").unwrap();
        assert_eq!(rule.label, "AAC");
    }

    #[test]
    fn dts_variants_resolve_in_order() {
        assert_eq!(first_match(&AUDIO_RULES, "a.dts-x.b").unwrap().label, "DTS:X");
        assert_eq!(first_match(&AUDIO_RULES, "a.dts-hd.ma.b").unwrap().label, "DTS-HD");
        assert_eq!(first_match(&AUDIO_RULES, "a.dts.b").unwrap().label, "DTS");
    }

    #[test]
    fn probe_audio_formats_are_recognized() {
        let label = |s: &str| first_match(&PROBE_AUDIO_RULES, s).map(|r| r.label);
        assert_eq!(label("MLP FBA 16-ch Dolby TrueHD with Dolby Atmos"), Some("Atmos"));
        assert_eq!(label("MLP FBA"), Some("TrueHD"));
        assert_eq!(label("dts DTS-HD MA"), Some("DTS-HD"));
        assert_eq!(label("DTS XLL X DTS-HD Master Audio + DTS:X"), Some("DTS:X"));
        assert_eq!(label("DTS XLL"), Some("DTS-HD"));
        assert_eq!(label("DTS"), Some("DTS"));
        assert_eq!(label("E-AC-3"), Some("EAC3/DD+"));
        assert_eq!(label("AC-3"), Some("AC3"));
        assert_eq!(label("MPEG Audio"), Some("MP3"));
        assert_eq!(label("ALAC"), None);
    }

    #[test]
    fn probe_hdr_strings_are_normalized() {
        let format = |s: &str| first_match(&PROBE_HDR_RULES, s).map(|r| r.value);
        assert_eq!(format("Dolby Vision, HDR10"), Some(HdrFormat::DolbyVision));
        assert_eq!(format("SMPTE ST 2094 App 4"), Some(HdrFormat::Hdr10Plus));
        assert_eq!(format("SMPTE ST 2086"), Some(HdrFormat::Hdr10));
        assert_eq!(format("HLG"), Some(HdrFormat::Hlg));
        assert_eq!(format("HDR"), None);
    }
}
