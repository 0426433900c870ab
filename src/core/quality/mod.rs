//! # Quality Module
//!
//! Deterministic quality scoring for a media file.
//!
//! ## Two paths, one profile
//! The release *source* (Remux, BluRay, WEB-DL) can only be read from the
//! name, so text analysis always runs: source tier, streaming service and
//! release group. Resolution, codecs, HDR and bitrate come from a probe tool
//! when one answered, and from the name otherwise. The point values are the
//! same on both paths.
//!
//! ## Example
//! ```rust,ignore
//! let scorer = QualityScorer::new();
//! let profile = scorer.score("Heat.1995.1080p.BluRay.x264-SPARKS.mkv", None, None, None);
//! assert_eq!(profile.data_source, DataSource::FilenameOnly);
//! ```

pub mod concerns;
pub mod rules;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::core::probe::ProbeResult;
use crate::core::title::{release_tail, strip_video_extension, trailing_tag};
use concerns::{detect_concerns, is_low_quality_group, ConcernInputs};
use rules::{
    first_match, resolution_points, AUDIO_RULES, BITRATE_STEPS, GENERIC_HDR_POINTS, HDR_RULES,
    LOW_QUALITY_GROUP_PENALTY, OTHER_AUDIO_POINTS, OTHER_VIDEO_CODEC_POINTS, PROBE_AUDIO_RULES,
    PROBE_HDR_RULES, PROBE_VIDEO_CODEC_RULES, RESOLUTION_RULES, SOURCE_RULES, STREAMING_RULES,
    VIDEO_CODEC_RULES,
};

pub use concerns::{Concern, Severity};

/// Vertical resolution class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    P2160,
    P1080,
    P720,
    P480,
    /// Anything with a known height below 480 lines
    Other(u32),
    Unknown,
}

impl Resolution {
    /// Classify a pixel height
    pub fn from_height(height: u32) -> Self {
        match height {
            h if h >= 2160 => Resolution::P2160,
            h if h >= 1080 => Resolution::P1080,
            h if h >= 720 => Resolution::P720,
            h if h >= 480 => Resolution::P480,
            0 => Resolution::Unknown,
            h => Resolution::Other(h),
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::P2160 => write!(f, "2160p"),
            Resolution::P1080 => write!(f, "1080p"),
            Resolution::P720 => write!(f, "720p"),
            Resolution::P480 => write!(f, "480p"),
            Resolution::Other(h) => write!(f, "{h}p"),
            Resolution::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Release source tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    Remux,
    BluRay,
    WebDl,
    WebRip,
    Hdtv,
    DvdRip,
    HdRip,
    Unknown,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Source::Remux => "Remux",
            Source::BluRay => "BluRay",
            Source::WebDl => "WEB-DL",
            Source::WebRip => "WEBRip",
            Source::Hdtv => "HDTV",
            Source::DvdRip => "DVDRip",
            Source::HdRip => "HDRip",
            Source::Unknown => "Unknown",
        };
        write!(f, "{label}")
    }
}

/// HDR flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HdrFormat {
    DolbyVision,
    Hdr10Plus,
    Hdr10,
    Hlg,
    Hdr,
}

impl std::fmt::Display for HdrFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            HdrFormat::DolbyVision => "Dolby Vision",
            HdrFormat::Hdr10Plus => "HDR10+",
            HdrFormat::Hdr10 => "HDR10",
            HdrFormat::Hlg => "HLG",
            HdrFormat::Hdr => "HDR",
        };
        write!(f, "{label}")
    }
}

/// Where resolution, codecs and HDR were read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    ProbeTool,
    FilenameOnly,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::ProbeTool => write!(f, "Probe"),
            DataSource::FilenameOnly => write!(f, "Filename"),
        }
    }
}

/// Everything the scorer concluded about one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityProfile {
    /// Total points; penalties can push it below zero
    pub score: i32,
    pub resolution: Resolution,
    pub video_codec: String,
    pub audio_codec: String,
    pub source: Source,
    pub hdr: bool,
    pub hdr_format: Option<HdrFormat>,
    pub bitrate_bps: u64,
    pub width: u32,
    pub height: u32,
    pub audio_channels: u32,
    pub duration_ms: u64,
    pub file_size_bytes: u64,
    pub data_source: DataSource,
    pub streaming_service: Option<String>,
    pub release_group: Option<String>,
    /// `"label (+N)"` entries in the order points were applied
    pub details: Vec<String>,
    /// `"message (severity)"` entries
    pub concerns: Vec<String>,
}

impl QualityProfile {
    fn empty(data_source: DataSource, file_size_bytes: u64) -> Self {
        Self {
            score: 0,
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
            file_size_bytes,
            data_source,
            streaming_service: None,
            release_group: None,
            details: Vec::new(),
            concerns: Vec::new(),
        }
    }

    fn add(&mut self, label: impl std::fmt::Display, points: i32) {
        self.score += points;
        if points >= 0 {
            self.details.push(format!("{label} (+{points})"));
        } else {
            self.details.push(format!("{label} ({points})"));
        }
    }
}

static HYPHEN_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)-([A-Za-z0-9]+)$").expect("valid regex"));

static BRACKET_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([A-Za-z0-9][A-Za-z0-9.\-]*)\]\s*$").expect("valid regex"));

static TRAILING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^0-9])(?:19|20)\d{2}$").expect("valid regex"));

/// Release group of a name: the text after the final hyphen when it follows a
/// release tag or year (`...x264-SPARKS`), else a trailing `[GROUP]` bracket.
/// Hyphenated titles (`Spider-Man`) yield nothing.
pub fn detect_release_group(name: &str) -> Option<String> {
    let stem = strip_video_extension(name.trim());

    if let Some(caps) = HYPHEN_GROUP.captures(stem) {
        let before = caps.get(1).map_or("", |m| m.as_str());
        let before = before.trim_end_matches(['.', ' ', '_', ']', ')']);
        if trailing_tag(before).is_some() || TRAILING_YEAR.is_match(before) {
            return caps.get(2).map(|m| m.as_str().to_string());
        }
    }

    BRACKET_GROUP
        .captures(stem)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Scores files against the rule tables
#[derive(Debug, Clone, Default)]
pub struct QualityScorer;

impl QualityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score one file.
    ///
    /// `file_name` is the video file name, `release_info` any extra release
    /// text (usually the folder name). Never fails: without a probe result the
    /// profile is built from the text alone.
    pub fn score(
        &self,
        file_name: &str,
        probe: Option<&ProbeResult>,
        file_size_bytes: Option<u64>,
        release_info: Option<&str>,
    ) -> QualityProfile {
        let text = combined_text(file_name, release_info);

        let mut profile = match probe {
            Some(probe) => {
                let mut profile =
                    QualityProfile::empty(DataSource::ProbeTool, file_size_bytes.unwrap_or(0));
                self.apply_probe(&mut profile, probe);
                profile
            }
            None => {
                let mut profile =
                    QualityProfile::empty(DataSource::FilenameOnly, file_size_bytes.unwrap_or(0));
                self.apply_filename(&mut profile, &text);
                profile
            }
        };

        self.apply_text(&mut profile, &text, file_name, release_info);

        let release_tags = release_tags_text(file_name, release_info);
        let concerns = detect_concerns(&ConcernInputs {
            text: &text,
            release_tags: &release_tags,
            resolution: profile.resolution,
            source: profile.source,
            bitrate_bps: profile.bitrate_bps,
            duration_ms: profile.duration_ms,
            file_size_bytes: profile.file_size_bytes,
            release_group: profile.release_group.as_deref(),
        });
        profile.concerns = concerns.iter().map(ToString::to_string).collect();

        tracing::debug!(
            file = file_name,
            score = profile.score,
            source = %profile.data_source,
            "scored"
        );

        profile
    }

    fn apply_probe(&self, profile: &mut QualityProfile, probe: &ProbeResult) {
        profile.width = probe.width;
        profile.height = probe.height;
        profile.bitrate_bps = probe.bitrate_bps;
        profile.audio_channels = probe.audio_channels;
        profile.duration_ms = probe.duration_ms;

        let resolution = Resolution::from_height(probe.height);
        profile.resolution = resolution;
        match resolution {
            Resolution::Unknown => {}
            Resolution::Other(_) => profile.add(
                format!("{resolution} [Probe]"),
                resolution_points(resolution),
            ),
            _ => profile.add(
                format!("{resolution} [Probe: {}x{}]", probe.width, probe.height),
                resolution_points(resolution),
            ),
        }

        let codec = probe.video_codec.trim();
        if !codec.is_empty() {
            match first_match(&PROBE_VIDEO_CODEC_RULES, codec) {
                Some(rule) => {
                    profile.video_codec = rule.label.to_string();
                    profile.add(format!("{} [Probe: {codec}]", rule.label), rule.points);
                }
                None => {
                    profile.video_codec = codec.to_string();
                    profile.add(format!("{codec} [Probe]"), OTHER_VIDEO_CODEC_POINTS);
                }
            }
        }

        let audio = probe.audio_codec.trim();
        if !audio.is_empty() {
            let annotation = if probe.audio_channels > 0 {
                format!("[Probe {}ch]", probe.audio_channels)
            } else {
                "[Probe]".to_string()
            };
            match first_match(&PROBE_AUDIO_RULES, audio) {
                Some(rule) => {
                    profile.audio_codec = rule.label.to_string();
                    profile.add(format!("{} {annotation}", rule.label), rule.points);
                }
                None => {
                    profile.audio_codec = audio.to_string();
                    profile.add(format!("{audio} {annotation}"), OTHER_AUDIO_POINTS);
                }
            }
        }

        if let Some(hdr) = probe.hdr_format.as_deref().map(str::trim) {
            profile.hdr = true;
            match first_match(&PROBE_HDR_RULES, hdr) {
                Some(rule) => {
                    profile.hdr_format = Some(rule.value);
                    profile.add(format!("{} [Probe]", rule.label), rule.points);
                }
                None => {
                    profile.hdr_format = Some(HdrFormat::Hdr);
                    profile.add("HDR [Probe]", GENERIC_HDR_POINTS);
                }
            }
        }

        if probe.bitrate_bps > 0 {
            let rate = probe.bitrate_bps as f64 / 1_000_000.0;
            if let Some(&(_, label, points)) =
                BITRATE_STEPS.iter().find(|(floor, _, _)| rate >= *floor)
            {
                profile.add(format!("{label} [{rate:.1} Mbps]"), points);
            }
        }
    }

    fn apply_filename(&self, profile: &mut QualityProfile, text: &str) {
        if let Some(rule) = first_match(&RESOLUTION_RULES, text) {
            profile.resolution = rule.value;
            profile.add(rule.label, rule.points);
        }

        if let Some(rule) = first_match(&VIDEO_CODEC_RULES, text) {
            profile.video_codec = rule.label.to_string();
            profile.add(rule.label, rule.points);
        }

        if let Some(rule) = first_match(&AUDIO_RULES, text) {
            profile.audio_codec = rule.label.to_string();
            profile.add(rule.label, rule.points);
        }

        if let Some(rule) = first_match(&HDR_RULES, text) {
            profile.hdr = true;
            profile.hdr_format = Some(rule.value);
            profile.add(rule.label, rule.points);
        }
    }

    /// Source, streaming service and release group. Runs on both paths.
    fn apply_text(
        &self,
        profile: &mut QualityProfile,
        text: &str,
        file_name: &str,
        release_info: Option<&str>,
    ) {
        if let Some(rule) = first_match(&SOURCE_RULES, text) {
            profile.source = rule.value;
            profile.add(rule.label, rule.points);
        }

        if let Some(rule) = first_match(&STREAMING_RULES, text) {
            profile.streaming_service = Some(rule.label.to_string());
            profile.add(format!("Streaming: {}", rule.label), rule.points);
        }

        let group = detect_release_group(file_name)
            .or_else(|| release_info.and_then(detect_release_group));
        if let Some(group) = &group {
            if is_low_quality_group(group) {
                profile.add(
                    format!("Low-quality group {group}"),
                    LOW_QUALITY_GROUP_PENALTY,
                );
            }
        }
        profile.release_group = group;
    }
}

/// Lowercase file name (without a video extension, so `.ts` is not read as
/// telesync) plus release info
fn combined_text(file_name: &str, release_info: Option<&str>) -> String {
    let name = strip_video_extension(file_name.trim());
    match release_info.map(str::trim).filter(|s| !s.is_empty()) {
        Some(info) => format!("{name} {info}").to_lowercase(),
        None => name.to_lowercase(),
    }
}

/// Tag parts of the file name and release info, titles left out
fn release_tags_text(file_name: &str, release_info: Option<&str>) -> String {
    let mut tails = vec![release_tail(file_name)];
    if let Some(info) = release_info {
        tails.push(release_tail(info));
    }
    tails.join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(width: u32, height: u32) -> ProbeResult {
        ProbeResult {
            width,
            height,
            video_codec: "HEVC".to_string(),
            audio_codec: "E-AC-3".to_string(),
            audio_channels: 6,
            bitrate_bps: 0,
            duration_ms: 0,
            hdr_format: None,
            container: None,
        }
    }

    #[test]
    fn filename_path_scores_release_tags() {
        let scorer = QualityScorer::new();
        let profile = scorer.score("Movie.Name.2020.1080p.BluRay.x264-GROUP.mkv", None, None, None);

        assert_eq!(profile.data_source, DataSource::FilenameOnly);
        assert_eq!(profile.resolution, Resolution::P1080);
        assert_eq!(profile.video_codec, "AVC/H.264");
        assert_eq!(profile.source, Source::BluRay);
        assert_eq!(profile.score, 80 + 15 + 30);
        assert_eq!(
            profile.details,
            vec!["1080p (+80)", "AVC/H.264 (+15)", "BluRay (+30)"]
        );
        assert_eq!(profile.release_group.as_deref(), Some("GROUP"));
    }

    #[test]
    fn probe_path_uses_stream_facts() {
        let scorer = QualityScorer::new();
        let mut p = probe(1920, 1080);
        p.bitrate_bps = 12_500_000;
        let profile = scorer.score("movie.mkv", Some(&p), Some(8_000_000_000), Some("Movie (2020)"));

        assert_eq!(profile.data_source, DataSource::ProbeTool);
        assert_eq!(profile.details[0], "1080p [Probe: 1920x1080] (+80)");
        assert_eq!(profile.details[1], "HEVC/x265 [Probe: HEVC] (+20)");
        assert_eq!(profile.details[2], "EAC3/DD+ [Probe 6ch] (+7)");
        assert_eq!(profile.details[3], "Moderate bitrate [12.5 Mbps] (+10)");
        assert_eq!(profile.score, 80 + 20 + 7 + 10);
        assert_eq!(profile.file_size_bytes, 8_000_000_000);
    }

    #[test]
    fn score_is_monotonic_in_height() {
        let scorer = QualityScorer::new();
        let scores: Vec<i32> = [2160, 1080, 720, 480]
            .iter()
            .map(|&h| scorer.score("movie.mkv", Some(&probe(h * 16 / 9, h)), None, None).score)
            .collect();
        assert!(scores.windows(2).all(|w| w[0] > w[1]), "{scores:?}");
    }

    #[test]
    fn channels_do_not_change_the_score() {
        let scorer = QualityScorer::new();
        let stereo = ProbeResult {
            audio_channels: 2,
            ..probe(1920, 1080)
        };
        let surround = ProbeResult {
            audio_channels: 8,
            ..probe(1920, 1080)
        };
        assert_eq!(
            scorer.score("m.mkv", Some(&stereo), None, None).score,
            scorer.score("m.mkv", Some(&surround), None, None).score
        );
    }

    #[test]
    fn unknown_probe_codecs_get_fallback_points() {
        let scorer = QualityScorer::new();
        let p = ProbeResult {
            video_codec: "ProRes".to_string(),
            audio_codec: "ALAC".to_string(),
            audio_channels: 0,
            ..probe(1920, 1080)
        };
        let profile = scorer.score("clip.mov", Some(&p), None, None);
        assert_eq!(profile.video_codec, "ProRes");
        assert!(profile.details.contains(&"ProRes [Probe] (+10)".to_string()));
        assert!(profile.details.contains(&"ALAC [Probe] (+2)".to_string()));
    }

    #[test]
    fn probe_hdr_formats_are_normalized() {
        let scorer = QualityScorer::new();
        let p = ProbeResult {
            hdr_format: Some("Dolby Vision, HDR10".to_string()),
            ..probe(3840, 2160)
        };
        let profile = scorer.score("m.mkv", Some(&p), None, None);
        assert!(profile.hdr);
        assert_eq!(profile.hdr_format, Some(HdrFormat::DolbyVision));
        assert!(profile.details.contains(&"Dolby Vision [Probe] (+18)".to_string()));

        let p = ProbeResult {
            hdr_format: Some("HDR".to_string()),
            ..probe(3840, 2160)
        };
        let profile = scorer.score("m.mkv", Some(&p), None, None);
        assert_eq!(profile.hdr_format, Some(HdrFormat::Hdr));
    }

    #[test]
    fn short_video_gets_small_resolution_score() {
        let scorer = QualityScorer::new();
        let profile = scorer.score("old.avi", Some(&probe(480, 360)), None, None);
        assert_eq!(profile.resolution, Resolution::Other(360));
        assert_eq!(profile.details[0], "360p [Probe] (+20)");
    }

    #[test]
    fn source_is_read_from_text_even_with_probe() {
        let scorer = QualityScorer::new();
        let profile = scorer.score(
            "Movie.2019.2160p.UHD.BluRay.REMUX.HDR.HEVC.Atmos-EPSiLON.mkv",
            Some(&probe(3840, 2160)),
            None,
            None,
        );
        assert_eq!(profile.source, Source::Remux);
        assert!(profile.details.contains(&"Remux (+35)".to_string()));
    }

    #[test]
    fn streaming_bonus_and_group_penalty() {
        let scorer = QualityScorer::new();
        let profile = scorer.score("Show.S01E01.1080p.NF.WEB-DL.DDP5.1.H.264-NTb.mkv", None, None, None);
        assert_eq!(profile.streaming_service.as_deref(), Some("Netflix"));
        assert!(profile.details.contains(&"Streaming: Netflix (+5)".to_string()));

        let profile = scorer.score("Movie (2019) [1080p] [YTS.MX].mp4", None, None, None);
        assert_eq!(profile.release_group.as_deref(), Some("YTS.MX"));
        assert!(profile.details.contains(&"Low-quality group YTS.MX (-15)".to_string()));
        assert!(profile
            .concerns
            .iter()
            .any(|c| c.starts_with("Known low-quality release group")));
    }

    #[test]
    fn hyphenated_title_is_not_a_release_group() {
        assert_eq!(detect_release_group("Spider-Man.mkv"), None);
        assert_eq!(
            detect_release_group("Heat.1995.1080p.BluRay.x264-SPARKS.mkv").as_deref(),
            Some("SPARKS")
        );
        assert_eq!(detect_release_group("Heat.1995-FGT.avi").as_deref(), Some("FGT"));
    }

    #[test]
    fn filename_hdr_and_audio_detection() {
        let scorer = QualityScorer::new();
        let profile = scorer.score(
            "Dune.2021.2160p.WEB-DL.DDP5.1.Atmos.DV.HDR10.H.265-FLUX.mkv",
            None,
            None,
            None,
        );
        assert_eq!(profile.resolution, Resolution::P2160);
        assert_eq!(profile.audio_codec, "Atmos");
        assert_eq!(profile.hdr_format, Some(HdrFormat::DolbyVision));
        assert_eq!(profile.video_codec, "HEVC/x265");
        assert_eq!(profile.score, 100 + 20 + 15 + 18 + 25);
    }

    #[test]
    fn transport_stream_extension_is_not_telesync() {
        let scorer = QualityScorer::new();
        let profile = scorer.score("recording.ts", None, None, None);
        assert!(profile.concerns.is_empty());
    }

    #[test]
    fn title_word_matching_a_pre_release_tag_is_not_flagged() {
        let scorer = QualityScorer::new();
        let profile = scorer.score("Cam.2018.1080p.NF.WEB-DL.DDP5.1.x264-NTG.mkv", None, None, None);
        assert!(profile.concerns.is_empty(), "{:?}", profile.concerns);

        let profile = scorer.score("Heat.1995.TS.x264.mkv", None, None, Some("Heat (1995)"));
        assert!(profile.concerns.iter().any(|c| c.starts_with("Telesync")));

        let profile = scorer.score("movie.mkv", None, None, Some("Cam Girl (2020)"));
        assert!(profile.concerns.is_empty());
    }

    #[test]
    fn empty_name_scores_zero() {
        let scorer = QualityScorer::new();
        let profile = scorer.score("", None, None, None);
        assert_eq!(profile.score, 0);
        assert_eq!(profile.resolution, Resolution::Unknown);
        assert_eq!(profile.video_codec, "Unknown");
        assert!(profile.details.is_empty());
    }
}
