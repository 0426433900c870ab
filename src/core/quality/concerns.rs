//! Quality-risk flags.
//!
//! Concerns never change the score. They point out copies a person should
//! look at before trusting the ranking: starved bitrates, files too small for
//! their runtime, sources that do not match their bitrate, and pre-release
//! recordings.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::rules::LOW_QUALITY_GROUPS;
use super::{Resolution, Source};

/// How much a concern should worry the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// One flagged risk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concern {
    pub message: String,
    pub severity: Severity,
}

impl std::fmt::Display for Concern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.severity)
    }
}

/// Inputs the checks look at. Zero means "unknown" and skips the checks that
/// need the value.
#[derive(Debug, Clone, Copy)]
pub struct ConcernInputs<'a> {
    /// Lowercase release text (file name plus release info)
    pub text: &'a str,
    /// Lowercase release-tag parts of the same names, without the titles
    pub release_tags: &'a str,
    pub resolution: Resolution,
    pub source: Source,
    pub bitrate_bps: u64,
    pub duration_ms: u64,
    pub file_size_bytes: u64,
    pub release_group: Option<&'a str>,
}

const GIB: u64 = 1024 * 1024 * 1024;
const FEATURE_LENGTH_MS: u64 = 80 * 60 * 1000;

struct PreReleaseRule {
    pattern: Regex,
    message: &'static str,
    severity: Severity,
}

static PRE_RELEASE_RULES: LazyLock<Vec<PreReleaseRule>> = LazyLock::new(|| {
    let rule = |token: &str, message, severity| PreReleaseRule {
        pattern: Regex::new(&format!(r"(?:^|[^a-z0-9])(?:{token})(?:$|[^a-z0-9])"))
            .unwrap_or_else(|e| panic!("invalid pre-release pattern {token}: {e}")),
        message,
        severity,
    };
    vec![
        rule(r"cam|camrip|hdcam", "Camera recording (CAM)", Severity::Critical),
        rule(r"ts|hdts|telesync", "Telesync source (TS)", Severity::Critical),
        rule(r"tc|hdtc|telecine", "Telecine source (TC)", Severity::High),
        rule(r"wp|workprint", "Workprint", Severity::High),
        rule(
            r"scr|screener|dvdscr|bdscr|webscr",
            "Screener copy",
            Severity::Medium,
        ),
        rule(r"r5|r6", "Region 5/6 early release", Severity::Medium),
    ]
});

static ENCODE_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|[^a-z0-9])(?:x26[45]|h\.?26[45]|hevc|avc|xvid|divx|av1|bdrip|brrip|webrip|dvdrip|hdrip|2160p|1080p|720p|480p)(?:$|[^a-z0-9])",
    )
    .expect("valid regex")
});

/// Whether the release text looks like a re-encode rather than a disc rip.
///
/// Any codec, rip-source or resolution tag counts. This misfires on full disc
/// rips that carry a resolution tag (`Movie.2020.1080p.BluRay`), which are then
/// exempt from the BluRay bitrate check. Remux has its own unconditional
/// check, so only plain BluRay names are affected.
pub fn looks_like_encode(text: &str) -> bool {
    ENCODE_MARKERS.is_match(text)
}

fn mbps(bps: u64) -> f64 {
    bps as f64 / 1_000_000.0
}

fn gb(bytes: u64) -> f64 {
    bytes as f64 / GIB as f64
}

/// Run every check and return the concerns in a fixed order
pub fn detect_concerns(inputs: &ConcernInputs<'_>) -> Vec<Concern> {
    let mut concerns = Vec::new();

    bitrate_for_resolution(inputs, &mut concerns);
    size_for_duration(inputs, &mut concerns);
    source_bitrate_mismatch(inputs, &mut concerns);

    if let Some(group) = inputs.release_group {
        if is_low_quality_group(group) {
            concerns.push(Concern {
                message: format!("Known low-quality release group: {group}"),
                severity: Severity::Medium,
            });
        }
    }

    for rule in PRE_RELEASE_RULES.iter() {
        if rule.pattern.is_match(inputs.release_tags) {
            concerns.push(Concern {
                message: rule.message.to_string(),
                severity: rule.severity,
            });
        }
    }

    concerns
}

/// Group names compare by their part before the first dot (`YTS.MX` is `YTS`)
pub fn is_low_quality_group(group: &str) -> bool {
    let base = group.split('.').next().unwrap_or(group);
    LOW_QUALITY_GROUPS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(base))
}

fn bitrate_for_resolution(inputs: &ConcernInputs<'_>, concerns: &mut Vec<Concern>) {
    if inputs.bitrate_bps == 0 {
        return;
    }
    let rate = mbps(inputs.bitrate_bps);

    let (label, very_low, low) = match inputs.resolution {
        Resolution::P2160 => ("4K", 8.0, Some(12.0)),
        Resolution::P1080 => ("1080p", 2.0, Some(3.0)),
        Resolution::P720 => ("720p", 1.0, None),
        _ => return,
    };

    if rate < very_low {
        concerns.push(Concern {
            message: format!("Very low bitrate for {label}: {rate:.1} Mbps"),
            severity: Severity::High,
        });
    } else if low.is_some_and(|low| rate < low) {
        concerns.push(Concern {
            message: format!("Low bitrate for {label}: {rate:.1} Mbps"),
            severity: Severity::Medium,
        });
    }
}

fn size_for_duration(inputs: &ConcernInputs<'_>, concerns: &mut Vec<Concern>) {
    if inputs.duration_ms < FEATURE_LENGTH_MS || inputs.file_size_bytes == 0 {
        return;
    }
    let minutes = inputs.duration_ms / 60_000;
    let size = gb(inputs.file_size_bytes);

    if inputs.file_size_bytes < GIB {
        concerns.push(Concern {
            message: format!("Undersized file: {size:.2} GB for {minutes} min"),
            severity: Severity::High,
        });
    } else if inputs.resolution == Resolution::P2160 && inputs.file_size_bytes < 5 * GIB {
        concerns.push(Concern {
            message: format!("Undersized for 4K: {size:.2} GB for {minutes} min"),
            severity: Severity::Medium,
        });
    }
}

fn source_bitrate_mismatch(inputs: &ConcernInputs<'_>, concerns: &mut Vec<Concern>) {
    if inputs.bitrate_bps == 0 {
        return;
    }
    let rate = mbps(inputs.bitrate_bps);

    match inputs.source {
        Source::Remux if rate < 15.0 => concerns.push(Concern {
            message: format!("Remux with low bitrate: {rate:.1} Mbps (expected 15+)"),
            severity: Severity::High,
        }),
        Source::BluRay if rate < 10.0 && !looks_like_encode(inputs.text) => {
            concerns.push(Concern {
                message: format!("BluRay source with low bitrate: {rate:.1} Mbps (expected 10+)"),
                severity: Severity::Medium,
            })
        }
        _ => {}
    }
}
