//! MediaInfo adapter.

use serde_json::Value;
use std::path::Path;

use super::{json_seconds_to_ms, json_u64, run_tool, tool_available, MediaProbe, ProbeResult};
use crate::error::ProbeError;

const TOOL: &str = "mediainfo";

/// Probes files with the MediaInfo CLI
#[derive(Debug, Clone, Default)]
pub struct MediaInfoProbe;

impl MediaInfoProbe {
    /// `Some` when `mediainfo --Version` runs
    pub fn detect() -> Option<Self> {
        tool_available(TOOL, "--Version").then_some(Self)
    }

    fn try_probe(&self, path: &Path) -> Result<ProbeResult, ProbeError> {
        let stdout = run_tool(TOOL, &["--Output=JSON"], path)?;
        parse_mediainfo_json(&stdout).map_err(|reason| ProbeError::InvalidOutput {
            tool: TOOL.to_string(),
            path: path.to_path_buf(),
            reason,
        })
    }
}

impl MediaProbe for MediaInfoProbe {
    fn name(&self) -> &'static str {
        TOOL
    }

    fn probe(&self, path: &Path) -> Option<ProbeResult> {
        match self.try_probe(path) {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!(error = %e, "mediainfo probe failed");
                None
            }
        }
    }
}

fn text<'a>(track: &'a Value, key: &str) -> Option<&'a str> {
    track[key].as_str().map(str::trim).filter(|s| !s.is_empty())
}

/// Parse `mediainfo --Output=JSON` output.
///
/// Uses the General track for container, duration and overall bitrate, the
/// first Video track for dimensions, codec and HDR, and the first Audio track
/// for the audio codec and channel count.
pub fn parse_mediainfo_json(json: &str) -> Result<ProbeResult, String> {
    let data: Value = serde_json::from_str(json).map_err(|e| e.to_string())?;
    let tracks = data["media"]["track"]
        .as_array()
        .ok_or_else(|| "no media.track array".to_string())?;

    let of_type = |kind: &str| tracks.iter().find(|t| t["@type"].as_str() == Some(kind));

    let mut result = ProbeResult::default();

    if let Some(general) = of_type("General") {
        result.duration_ms = json_seconds_to_ms(&general["Duration"]).unwrap_or(0);
        result.bitrate_bps = json_u64(&general["OverallBitRate"]).unwrap_or(0);
        result.container = text(general, "Format").map(str::to_string);
    }

    let video = of_type("Video").ok_or_else(|| "no video track".to_string())?;
    result.width = json_u64(&video["Width"]).unwrap_or(0) as u32;
    result.height = json_u64(&video["Height"]).unwrap_or(0) as u32;
    result.video_codec = text(video, "Format").unwrap_or_default().to_string();
    result.hdr_format = video_hdr_format(video);

    if result.bitrate_bps == 0 {
        result.bitrate_bps = json_u64(&video["BitRate"]).unwrap_or(0);
    }
    if result.duration_ms == 0 {
        result.duration_ms = json_seconds_to_ms(&video["Duration"]).unwrap_or(0);
    }

    if let Some(audio) = of_type("Audio") {
        // "E-AC-3 JOC Dolby Digital Plus with Dolby Atmos" carries the Atmos hint
        let parts: Vec<&str> = ["Format", "Format_AdditionalFeatures", "Format_Commercial_IfAny"]
            .iter()
            .filter_map(|key| text(audio, key))
            .collect();
        result.audio_codec = parts.join(" ");
        result.audio_channels = json_u64(&audio["Channels"]).unwrap_or(0) as u32;
    }

    Ok(result)
}

/// HDR description: the explicit HDR_Format first, then the transfer
/// function, then BT.2020 primaries as a generic HDR hint.
fn video_hdr_format(video: &Value) -> Option<String> {
    if let Some(format) = text(video, "HDR_Format") {
        return Some(match text(video, "HDR_Format_Compatibility") {
            Some(compat) => format!("{format}, {compat}"),
            None => format.to_string(),
        });
    }

    if let Some(transfer) = text(video, "transfer_characteristics") {
        if transfer.contains("PQ") || transfer.contains("SMPTE ST 2084") {
            return Some("HDR10".to_string());
        }
        if transfer.contains("HLG") {
            return Some("HLG".to_string());
        }
    }

    match text(video, "colour_primaries") {
        Some(primaries) if primaries.contains("BT.2020") => Some("HDR".to_string()),
        _ => None,
    }
}
