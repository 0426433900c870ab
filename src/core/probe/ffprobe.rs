//! ffprobe adapter.

use serde_json::Value;
use std::path::Path;

use super::{json_seconds_to_ms, json_u64, run_tool, tool_available, MediaProbe, ProbeResult};
use crate::error::ProbeError;

const TOOL: &str = "ffprobe";

/// Probes files with ffprobe from FFmpeg
#[derive(Debug, Clone, Default)]
pub struct FfprobeProbe;

impl FfprobeProbe {
    /// `Some` when `ffprobe -version` runs
    pub fn detect() -> Option<Self> {
        tool_available(TOOL, "-version").then_some(Self)
    }

    fn try_probe(&self, path: &Path) -> Result<ProbeResult, ProbeError> {
        let stdout = run_tool(
            TOOL,
            &[
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ],
            path,
        )?;
        parse_ffprobe_json(&stdout).map_err(|reason| ProbeError::InvalidOutput {
            tool: TOOL.to_string(),
            path: path.to_path_buf(),
            reason,
        })
    }
}

impl MediaProbe for FfprobeProbe {
    fn name(&self) -> &'static str {
        TOOL
    }

    fn probe(&self, path: &Path) -> Option<ProbeResult> {
        match self.try_probe(path) {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!(error = %e, "ffprobe failed");
                None
            }
        }
    }
}

/// Parse `ffprobe -show_streams -show_format` JSON output
pub fn parse_ffprobe_json(json: &str) -> Result<ProbeResult, String> {
    let data: Value = serde_json::from_str(json).map_err(|e| e.to_string())?;
    let streams = data["streams"]
        .as_array()
        .ok_or_else(|| "no streams array".to_string())?;

    let of_type = |kind: &str| {
        streams
            .iter()
            .find(|s| s["codec_type"].as_str() == Some(kind))
    };

    let video = of_type("video").ok_or_else(|| "no video stream".to_string())?;

    let mut result = ProbeResult {
        width: json_u64(&video["width"]).unwrap_or(0) as u32,
        height: json_u64(&video["height"]).unwrap_or(0) as u32,
        video_codec: video["codec_name"].as_str().unwrap_or_default().to_string(),
        hdr_format: video_hdr_format(video),
        ..ProbeResult::default()
    };

    if let Some(audio) = of_type("audio") {
        // "truehd" alone hides Atmos; the profile says "Dolby TrueHD + Dolby Atmos"
        let codec = audio["codec_name"].as_str().unwrap_or_default();
        result.audio_codec = match audio["profile"].as_str() {
            Some(profile) if !profile.is_empty() => format!("{codec} {profile}"),
            _ => codec.to_string(),
        };
        result.audio_channels = json_u64(&audio["channels"]).unwrap_or(0) as u32;
    }

    let format = &data["format"];
    result.bitrate_bps = json_u64(&format["bit_rate"])
        .or_else(|| json_u64(&video["bit_rate"]))
        .unwrap_or(0);
    result.duration_ms = json_seconds_to_ms(&format["duration"])
        .or_else(|| json_seconds_to_ms(&video["duration"]))
        .unwrap_or(0);
    result.container = format["format_long_name"]
        .as_str()
        .or_else(|| format["format_name"].as_str())
        .map(str::to_string);

    Ok(result)
}

fn video_hdr_format(video: &Value) -> Option<String> {
    if let Some(side_data) = video["side_data_list"].as_array() {
        let has = |needle: &str| {
            side_data.iter().any(|sd| {
                sd["side_data_type"]
                    .as_str()
                    .is_some_and(|t| t.contains(needle))
            })
        };
        if has("DOVI configuration record") {
            return Some("Dolby Vision".to_string());
        }
        if has("HDR Dynamic Metadata SMPTE2094-40") {
            return Some("HDR10+".to_string());
        }
    }

    match video["color_transfer"].as_str() {
        Some("smpte2084") => return Some("HDR10".to_string()),
        Some("arib-std-b67") => return Some("HLG".to_string()),
        _ => {}
    }

    match video["color_primaries"].as_str() {
        Some(p) if p.starts_with("bt2020") => Some("HDR".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_streams_and_format() {
        let json = r#"{
            "streams": [
                {"index": 0, "codec_type": "video", "codec_name": "hevc", "width": 3840, "height": 1608,
                 "color_transfer": "smpte2084", "color_primaries": "bt2020"},
                {"index": 1, "codec_type": "audio", "codec_name": "truehd",
                 "profile": "Dolby TrueHD + Dolby Atmos", "channels": 8}
            ],
            "format": {"format_name": "matroska,webm", "duration": "8520.500", "bit_rate": "61234567"}
        }"#;

        let result = parse_ffprobe_json(json).unwrap();
        assert_eq!(result.width, 3840);
        assert_eq!(result.height, 1608);
        assert_eq!(result.video_codec, "hevc");
        assert_eq!(result.audio_codec, "truehd Dolby TrueHD + Dolby Atmos");
        assert_eq!(result.audio_channels, 8);
        assert_eq!(result.bitrate_bps, 61_234_567);
        assert_eq!(result.duration_ms, 8_520_500);
        assert_eq!(result.hdr_format.as_deref(), Some("HDR10"));
        assert_eq!(result.container.as_deref(), Some("matroska,webm"));
    }

    #[test]
    fn dolby_vision_side_data_wins() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "codec_name": "hevc", "width": 3840, "height": 2160,
                 "color_transfer": "smpte2084",
                 "side_data_list": [{"side_data_type": "DOVI configuration record"}]}
            ],
            "format": {}
        }"#;
        let result = parse_ffprobe_json(json).unwrap();
        assert_eq!(result.hdr_format.as_deref(), Some("Dolby Vision"));
        assert_eq!(result.bitrate_bps, 0);
    }

    #[test]
    fn audio_only_file_is_rejected() {
        let json = r#"{"streams": [{"codec_type": "audio", "codec_name": "flac"}], "format": {}}"#;
        assert!(parse_ffprobe_json(json).is_err());
    }
}
