//! # Probe Module
//!
//! Technical stream information from an external tool.
//!
//! The release *source* (BluRay, WEB-DL) can never be probed, but resolution,
//! codecs, bitrate and HDR can. When no tool is installed, or a tool fails on
//! a file, callers get `None` and scoring falls back to the file name.
//!
//! ## Adapters
//! - [`MediaInfoProbe`] - `mediainfo --Output=JSON`
//! - [`FfprobeProbe`] - `ffprobe -print_format json -show_streams -show_format`

mod ffprobe;
mod mediainfo;

pub use ffprobe::{parse_ffprobe_json, FfprobeProbe};
pub use mediainfo::{parse_mediainfo_json, MediaInfoProbe};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;

use crate::error::ProbeError;

/// Stream facts reported by a probe tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub width: u32,
    pub height: u32,
    pub video_codec: String,
    pub audio_codec: String,
    pub audio_channels: u32,
    pub bitrate_bps: u64,
    pub duration_ms: u64,
    /// Raw HDR description from the tool, `None` for SDR
    pub hdr_format: Option<String>,
    /// Container format name, when the tool reports one
    pub container: Option<String>,
}

/// A technical probe over a single media file
pub trait MediaProbe: Send + Sync {
    /// Tool name for logs and reports
    fn name(&self) -> &'static str;

    /// Probe a file. `None` on any failure; failures are logged, never raised.
    fn probe(&self, path: &Path) -> Option<ProbeResult>;
}

/// Which probe tool to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProbeKind {
    /// MediaInfo if installed, else ffprobe, else none
    #[default]
    Auto,
    MediaInfo,
    Ffprobe,
    /// File-name analysis only
    None,
}

/// Resolve a probe tool. Availability is checked once here with a version call.
pub fn detect_probe(kind: ProbeKind) -> Option<Box<dyn MediaProbe>> {
    let probe: Option<Box<dyn MediaProbe>> = match kind {
        ProbeKind::None => None,
        ProbeKind::MediaInfo => MediaInfoProbe::detect().map(|p| Box::new(p) as Box<dyn MediaProbe>),
        ProbeKind::Ffprobe => FfprobeProbe::detect().map(|p| Box::new(p) as Box<dyn MediaProbe>),
        ProbeKind::Auto => MediaInfoProbe::detect()
            .map(|p| Box::new(p) as Box<dyn MediaProbe>)
            .or_else(|| FfprobeProbe::detect().map(|p| Box::new(p) as Box<dyn MediaProbe>)),
    };

    match &probe {
        Some(p) => tracing::info!(tool = p.name(), "probe tool available"),
        None if kind != ProbeKind::None => {
            tracing::warn!(?kind, "no probe tool found, scoring from file names only")
        }
        None => {}
    }

    probe
}

/// True when `tool <version_arg>` runs and exits successfully
pub(crate) fn tool_available(tool: &str, version_arg: &str) -> bool {
    Command::new(tool)
        .arg(version_arg)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Run a tool and return its stdout
pub(crate) fn run_tool(tool: &'static str, args: &[&str], path: &Path) -> Result<String, ProbeError> {
    let output = Command::new(tool)
        .args(args)
        .arg(path)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProbeError::ToolMissing {
                    tool: tool.to_string(),
                }
            } else {
                ProbeError::Failed {
                    tool: tool.to_string(),
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProbeError::Failed {
            tool: tool.to_string(),
            path: path.to_path_buf(),
            reason: format!("{}: {}", output.status, stderr.trim()),
        });
    }

    String::from_utf8(output.stdout).map_err(|_| ProbeError::InvalidOutput {
        tool: tool.to_string(),
        path: path.to_path_buf(),
        reason: "output is not UTF-8".to_string(),
    })
}

/// Read a JSON value that tools emit either as a number or as a numeric string
pub(crate) fn json_u64(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f as u64))
        }
        _ => None,
    }
}

/// Seconds (number or string, possibly fractional) to milliseconds
pub(crate) fn json_seconds_to_ms(value: &serde_json::Value) -> Option<u64> {
    let seconds = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (seconds >= 0.0).then(|| (seconds * 1000.0).round() as u64)
}
