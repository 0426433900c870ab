//! Export functionality for duplicate reports.
//!
//! CSV for spreadsheets and JSON for scripts. The library inventory (every
//! scanned item, duplicate or not) can be exported as CSV too.

use super::LibraryReport;
use crate::core::matcher::CandidateEntry;
use crate::error::ReportError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Format implied by the file extension; anything but `.json` is CSV
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }
}

/// Quote a CSV field when it contains a delimiter, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row<W: Write>(writer: &mut W, fields: &[String]) -> std::io::Result<()> {
    let line: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
    writeln!(writer, "{}", line.join(","))
}

fn size_mb(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / (1024.0 * 1024.0))
}

/// One row per group member.
///
/// Columns: Group ID, Confidence, Match, Action, Path, Score, Resolution,
/// Video Codec, Audio Codec, Source, HDR, Size (MB), Data Source, Concerns
pub fn export_csv<W: Write>(report: &LibraryReport, mut writer: W) -> std::io::Result<()> {
    writeln!(
        writer,
        "Group ID,Confidence,Match,Action,Path,Score,Resolution,Video Codec,Audio Codec,Source,HDR,Size (MB),Data Source,Concerns"
    )?;

    for group in &report.groups {
        for (index, member) in group.members.iter().enumerate() {
            let action = if index == 0 {
                "keep".to_string()
            } else {
                group
                    .actions
                    .get(index - 1)
                    .and_then(|a| a.split_whitespace().next())
                    .unwrap_or("remove")
                    .to_string()
            };

            csv_row(
                &mut writer,
                &[
                    group.group_id.clone(),
                    group.confidence.to_string(),
                    group.match_types.join(" + "),
                    action,
                    member.path.display().to_string(),
                    member.score.to_string(),
                    member.resolution.clone(),
                    member.video_codec.clone(),
                    member.audio_codec.clone(),
                    member.source.clone(),
                    member.hdr_format.clone().unwrap_or_default(),
                    size_mb(member.file_size_bytes),
                    member.data_source.clone(),
                    member.concerns.join("; "),
                ],
            )?;
        }
    }

    Ok(())
}

/// One row per scanned item
pub fn export_inventory_csv<W: Write>(
    entries: &[CandidateEntry],
    mut writer: W,
) -> std::io::Result<()> {
    writeln!(
        writer,
        "Title,Year,Name,Size (MB),Resolution,Video Codec,Audio Codec,Source,Score,HDR,Bitrate (Mbps),Path,Data Source"
    )?;

    for entry in entries {
        let q = &entry.quality;
        let bitrate = if q.bitrate_bps > 0 {
            format!("{:.1}", q.bitrate_bps as f64 / 1_000_000.0)
        } else {
            String::new()
        };
        csv_row(
            &mut writer,
            &[
                entry.normalized_title.clone(),
                entry.year.clone().unwrap_or_default(),
                entry.name().to_string(),
                size_mb(entry.file_size_bytes),
                q.resolution.to_string(),
                q.video_codec.clone(),
                q.audio_codec.clone(),
                q.source.to_string(),
                q.score.to_string(),
                q.hdr_format.map(|h| h.to_string()).unwrap_or_default(),
                bitrate,
                entry.path.display().to_string(),
                q.data_source.to_string(),
            ],
        )?;
    }

    Ok(())
}

/// Pretty-printed JSON of the whole report
pub fn export_json<W: Write>(report: &LibraryReport, writer: W) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(writer, report)
        .map_err(|e| ReportError::Serialization(e.to_string()))
}

/// Write the report to a file in the given format
pub fn write_report(
    report: &LibraryReport,
    path: &Path,
    format: ExportFormat,
) -> Result<(), ReportError> {
    let write_error = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);

    match format {
        ExportFormat::Csv => export_csv(report, &mut writer).map_err(write_error)?,
        ExportFormat::Json => export_json(report, &mut writer)?,
    }
    writer.flush().map_err(write_error)?;

    tracing::info!(path = %path.display(), groups = report.groups.len(), "report written");
    Ok(())
}
