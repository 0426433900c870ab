//! # CLI Module
//!
//! Command-line interface for the media library cleaner.
//!
//! ## Usage
//! ```bash
//! # Find duplicate movies
//! media-dedup scan /media/Movies
//!
//! # Plan moves instead of deletes, export the groups
//! media-dedup scan /media/Movies --move-to /media/Review --export-csv dupes.csv
//!
//! # Score a single file
//! media-dedup score "Movie.2020.1080p.BluRay.x265-GROUP.mkv"
//!
//! # See how names normalize
//! media-dedup normalize "The.Thing.1982.1080p.BluRay.x264-GROUP"
//!
//! # Codec breakdown
//! media-dedup codecs /media/Movies --output json
//!
//! # Audit for empty folders, stray files and naming problems
//! media-dedup health /media/Movies
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use media_library_cleaner::core::cache::{default_cache_path, CacheBackend, InMemoryCache, SqliteCache};
use media_library_cleaner::core::health::{health_check, HealthOptions, HealthReport};
use media_library_cleaner::core::matcher::{Confidence, ResolutionStrategy};
use media_library_cleaner::core::pipeline::{Pipeline, PipelineResult};
use media_library_cleaner::core::probe::{detect_probe, ProbeKind};
use media_library_cleaner::core::quality::{DataSource, QualityProfile, QualityScorer};
use media_library_cleaner::core::reporter::{
    export_inventory_csv, export_json, write_report, ExportFormat, GroupReport, LibraryReport,
};
use media_library_cleaner::core::scanner::ScanConfig;
use media_library_cleaner::core::stats::{analyze_codecs, CountEntry, LibraryStats};
use media_library_cleaner::core::title::normalize;
use media_library_cleaner::error::{ReportError, Result};
use media_library_cleaner::events::{AnalyzeEvent, Event, EventChannel, PipelineEvent, ScanEvent};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::thread;

/// Media Library Cleaner - find duplicate movies and keep the best copy
#[derive(Parser, Debug)]
#[command(name = "media-dedup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug logging, score details)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan libraries for duplicate movies
    Scan {
        /// Library roots to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Probe tool for technical data
        #[arg(short, long, default_value = "auto")]
        probe: ProbeArg,

        /// Cache database path
        #[arg(long, conflicts_with = "no_cache")]
        cache: Option<PathBuf>,

        /// Do not read or write the hash cache
        #[arg(long)]
        no_cache: bool,

        /// Analysis threads
        #[arg(short, long)]
        workers: Option<usize>,

        /// Plan moves into this directory instead of deletes
        #[arg(long)]
        move_to: Option<PathBuf>,

        /// Write the duplicate groups to a CSV file
        #[arg(long)]
        export_csv: Option<PathBuf>,

        /// Write every scanned item to a CSV file
        #[arg(long)]
        export_inventory: Option<PathBuf>,

        /// Include hidden files and folders
        #[arg(long)]
        include_hidden: bool,

        /// Keep leading articles when comparing titles
        #[arg(long)]
        strict: bool,
    },

    /// Score a single video file
    Score {
        file: PathBuf,

        #[arg(short, long, default_value = "auto")]
        probe: ProbeArg,

        /// Extra release text, such as the folder name
        #[arg(long)]
        release_info: Option<String>,

        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Show how release names normalize
    Normalize {
        #[arg(required = true)]
        names: Vec<String>,

        /// Keep leading articles
        #[arg(long)]
        strict: bool,
    },

    /// Break a library down by resolution, codec and container
    Codecs {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[arg(short, long, default_value = "none")]
        probe: ProbeArg,

        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        #[arg(long)]
        include_hidden: bool,
    },

    /// Audit a library for empty folders, stray files and naming problems
    Health {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Library holds series, so folder names need no year
        #[arg(long)]
        series: bool,

        #[arg(long)]
        include_hidden: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProbeArg {
    /// MediaInfo, then ffprobe, then file names only
    Auto,
    Mediainfo,
    Ffprobe,
    /// File names only
    None,
}

impl From<ProbeArg> for ProbeKind {
    fn from(arg: ProbeArg) -> Self {
        match arg {
            ProbeArg::Auto => ProbeKind::Auto,
            ProbeArg::Mediainfo => ProbeKind::MediaInfo,
            ProbeArg::Ffprobe => ProbeKind::Ffprobe,
            ProbeArg::None => ProbeKind::None,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    media_library_cleaner::init_tracing(if cli.verbose { "debug" } else { "warn" });

    match cli.command {
        Commands::Scan {
            paths,
            output,
            probe,
            cache,
            no_cache,
            workers,
            move_to,
            export_csv,
            export_inventory,
            include_hidden,
            strict,
        } => run_scan(ScanArgs {
            paths,
            output,
            probe: probe.into(),
            cache,
            no_cache,
            workers,
            move_to,
            export_csv,
            export_inventory,
            include_hidden,
            strict,
            verbose: cli.verbose,
        }),
        Commands::Score {
            file,
            probe,
            release_info,
            output,
        } => run_score(&file, probe.into(), release_info.as_deref(), output, cli.verbose),
        Commands::Normalize { names, strict } => {
            run_normalize(&names, strict);
            Ok(())
        }
        Commands::Codecs {
            paths,
            probe,
            output,
            include_hidden,
        } => run_codecs(&paths, probe.into(), output, include_hidden),
        Commands::Health {
            paths,
            output,
            series,
            include_hidden,
        } => run_health(&paths, output, series, include_hidden),
    }
}

struct ScanArgs {
    paths: Vec<PathBuf>,
    output: OutputFormat,
    probe: ProbeKind,
    cache: Option<PathBuf>,
    no_cache: bool,
    workers: Option<usize>,
    move_to: Option<PathBuf>,
    export_csv: Option<PathBuf>,
    export_inventory: Option<PathBuf>,
    include_hidden: bool,
    strict: bool,
    verbose: bool,
}

fn open_cache(no_cache: bool, path: Option<PathBuf>) -> Result<Box<dyn CacheBackend>> {
    if no_cache {
        return Ok(Box::new(InMemoryCache::new()));
    }
    match path.or_else(default_cache_path) {
        Some(path) => Ok(Box::new(SqliteCache::open(&path)?)),
        None => {
            tracing::warn!("no cache directory on this platform, hashes will not persist");
            Ok(Box::new(InMemoryCache::new()))
        }
    }
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb
}

fn run_scan(args: ScanArgs) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(args.output, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Media Library Cleaner").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let mut builder = Pipeline::builder()
        .paths(args.paths.clone())
        .scan_config(ScanConfig {
            include_hidden: args.include_hidden,
            ..ScanConfig::default()
        })
        .probe(args.probe)
        .strict_titles(args.strict)
        .cache(open_cache(args.no_cache, args.cache)?);

    if let Some(workers) = args.workers {
        builder = builder.max_workers(workers);
    }
    if let Some(dir) = args.move_to {
        builder = builder.strategy(ResolutionStrategy::MoveTo(dir));
    }

    let pipeline = builder.build();

    if pretty {
        let tool = pipeline.probe_name().unwrap_or("file names only");
        term.write_line(&format!("  {} {}", style("Probe:").dim(), tool)).ok();
    }

    let (sender, receiver) = EventChannel::new();
    let progress = pretty.then(progress_bar);
    let progress_clone = progress.clone();
    let verbose = args.verbose;

    let event_thread = thread::spawn(move || {
        let Some(pb) = progress_clone else {
            // Drain so senders never block
            for _ in receiver.iter() {}
            return;
        };
        let mut cache_hits = 0;
        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(phase.to_string());
                }
                Event::Scan(ScanEvent::Completed { total_items }) => {
                    pb.set_length(total_items as u64);
                }
                Event::Analyze(AnalyzeEvent::CacheHit { .. }) => cache_hits += 1,
                Event::Analyze(AnalyzeEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(format!(
                            "{} (cache: {cache_hits})",
                            p.current_path.file_name().unwrap_or_default().to_string_lossy()
                        ));
                    }
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Pipeline(PipelineEvent::Cancelled) => pb.finish_and_clear(),
                _ => {}
            }
        }
    });

    let result = pipeline.run_with_events(&sender);

    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let result = result?;

    let report = LibraryReport::from_result(&result);

    if let Some(path) = &args.export_csv {
        write_report(&report, path, ExportFormat::Csv)?;
    }
    if let Some(path) = &args.export_inventory {
        write_inventory(&result, path)?;
    }

    match args.output {
        OutputFormat::Pretty => print_pretty_results(&term, &result, &report, args.verbose),
        OutputFormat::Json => export_json(&report, std::io::stdout().lock())?,
        OutputFormat::Minimal => print_minimal_results(&result),
    }

    Ok(())
}

fn write_inventory(result: &PipelineResult, path: &Path) -> Result<()> {
    let write_error = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(write_error)?;
    export_inventory_csv(&result.entries, BufWriter::new(file)).map_err(write_error)?;
    Ok(())
}

fn display_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(rest) = path.strip_prefix(&home) {
            return format!("~/{}", rest.display());
        }
    }
    path.display().to_string()
}

fn confidence_label(confidence: Confidence) -> String {
    match confidence {
        Confidence::High => style("High").green().to_string(),
        Confidence::Medium => style("Medium").yellow().to_string(),
        Confidence::Low => style("Low").red().to_string(),
    }
}

fn print_group(term: &Term, index: usize, group: &GroupReport, verbose: bool) {
    term.write_line(&format!(
        "  {} {} [{}] ({} copies, {} reclaimable)",
        style(format!("Group {}:", index + 1)).bold(),
        style(group.match_types.join(" + ")).yellow(),
        confidence_label(group.confidence),
        group.members.len(),
        format_bytes(group.reclaimable_bytes)
    ))
    .ok();

    for (i, member) in group.members.iter().enumerate() {
        let marker = if i == 0 {
            style("★").green().to_string()
        } else {
            style("○").dim().to_string()
        };
        term.write_line(&format!(
            "    {} {}  {} {} {} {}",
            marker,
            display_path(&member.path),
            style(format!("score {}", member.score)).cyan(),
            member.resolution,
            member.source,
            style(format_bytes(member.file_size_bytes)).dim()
        ))
        .ok();

        if verbose {
            for detail in &member.details {
                term.write_line(&format!("        {}", style(detail).dim())).ok();
            }
        }
        for concern in &member.concerns {
            term.write_line(&format!("        {} {}", style("!").red(), concern)).ok();
        }
    }

    term.write_line(&format!(
        "    {} {}",
        style("Keep:").dim(),
        style(group.keep_reason).dim()
    ))
    .ok();
    if group.needs_review {
        term.write_line(&format!(
            "    {}",
            style("Needs review: matched by title only").red()
        ))
        .ok();
    }
    if verbose {
        for action in &group.actions {
            term.write_line(&format!("    {} {}", style("Plan:").dim(), action)).ok();
        }
    }
    term.write_line("").ok();
}

fn print_pretty_results(term: &Term, result: &PipelineResult, report: &LibraryReport, verbose: bool) {
    term.write_line("").ok();
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold())).ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} items scanned in {:.1}s",
        style(result.total_items).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} duplicate groups found",
        style(result.groups.len()).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} redundant copies",
        style(report.duplicate_count).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} potential space savings",
        style(format_bytes(report.potential_savings_bytes)).yellow()
    ))
    .ok();

    if result.cache_hits > 0 {
        term.write_line(&format!("  {} cache hits", style(result.cache_hits).dim())).ok();
    }
    if !result.errors.is_empty() {
        term.write_line(&format!(
            "  {} errors (run with --verbose for details)",
            style(result.errors.len()).red()
        ))
        .ok();
        if verbose {
            for error in &result.errors {
                term.write_line(&format!("    {}", style(error).red())).ok();
            }
        }
    }
    term.write_line("").ok();

    if report.groups.is_empty() {
        term.write_line(&format!("  {}", style("No duplicates found!").green())).ok();
    } else {
        term.write_line(&format!("{}", style("Duplicate Groups:").bold().underlined())).ok();
        term.write_line("").ok();
        for (i, group) in report.groups.iter().enumerate() {
            print_group(term, i, group, verbose);
        }
    }

    term.write_line(&format!(
        "{}",
        style("Remember: No files were deleted or moved. Review carefully before taking action.")
            .dim()
    ))
    .ok();
}

/// Paths of every copy the plans would remove, one per line
fn print_minimal_results(result: &PipelineResult) {
    for plan in &result.plans {
        for action in &plan.actions {
            println!("{}", action.path.display());
        }
    }
}

fn run_score(
    file: &Path,
    probe: ProbeKind,
    release_info: Option<&str>,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let probe = detect_probe(probe);
    let probed = probe.as_ref().and_then(|p| p.probe(file));
    let size = std::fs::metadata(file).ok().map(|m| m.len());
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let profile = QualityScorer::new().score(&name, probed.as_ref(), size, release_info);

    match output {
        OutputFormat::Pretty => print_profile(&Term::stdout(), &name, &profile, verbose),
        OutputFormat::Json => print_json(&profile)?,
        OutputFormat::Minimal => println!("{}", profile.score),
    }
    Ok(())
}

fn print_profile(term: &Term, name: &str, profile: &QualityProfile, verbose: bool) {
    term.write_line(&format!("{}", style(name).bold())).ok();
    term.write_line(&format!(
        "  {} {}",
        style("Score:").dim(),
        style(profile.score).cyan().bold()
    ))
    .ok();
    term.write_line(&format!(
        "  {} {} | {} | {} | {}",
        style("Quality:").dim(),
        profile.resolution,
        profile.source,
        profile.video_codec,
        profile.audio_codec
    ))
    .ok();
    if let Some(hdr) = profile.hdr_format {
        term.write_line(&format!("  {} {}", style("HDR:").dim(), hdr)).ok();
    }
    term.write_line(&format!("  {} {}", style("Data:").dim(), profile.data_source)).ok();
    if profile.file_size_bytes > 0 {
        term.write_line(&format!(
            "  {} {}",
            style("Size:").dim(),
            format_bytes(profile.file_size_bytes)
        ))
        .ok();
    }

    if verbose || profile.data_source == DataSource::FilenameOnly {
        for detail in &profile.details {
            term.write_line(&format!("    {}", style(detail).dim())).ok();
        }
    }
    for concern in &profile.concerns {
        term.write_line(&format!("  {} {}", style("!").red(), concern)).ok();
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ReportError::Serialization(e.to_string()))?;
    println!("{text}");
    Ok(())
}

fn run_normalize(names: &[String], strict: bool) {
    for name in names {
        let title = normalize(name, strict);
        match title.year {
            Some(year) => println!("{} ({year})", title.normalized_title),
            None => println!("{}", title.normalized_title),
        }
    }
}

fn run_codecs(
    paths: &[PathBuf],
    probe: ProbeKind,
    output: OutputFormat,
    include_hidden: bool,
) -> Result<()> {
    let probe = detect_probe(probe);
    let config = ScanConfig {
        include_hidden,
        ..ScanConfig::default()
    };
    let (stats, errors) = analyze_codecs(paths, &config, probe.as_deref());
    for error in &errors {
        tracing::warn!(error = %error, "codec scan error");
    }

    match output {
        OutputFormat::Pretty => print_stats(&Term::stdout(), &stats),
        OutputFormat::Json => print_json(&stats)?,
        OutputFormat::Minimal => {
            for candidate in &stats.transcode_candidates {
                println!("{}", candidate.path.display());
            }
        }
    }
    Ok(())
}

fn print_breakdown(term: &Term, title: &str, entries: &[CountEntry]) {
    term.write_line(&format!("{}", style(title).bold().underlined())).ok();
    for entry in entries {
        term.write_line(&format!(
            "  {}: {} ({}%)",
            entry.label, entry.count, entry.percent
        ))
        .ok();
    }
    term.write_line("").ok();
}

fn print_stats(term: &Term, stats: &LibraryStats) {
    term.write_line(&format!(
        "{} files, {}",
        style(stats.total_files).cyan(),
        format_bytes(stats.total_size_bytes)
    ))
    .ok();
    term.write_line("").ok();

    print_breakdown(term, "By Resolution", &stats.by_resolution);
    print_breakdown(term, "By Video Codec", &stats.by_codec);
    print_breakdown(term, "By Container", &stats.by_container);

    if stats.transcode_candidates.is_empty() {
        term.write_line(&format!(
            "{}",
            style("No files require transcoding for compatibility.").green()
        ))
        .ok();
        return;
    }

    term.write_line(&format!(
        "{} {} file(s) may benefit from transcoding:",
        style("Transcode queue:").yellow().bold(),
        stats.transcode_candidates.len()
    ))
    .ok();
    for candidate in stats.transcode_candidates.iter().take(10) {
        term.write_line(&format!("  {}", display_path(&candidate.path))).ok();
        term.write_line(&format!(
            "    {} | {} | {} | {}: {}",
            format_bytes(candidate.size_bytes),
            candidate.resolution,
            candidate.codec,
            candidate.mode,
            candidate.reason
        ))
        .ok();
    }
    if stats.transcode_candidates.len() > 10 {
        term.write_line(&format!(
            "  {}",
            style(format!("... and {} more", stats.transcode_candidates.len() - 10)).dim()
        ))
        .ok();
    }
}

fn run_health(
    paths: &[PathBuf],
    output: OutputFormat,
    series: bool,
    include_hidden: bool,
) -> Result<()> {
    let config = ScanConfig {
        include_hidden,
        ..ScanConfig::default()
    };
    let options = HealthOptions {
        expect_year: !series,
    };
    let (report, errors) = health_check(paths, &config, options);
    for error in &errors {
        tracing::warn!(error = %error, "health check error");
    }

    match output {
        OutputFormat::Pretty => print_health(&Term::stdout(), &report),
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Minimal => {
            for path in health_paths(&report) {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}

/// Every flagged path, category by category
fn health_paths(report: &HealthReport) -> Vec<&Path> {
    report
        .empty_folders
        .iter()
        .chain(&report.no_video_folders)
        .chain(&report.zero_byte_files)
        .map(PathBuf::as_path)
        .chain(report.small_videos.iter().map(|v| v.path.as_path()))
        .chain(report.naming_issues.iter().map(|n| n.path.as_path()))
        .collect()
}

fn print_health_section(term: &Term, title: &str, lines: Vec<String>) {
    if lines.is_empty() {
        return;
    }
    term.write_line(&format!(
        "{} ({})",
        style(title).yellow().bold(),
        lines.len()
    ))
    .ok();
    for line in lines.iter().take(10) {
        term.write_line(&format!("  {line}")).ok();
    }
    if lines.len() > 10 {
        term.write_line(&format!(
            "  {}",
            style(format!("... and {} more", lines.len() - 10)).dim()
        ))
        .ok();
    }
    term.write_line("").ok();
}

fn paths(list: &[PathBuf]) -> Vec<String> {
    list.iter().map(|p| display_path(p)).collect()
}

fn print_health(term: &Term, report: &HealthReport) {
    if report.is_healthy() {
        term.write_line(&format!("{}", style("Library is healthy!").green().bold()))
            .ok();
        return;
    }

    print_health_section(term, "Empty folders", paths(&report.empty_folders));
    print_health_section(term, "Folders without video", paths(&report.no_video_folders));
    print_health_section(term, "Zero-byte files", paths(&report.zero_byte_files));
    print_health_section(
        term,
        "Small videos",
        report
            .small_videos
            .iter()
            .map(|v| format!("{} ({})", display_path(&v.path), format_bytes(v.size_bytes)))
            .collect(),
    );
    print_health_section(
        term,
        "Naming issues",
        report
            .naming_issues
            .iter()
            .map(|n| format!("{}: {}", display_path(&n.path), n.issue))
            .collect(),
    );

    term.write_line(&format!(
        "{} {}",
        style("Total issues:").bold(),
        style(report.total_issues()).yellow()
    ))
    .ok();
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scan_flags_parse() {
        let cli = Cli::try_parse_from([
            "media-dedup",
            "scan",
            "/movies",
            "--probe",
            "none",
            "--no-cache",
            "--workers",
            "2",
            "--move-to",
            "/review",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Scan {
                no_cache,
                workers,
                move_to,
                ..
            } => {
                assert!(no_cache);
                assert_eq!(workers, Some(2));
                assert_eq!(move_to, Some(PathBuf::from("/review")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cache_and_no_cache_conflict() {
        let parsed = Cli::try_parse_from([
            "media-dedup",
            "scan",
            "/movies",
            "--cache",
            "/tmp/h.db",
            "--no-cache",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn health_flags_parse() {
        let cli = Cli::try_parse_from([
            "media-dedup",
            "health",
            "/movies",
            "/more",
            "--series",
            "--output",
            "minimal",
        ])
        .unwrap();
        match cli.command {
            Commands::Health {
                paths,
                series,
                include_hidden,
                output,
            } => {
                assert_eq!(paths.len(), 2);
                assert!(series);
                assert!(!include_hidden);
                assert!(matches!(output, OutputFormat::Minimal));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["media-dedup", "health"]).is_err());
    }

    #[test]
    fn health_paths_cover_every_category() {
        use media_library_cleaner::core::health::{NamingIssue, NamingProblem, SmallVideo};

        let report = HealthReport {
            empty_folders: vec![PathBuf::from("/m/Empty")],
            no_video_folders: vec![PathBuf::from("/m/Empty")],
            zero_byte_files: vec![PathBuf::from("/m/A/x.nfo")],
            small_videos: vec![SmallVideo {
                path: PathBuf::from("/m/B/b.mkv"),
                size_bytes: 10,
            }],
            naming_issues: vec![NamingProblem {
                path: PathBuf::from("/m/C.D.E"),
                issue: NamingIssue::DottedName,
            }],
        };
        assert_eq!(health_paths(&report).len(), report.total_issues());
        assert_eq!(health_paths(&report)[3], Path::new("/m/B/b.mkv"));
    }

    #[test]
    fn format_bytes_handles_all_sizes() {
        assert_eq!(format_bytes(512), "512 bytes");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
