//! Pipeline execution implementation.

use crate::core::cache::{CacheBackend, CacheEntry, HashKey, InMemoryCache};
use crate::core::hasher::{PartialHasher, DEFAULT_SAMPLE_SIZE};
use crate::core::matcher::{
    find_duplicates_with_events, resolve, CandidateEntry, DuplicateGroup, ResolutionPlan,
    ResolutionStrategy,
};
use crate::core::metadata::{MetadataStore, NfoMetadataStore};
use crate::core::probe::{detect_probe, MediaProbe, ProbeKind};
use crate::core::quality::QualityScorer;
use crate::core::scanner::{LibraryScanner, MediaItem, ScanConfig, WalkDirScanner};
use crate::core::title::normalize;
use crate::error::{MediaLibraryError, ScanError};
use crate::events::{
    null_sender, AnalyzeEvent, Event, EventSender, PipelineEvent, PipelinePhase,
    PipelineSummary,
};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Worker cap when every item spawns an external probe process
pub const PROBE_WORKER_CAP: usize = 4;

/// Shared flag for stopping a running pipeline from another thread
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Result of pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    /// Every analyzed item, in scan order
    pub entries: Vec<CandidateEntry>,
    /// Duplicate groups, best copy first
    pub groups: Vec<DuplicateGroup>,
    /// One plan per group, same order
    pub plans: Vec<ResolutionPlan>,
    pub total_items: usize,
    pub cache_hits: usize,
    /// Items that got technical data from the probe tool
    pub probed: usize,
    /// Non-fatal errors
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

impl PipelineResult {
    pub fn duplicate_count(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::duplicate_count).sum()
    }

    pub fn potential_savings_bytes(&self) -> u64 {
        self.plans.iter().map(|p| p.reclaimable_bytes).sum()
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Library roots to scan
    pub paths: Vec<PathBuf>,
    pub scan_config: ScanConfig,
    /// Probe tool to detect when none is injected
    pub probe: ProbeKind,
    /// Analysis threads; `None` picks the default
    pub max_workers: Option<usize>,
    /// Hash window size at each end of a file
    pub sample_size: u64,
    /// Keep leading articles in titles
    pub strict_titles: bool,
    pub strategy: ResolutionStrategy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            scan_config: ScanConfig::default(),
            probe: ProbeKind::Auto,
            max_workers: None,
            sample_size: DEFAULT_SAMPLE_SIZE,
            strict_titles: false,
            strategy: ResolutionStrategy::Delete,
        }
    }
}

impl PipelineConfig {
    /// Configured worker count, or available parallelism capped at
    /// [`PROBE_WORKER_CAP`] when a probe tool is in use
    pub fn worker_count(&self, probing: bool) -> usize {
        if let Some(workers) = self.max_workers {
            return workers.max(1);
        }
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        if probing {
            available.min(PROBE_WORKER_CAP)
        } else {
            available
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    cache: Option<Box<dyn CacheBackend>>,
    probe: Option<Option<Box<dyn MediaProbe>>>,
    metadata: Option<Box<dyn MetadataStore>>,
    cancel: CancellationToken,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            cache: None,
            probe: None,
            metadata: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Library roots to scan
    pub fn paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.config.paths = paths;
        self
    }

    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan_config.include_hidden = include;
        self
    }

    /// Which probe tool to detect at build time
    pub fn probe(mut self, kind: ProbeKind) -> Self {
        self.config.probe = kind;
        self
    }

    /// Use this probe instead of detecting one; `None` forces file-name scoring
    pub fn probe_tool(mut self, probe: Option<Box<dyn MediaProbe>>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn metadata_store(mut self, store: Box<dyn MetadataStore>) -> Self {
        self.metadata = Some(store);
        self
    }

    pub fn cache(mut self, cache: Box<dyn CacheBackend>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn max_workers(mut self, workers: usize) -> Self {
        self.config.max_workers = Some(workers);
        self
    }

    pub fn sample_size(mut self, sample_size: u64) -> Self {
        self.config.sample_size = sample_size;
        self
    }

    pub fn strict_titles(mut self, strict: bool) -> Self {
        self.config.strict_titles = strict;
        self
    }

    pub fn strategy(mut self, strategy: ResolutionStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn build(self) -> Pipeline {
        let probe = match self.probe {
            Some(probe) => probe,
            None => detect_probe(self.config.probe),
        };
        Pipeline {
            config: self.config,
            cache: self.cache.unwrap_or_else(|| Box::new(InMemoryCache::new())),
            probe,
            metadata: self
                .metadata
                .unwrap_or_else(|| Box::new(NfoMetadataStore::new())),
            cancel: self.cancel,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of analyzing one item
struct Analysis {
    entry: CandidateEntry,
    cache_hit: bool,
    probed: bool,
    fresh_hash: Option<CacheEntry>,
}

/// The duplicate detection pipeline
pub struct Pipeline {
    config: PipelineConfig,
    cache: Box<dyn CacheBackend>,
    probe: Option<Box<dyn MediaProbe>>,
    metadata: Box<dyn MetadataStore>,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Name of the probe tool in use, if any
    pub fn probe_name(&self) -> Option<&'static str> {
        self.probe.as_ref().map(|p| p.name())
    }

    /// Token that cancels this pipeline
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn run(&self) -> crate::Result<PipelineResult> {
        self.run_with_events(&null_sender())
    }

    fn cancelled(&self, events: &EventSender) -> crate::Result<()> {
        if self.cancel.is_cancelled() {
            tracing::info!("pipeline cancelled");
            events.send(Event::Pipeline(PipelineEvent::Cancelled));
            return Err(ScanError::Cancelled.into());
        }
        Ok(())
    }

    /// Scan, analyze every item in parallel, then match once over the full list
    pub fn run_with_events(&self, events: &EventSender) -> crate::Result<PipelineResult> {
        let start_time = Instant::now();

        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: Scanning
        events.phase(PipelinePhase::Scanning);

        let scanner = WalkDirScanner::new(self.config.scan_config.clone());
        let scan_result = scanner.scan_with_events(&self.config.paths, events)?;
        let mut errors: Vec<String> = scan_result.errors.iter().map(|e| e.to_string()).collect();
        let items = scan_result.items;
        let total_items = items.len();

        self.cancelled(events)?;

        // Phase 2: Analyzing
        events.phase(PipelinePhase::Analyzing);
        events.send(Event::Analyze(AnalyzeEvent::Started { total_items }));

        let workers = self.config.worker_count(self.probe.is_some());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| MediaLibraryError::Config(format!("thread pool: {e}")))?;
        tracing::debug!(workers, probe = ?self.probe_name(), "analyzing items");

        let hasher = PartialHasher::with_sample_size(self.config.sample_size);
        let scorer = QualityScorer::new();
        let completed = AtomicUsize::new(0);

        let analyses: Vec<Option<Analysis>> = pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    if self.cancel.is_cancelled() {
                        return None;
                    }
                    let analysis = self.analyze(item, &scorer, &hasher, events);
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    events.item_analyzed(done, total_items, &item.path);
                    Some(analysis)
                })
                .collect()
        });

        self.cancelled(events)?;

        let mut entries = Vec::with_capacity(total_items);
        let mut fresh = Vec::new();
        let mut cache_hits = 0;
        let mut probed = 0;
        for analysis in analyses.into_iter().flatten() {
            cache_hits += usize::from(analysis.cache_hit);
            probed += usize::from(analysis.probed);
            fresh.extend(analysis.fresh_hash);
            entries.push(analysis.entry);
        }

        if let Err(e) = self.cache.set_batch(&fresh) {
            tracing::warn!(error = %e, "could not store hashes in cache");
            errors.push(e.to_string());
        }

        events.send(Event::Analyze(AnalyzeEvent::Completed {
            total_analyzed: entries.len(),
            cache_hits,
            probed,
        }));

        // Phase 3: Matching
        events.phase(PipelinePhase::Matching);

        let groups = find_duplicates_with_events(&entries, events);
        let plans: Vec<ResolutionPlan> = groups
            .iter()
            .filter_map(|group| resolve(group, &self.config.strategy))
            .collect();

        let duration_ms = start_time.elapsed().as_millis() as u64;
        let result = PipelineResult {
            entries,
            groups,
            plans,
            total_items,
            cache_hits,
            probed,
            errors,
            duration_ms,
        };

        tracing::info!(
            items = total_items,
            groups = result.groups.len(),
            cache_hits,
            duration_ms,
            "pipeline complete"
        );

        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: PipelineSummary {
                total_items,
                duplicate_groups: result.groups.len(),
                duplicate_count: result.duplicate_count(),
                potential_savings_bytes: result.potential_savings_bytes(),
                duration_ms,
            },
        }));

        Ok(result)
    }

    /// Normalize, probe, score, hash and read the sidecar for one item
    fn analyze(
        &self,
        item: &MediaItem,
        scorer: &QualityScorer,
        hasher: &PartialHasher,
        events: &EventSender,
    ) -> Analysis {
        let video = &item.video_file;

        let probe_result = self.probe.as_ref().and_then(|p| p.probe(video));
        if self.probe.is_some() && probe_result.is_none() {
            events.send(Event::Analyze(AnalyzeEvent::ProbeFallback {
                path: video.clone(),
            }));
        }

        let release_info = (!item.is_loose_file()).then_some(item.display_name.as_str());
        let quality = scorer.score(
            item.video_file_name(),
            probe_result.as_ref(),
            Some(item.size),
            release_info,
        );

        let (file_hash, cache_hit, fresh_hash) = self.hash(item, hasher, events);

        let sidecar = self.metadata.read(video).or_else(|| {
            if item.is_loose_file() {
                None
            } else {
                self.metadata.read(&item.path)
            }
        });

        let title = normalize(&item.display_name, self.config.strict_titles);

        Analysis {
            entry: CandidateEntry::from_analysis(
                item.path.clone(),
                item.display_name.clone(),
                quality,
                file_hash,
                title,
                sidecar.as_ref(),
            ),
            cache_hit,
            probed: probe_result.is_some(),
            fresh_hash,
        }
    }

    fn hash(
        &self,
        item: &MediaItem,
        hasher: &PartialHasher,
        events: &EventSender,
    ) -> (Option<String>, bool, Option<CacheEntry>) {
        let video = &item.video_file;
        let key = HashKey {
            path: video,
            file_size: item.size,
            file_modified: item.modified,
            sample_size: hasher.sample_size(),
        };

        match self.cache.get(&key) {
            Ok(Some(entry)) => {
                events.send(Event::Analyze(AnalyzeEvent::CacheHit {
                    path: video.clone(),
                }));
                return (Some(entry.hash), true, None);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(path = %video.display(), error = %e, "cache lookup failed"),
        }

        match hasher.hash_file(video) {
            Some(hash) => {
                let fresh = key.entry(hash.clone());
                (Some(hash), false, Some(fresh))
            }
            None => (None, false, None),
        }
    }
}
