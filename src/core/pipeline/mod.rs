//! # Pipeline Module
//!
//! Orchestrates a full library pass.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Discover movie folders and loose videos
//! 2. **Analyze** - Normalize, probe, score, hash (cached) and read sidecars
//! 3. **Match** - Run the duplicate cascade once over every entry
//! 4. **Resolve** - Plan what to keep for each group
//!
//! ## Parallelism
//! Analysis runs on a bounded rayon pool; matching is single-threaded.

mod executor;

pub use executor::{
    CancellationToken, Pipeline, PipelineBuilder, PipelineConfig, PipelineResult,
    PROBE_WORKER_CAP,
};
