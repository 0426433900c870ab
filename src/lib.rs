//! # Media Library Cleaner
//!
//! A careful duplicate finder for movie and TV libraries that scores every
//! copy and explains which one to keep.
//!
//! ## Core Philosophy
//! - **Never auto-delete** - resolution produces a plan, nothing is touched
//! - **Show WHY** - every score comes with its itemized details and concerns
//! - **Confidence first** - stronger evidence (ids, hashes) wins over titles
//!
//! ## Architecture
//! The library is split into a core engine (GUI-agnostic) and presentation layers:
//! - `core` - Title normalization, quality scoring and duplicate matching
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - User-friendly error types
//! - `cli` - Command-line interface

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{MediaLibraryError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
/// `default_directive` is used when `RUST_LOG` is not set.
pub fn init_tracing(default_directive: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    // A subscriber may already be installed (tests, embedding apps)
    let _ = tracing::subscriber::set_global_default(subscriber);
}
