//! # media-dedup CLI
//!
//! Command-line interface for the media library cleaner.
//!
//! ## Usage
//! ```bash
//! media-dedup scan /media/Movies --output json
//! media-dedup score "Heat (1995)/Heat.1995.1080p.BluRay.x264-SPARKS.mkv"
//! media-dedup normalize "The.Matrix.1999.2160p.UHD.BluRay.x265-TERMiNAL"
//! ```

mod cli;

use media_library_cleaner::Result;

fn main() -> Result<()> {
    cli::run()
}
