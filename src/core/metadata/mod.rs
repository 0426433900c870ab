//! # Metadata Module
//!
//! Reads existing sidecar metadata so matching can use real identifiers.
//!
//! ## Supported Sidecars
//! - Kodi-style `.nfo` XML with a `<movie>`, `<tvshow>` or `<episodedetails>`
//!   root: `<uniqueid type="imdb|tmdb">`, legacy `<imdbid>`, `<tmdbid>` and
//!   `<id>`, plus `<title>`, `<year>` and `<premiered>`
//! - Scene-style text `.nfo` files that only carry an IMDb or TMDB link
//!
//! A missing or unreadable sidecar is not an error for the caller; it simply
//! contributes nothing.

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::core::title::is_valid_year;
use crate::error::MetadataError;

/// Identifiers and title facts from a sidecar file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidecarMetadata {
    /// IMDb-style id (`tt0113277`)
    pub external_id_primary: Option<String>,
    /// TMDB-style numeric id
    pub external_id_secondary: Option<String>,
    pub title: Option<String>,
    pub year: Option<String>,
}

impl SidecarMetadata {
    pub fn is_empty(&self) -> bool {
        self.external_id_primary.is_none()
            && self.external_id_secondary.is_none()
            && self.title.is_none()
            && self.year.is_none()
    }
}

/// Source of sidecar metadata for a media item
pub trait MetadataStore: Send + Sync {
    /// Metadata for a video file or its folder, `None` when there is none
    fn read(&self, path: &Path) -> Option<SidecarMetadata>;
}

/// Reads `.nfo` sidecars next to the media
#[derive(Debug, Clone, Default)]
pub struct NfoMetadataStore;

impl NfoMetadataStore {
    pub fn new() -> Self {
        Self
    }

    /// Locate the sidecar for a path.
    ///
    /// For a file: `<stem>.nfo` beside it, then `movie.nfo` in its folder.
    /// For a folder: `movie.nfo`, then the first `.nfo` by name.
    pub fn find_sidecar(path: &Path) -> Option<PathBuf> {
        if path.is_dir() {
            let movie_nfo = path.join("movie.nfo");
            if movie_nfo.is_file() {
                return Some(movie_nfo);
            }
            let mut nfos: Vec<PathBuf> = fs::read_dir(path)
                .ok()?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && has_nfo_extension(p))
                .collect();
            nfos.sort();
            return nfos.into_iter().next();
        }

        let beside = path.with_extension("nfo");
        if beside.is_file() {
            return Some(beside);
        }

        let movie_nfo = path.parent()?.join("movie.nfo");
        movie_nfo.is_file().then_some(movie_nfo)
    }

    /// Read and parse one `.nfo` file
    pub fn read_file(nfo: &Path) -> Result<SidecarMetadata, MetadataError> {
        let bytes = fs::read(nfo).map_err(|source| MetadataError::Io {
            path: nfo.to_path_buf(),
            source,
        })?;
        let content = String::from_utf8_lossy(&bytes);

        parse_nfo(&content).ok_or_else(|| MetadataError::Malformed {
            path: nfo.to_path_buf(),
            reason: "no recognizable title or identifier".to_string(),
        })
    }
}

impl MetadataStore for NfoMetadataStore {
    fn read(&self, path: &Path) -> Option<SidecarMetadata> {
        let nfo = Self::find_sidecar(path)?;
        match Self::read_file(&nfo) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring sidecar");
                None
            }
        }
    }
}

fn has_nfo_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("nfo"))
}

static IMDB_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(tt\d{7,9})\b").expect("valid regex"));

static TMDB_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"themoviedb\.org/(?:movie|tv)/(\d+)").expect("valid regex")
});

const NFO_ROOTS: &[&[u8]] = &[b"movie", b"tvshow", b"episodedetails"];

/// Parse sidecar content. XML is tried first; text that is not a Kodi
/// document is scanned for IMDb/TMDB links. `None` when nothing was found.
pub fn parse_nfo(content: &str) -> Option<SidecarMetadata> {
    let metadata = parse_nfo_xml(content).unwrap_or_else(|| parse_nfo_links(content));
    (!metadata.is_empty()).then_some(metadata)
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Kodi XML. `None` when no supported root element was found.
fn parse_nfo_xml(content: &str) -> Option<SidecarMetadata> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut metadata = SidecarMetadata::default();
    let mut saw_root = false;
    let mut depth = 0usize;
    let mut field: Option<Vec<u8>> = None;
    let mut unique_id_type: Option<String> = None;
    let mut premiered: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                let name = e.local_name().as_ref().to_ascii_lowercase();
                if depth == 1 {
                    if !NFO_ROOTS.contains(&name.as_slice()) {
                        return None;
                    }
                    saw_root = true;
                } else if depth == 2 {
                    if name == b"uniqueid" {
                        unique_id_type = e
                            .attributes()
                            .flatten()
                            .find(|a| a.key.as_ref() == b"type")
                            .and_then(|a| a.unescape_value().ok())
                            .map(|v| v.to_ascii_lowercase());
                    }
                    field = Some(name);
                }
            }
            Ok(Event::End(_)) => {
                if depth == 2 {
                    field = None;
                    unique_id_type = None;
                }
                depth = depth.saturating_sub(1);
                if depth == 0 && saw_root {
                    break;
                }
            }
            Ok(Event::Text(t)) if depth == 2 => {
                if let (Some(name), Ok(text)) = (&field, t.unescape()) {
                    apply_field(
                        &mut metadata,
                        name,
                        unique_id_type.as_deref(),
                        &text,
                        &mut premiered,
                    );
                }
            }
            Ok(Event::CData(c)) if depth == 2 => {
                if let Some(name) = &field {
                    let text = String::from_utf8_lossy(&c);
                    apply_field(
                        &mut metadata,
                        name,
                        unique_id_type.as_deref(),
                        &text,
                        &mut premiered,
                    );
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                if !saw_root {
                    return None;
                }
                // Keep what was read before the damage
                tracing::debug!(error = %e, "nfo XML stopped parsing early");
                break;
            }
            _ => {}
        }
    }

    if !saw_root {
        return None;
    }

    if metadata.year.is_none() {
        metadata.year = premiered
            .as_deref()
            .and_then(|p| p.get(..4))
            .filter(|y| is_valid_year(y))
            .map(str::to_string);
    }

    Some(metadata)
}

fn apply_field(
    metadata: &mut SidecarMetadata,
    name: &[u8],
    unique_id_type: Option<&str>,
    text: &str,
    premiered: &mut Option<String>,
) {
    let Some(value) = non_empty(text) else {
        return;
    };

    match name {
        b"uniqueid" => match unique_id_type {
            Some("imdb") => metadata.external_id_primary = Some(value),
            Some("tmdb") => metadata.external_id_secondary = Some(value),
            _ => {}
        },
        b"imdbid" => {
            metadata.external_id_primary.get_or_insert(value);
        }
        b"tmdbid" => {
            metadata.external_id_secondary.get_or_insert(value);
        }
        b"id" if value.starts_with("tt") => {
            metadata.external_id_primary.get_or_insert(value);
        }
        b"title" => {
            metadata.title.get_or_insert(value);
        }
        b"year" if is_valid_year(&value) => metadata.year = Some(value),
        b"premiered" | b"releasedate" | b"aired" => {
            premiered.get_or_insert(value);
        }
        _ => {}
    }
}

fn parse_nfo_links(content: &str) -> SidecarMetadata {
    SidecarMetadata {
        external_id_primary: IMDB_ID.captures(content).map(|c| c[1].to_string()),
        external_id_secondary: TMDB_LINK.captures(content).map(|c| c[1].to_string()),
        title: None,
        year: None,
    }
}
