//! Playlist entries
//!
//! A [`PlaylistEntry`] is a normalized URI with optional pre-attached tags.
//! Local paths are resolved against an explicit [`ResolutionContext`]
//! rather than the process working directory, so playlists can be parsed
//! from any thread without touching global state.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Track metadata carried by an entry
///
/// Only metadata the playlist already has is stored here (M3U comment
/// lines, XSPF elements, CUE sheet fields). Binary tag formats are read
/// elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackTags {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
    pub date: Option<String>,
    pub genre: Option<String>,

    /// 1-based track number
    pub track_index: Option<u32>,
    pub track_count: Option<u32>,

    /// 1-based disc number
    pub disc_index: Option<u32>,
    pub disc_count: Option<u32>,
}

impl TrackTags {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.artist.is_none()
            && self.title.is_none()
            && self.album.is_none()
            && self.date.is_none()
            && self.genre.is_none()
            && self.track_index.is_none()
            && self.track_count.is_none()
            && self.disc_index.is_none()
            && self.disc_count.is_none()
    }

    /// Trim text fields, dropping the ones left empty
    pub fn clean(&mut self) {
        for field in [
            &mut self.artist,
            &mut self.title,
            &mut self.album,
            &mut self.date,
            &mut self.genre,
        ] {
            *field = field
                .take()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty());
        }
    }
}

/// Base directory used to resolve relative entries
///
/// Playlists resolve their entries relative to the playlist file's own
/// directory; ad-hoc adds usually resolve against the working directory
/// captured once via [`ResolutionContext::current`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionContext {
    base_dir: Option<PathBuf>,
}

impl ResolutionContext {
    /// Resolve relative entries against `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    /// Snapshot of the process working directory
    pub fn current() -> Self {
        Self {
            base_dir: std::env::current_dir().ok(),
        }
    }

    /// Context for entries found inside the file at `path`
    pub fn for_file(path: &Path) -> Self {
        let dir = path.parent().map(|parent| {
            parent
                .canonicalize()
                .unwrap_or_else(|_| parent.to_path_buf())
        });
        Self { base_dir: dir }
    }

    /// Base directory, if any
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Resolve a local path string
    ///
    /// Relative paths are joined onto the base directory. Existing paths
    /// are canonicalized; missing ones are returned as joined.
    pub fn resolve(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        let joined = match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        };
        joined.canonicalize().unwrap_or(joined)
    }
}

/// One entry of a playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    uri: String,
    filename: PathBuf,
    tags: Option<TrackTags>,
    cue_index: Option<usize>,
}

impl PlaylistEntry {
    /// Create an entry from a raw playlist line, path or URL
    ///
    /// `<file>.cue:<n>` selects track `n` (0-based) of a CUE sheet.
    pub fn new(raw: &str, ctx: &ResolutionContext) -> Self {
        let normalized = normalize_uri(raw);

        if is_remote_uri(&normalized) {
            return Self {
                filename: PathBuf::from(&normalized),
                uri: normalized,
                tags: None,
                cue_index: None,
            };
        }

        if let Some((cue_file, index)) = split_cue_uri(&normalized) {
            return Self::cue_track(&ctx.resolve(cue_file), index);
        }

        let filename = ctx.resolve(&normalized);
        Self {
            uri: filename.to_string_lossy().into_owned(),
            filename,
            tags: None,
            cue_index: None,
        }
    }

    /// Entry for track `index` of the CUE sheet at `cue_path`
    pub fn cue_track(cue_path: &Path, index: usize) -> Self {
        Self {
            uri: format!("{}:{}", cue_path.to_string_lossy(), index),
            filename: cue_path.to_path_buf(),
            tags: None,
            cue_index: Some(index),
        }
    }

    /// Attach tags (empty tag sets are dropped)
    pub fn with_tags(mut self, mut tags: TrackTags) -> Self {
        tags.clean();
        self.tags = (!tags.is_empty()).then_some(tags);
        self
    }

    /// Normalized URI
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Resolved local file (the CUE sheet for CUE tracks, the URL for remote entries)
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn tags(&self) -> Option<&TrackTags> {
        self.tags.as_ref()
    }

    /// CUE track index (0-based)
    pub fn cue_index(&self) -> Option<usize> {
        self.cue_index
    }

    pub fn is_remote(&self) -> bool {
        is_remote_uri(&self.uri)
    }

    /// Directory containing the entry's file
    pub fn parent_dir(&self) -> Option<&Path> {
        if self.is_remote() {
            return None;
        }
        self.filename.parent()
    }
}

/// Normalize a URI as typed by a user or found in a playlist
///
/// Trims whitespace, strips a `file://` prefix and expands a leading `~`.
pub fn normalize_uri(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = trimmed.strip_prefix("file://").unwrap_or(trimmed);

    if stripped == "~" {
        if let Some(home) = dirs::home_dir() {
            return home.to_string_lossy().into_owned();
        }
    } else if let Some(rest) = stripped.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().into_owned();
        }
    }

    stripped.to_string()
}

/// True if `uri` is a well-formed URL with a scheme (`http://`, `mms://`, ...)
pub fn is_remote_uri(uri: &str) -> bool {
    uri.contains("://") && Url::parse(uri).is_ok()
}

/// Split `<file>.cue:<n>` into the sheet path and track index
pub fn split_cue_uri(uri: &str) -> Option<(&str, usize)> {
    static CUE_URI: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)^(.+\.cue):(\d+)$").expect("CUE_URI pattern"));

    let caps = CUE_URI.captures(uri)?;
    let file = caps.get(1)?.as_str();
    let index = caps.get(2)?.as_str().parse().ok()?;
    Some((file, index))
}
