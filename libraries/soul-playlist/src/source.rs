//! Playable sources and channel classification
//!
//! A [`Source`] is an entry that has been classified by an
//! [`AudioBackend`]. Opening and decoding stay with the backend; this
//! crate only needs to know what kind of channel an entry would become.

use crate::cue::{CueSheetCache, CueTrackRef};
use crate::entry::{is_remote_uri, PlaylistEntry, TrackTags};
use crate::error::{PlaylistError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Kind of channel a source plays through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    #[default]
    Unknown,
    /// Decoded by the built-in stream decoders (mp3, ogg, wav, ...)
    Stream,
    /// Tracker modules (it, xm, s3m, ...)
    Module,
    /// Network stream
    Remote,
    /// Decoded through a decoder plugin (flac, opus, ...)
    Plugin,
}

/// Classification and capability queries answered by the audio backend
pub trait AudioBackend {
    /// Classify a URI or file path
    fn resolve_type(&self, uri: &str) -> ChannelType;

    /// Whether sources of this type can be played
    fn supports(&self, channel_type: ChannelType) -> bool {
        channel_type != ChannelType::Unknown
    }
}

/// Opens a resolved source for playback
///
/// Implemented by the platform layer; the handle is opaque to this crate.
pub trait SourceOpener {
    type Handle;

    fn open(&self, source: &Source) -> Result<Self::Handle>;
}

/// Extension-table classifier, the default [`AudioBackend`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionResolver {
    /// Extensions decoded as plain streams
    pub stream_extensions: Vec<String>,

    /// Tracker module extensions
    pub module_extensions: Vec<String>,

    /// Extensions handled by decoder plugins
    pub plugin_extensions: Vec<String>,

    /// Whether network URLs are accepted (default: true)
    pub remote_enabled: bool,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|ext| (*ext).to_string()).collect()
}

impl Default for ExtensionResolver {
    fn default() -> Self {
        Self {
            stream_extensions: owned(&["mp3", "mp2", "mp1", "ogg", "wav", "aiff"]),
            module_extensions: owned(&[
                "mo3", "it", "xm", "s3m", "mtm", "mod", "umx", "mdz", "s3z", "xmz", "itz",
            ]),
            plugin_extensions: owned(&["flac", "opus", "m4a", "aac", "wma", "ape", "wv", "mpc"]),
            remote_enabled: true,
        }
    }
}

impl ExtensionResolver {
    fn matches(list: &[String], ext: &str) -> bool {
        list.iter().any(|known| known.eq_ignore_ascii_case(ext))
    }
}

impl AudioBackend for ExtensionResolver {
    fn resolve_type(&self, uri: &str) -> ChannelType {
        if uri.contains("://") {
            return if is_remote_uri(uri) {
                ChannelType::Remote
            } else {
                ChannelType::Unknown
            };
        }

        let ext = Path::new(uri)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        if Self::matches(&self.plugin_extensions, ext) {
            ChannelType::Plugin
        } else if Self::matches(&self.stream_extensions, ext) {
            ChannelType::Stream
        } else if Self::matches(&self.module_extensions, ext) {
            ChannelType::Module
        } else if uri.to_ascii_lowercase().contains(".cue:") {
            ChannelType::Stream
        } else {
            ChannelType::Unknown
        }
    }

    fn supports(&self, channel_type: ChannelType) -> bool {
        match channel_type {
            ChannelType::Unknown => false,
            ChannelType::Remote => self.remote_enabled,
            ChannelType::Stream | ChannelType::Module | ChannelType::Plugin => true,
        }
    }
}

/// Stable identity of a source, independent of its list position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

impl SourceId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// A resolved, playable unit of a playlist
#[derive(Debug, Clone)]
pub struct Source {
    id: SourceId,
    index: usize,
    entry: PlaylistEntry,
    channel_type: ChannelType,
    cue_track: Option<CueTrackRef>,
}

impl Source {
    /// Create a source; its index is assigned when it joins a list
    pub fn new(entry: PlaylistEntry, channel_type: ChannelType, cue_track: Option<CueTrackRef>) -> Self {
        Self {
            id: SourceId::next(),
            index: 0,
            entry,
            channel_type,
            cue_track,
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Position in the owning list
    pub fn index(&self) -> usize {
        self.index
    }

    /// Reassign the list position (owning list only)
    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn entry(&self) -> &PlaylistEntry {
        &self.entry
    }

    pub fn uri(&self) -> &str {
        self.entry.uri()
    }

    pub fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    pub fn cue_track(&self) -> Option<&CueTrackRef> {
        self.cue_track.as_ref()
    }

    /// Local sources take part in directory navigation
    pub fn is_local(&self) -> bool {
        self.channel_type != ChannelType::Remote
    }

    /// File holding the audio data (the CUE data file for CUE tracks)
    pub fn data_file(&self) -> &Path {
        self.cue_track
            .as_ref()
            .and_then(|track| track.data_file())
            .unwrap_or_else(|| self.entry.filename())
    }

    /// Directory used for directory-relative navigation
    pub fn parent_dir(&self) -> Option<&Path> {
        if !self.is_local() {
            return None;
        }
        self.entry.parent_dir()
    }

    /// Tags attached to the entry, or derived from the CUE sheet
    pub fn tags(&self) -> Option<TrackTags> {
        if let Some(tags) = self.entry.tags() {
            return Some(tags.clone());
        }
        self.cue_track.as_ref().map(CueTrackRef::tags)
    }
}

/// Resolve an entry into a playable source
///
/// CUE track entries are looked up in `cues` (parsing the sheet on first
/// use) and take their channel type from the sheet's audio file.
pub fn resolve_entry(
    entry: PlaylistEntry,
    backend: &dyn AudioBackend,
    cues: &mut CueSheetCache,
) -> Result<Source> {
    let (channel_type, cue_track) = match entry.cue_index() {
        Some(index) => {
            let track = cues.track(entry.filename(), index, backend)?;
            let channel_type = track
                .data_file()
                .map(|file| backend.resolve_type(&file.to_string_lossy()))
                .unwrap_or(track.sheet().source_type());
            (channel_type, Some(track))
        }
        None => (backend.resolve_type(entry.uri()), None),
    };

    if !backend.supports(channel_type) {
        return Err(PlaylistError::UnsupportedSource(entry.uri().to_string()));
    }

    Ok(Source::new(entry, channel_type, cue_track))
}
