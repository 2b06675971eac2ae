//! Soul Player - Playlist Data
//!
//! Everything a playlist is made of, independent of how it is played.
//!
//! This crate provides:
//! - Playlist entries with path normalization and pre-attached tags
//! - CUE sheet parsing with a per-file cache (invalid sheets included)
//! - Readers and writers for M3U, PLS, ASX, XSPF and WPL, detected by content
//! - Source resolution through a pluggable [`AudioBackend`]
//! - Recursive directory and playlist import
//!
//! # Example: Reading a playlist
//!
//! ```rust
//! use soul_playlist::{formats, ResolutionContext};
//!
//! let text = b"#EXTM3U\n#EXTINF:-1,Intro\nintro.mp3\n";
//! let entries = formats::parse(text, &ResolutionContext::new("/music")).unwrap();
//!
//! assert_eq!(entries[0].uri(), "/music/intro.mp3");
//! assert_eq!(entries[0].tags().unwrap().title.as_deref(), Some("Intro"));
//! ```
//!
//! # Example: Importing a directory
//!
//! ```rust,no_run
//! use soul_playlist::{CueSheetCache, ExtensionResolver, Importer, LoadFlags};
//! use std::path::Path;
//!
//! let backend = ExtensionResolver::default();
//! let mut cues = CueSheetCache::new();
//! let mut importer = Importer::new(&backend, &mut cues);
//!
//! let added = importer.add_from_directory(Path::new("/music"), LoadFlags::default());
//! let (sources, last_error) = importer.finish();
//! assert_eq!(added, sources.len());
//! if let Some(err) = last_error {
//!     eprintln!("some entries were skipped: {err}");
//! }
//! ```

pub mod cue;
mod entry;
mod error;
pub mod formats;
mod importer;
mod source;

// Public exports
pub use cue::{CueSheet, CueSheetCache, CueTrack, CueTrackRef};
pub use entry::{is_remote_uri, normalize_uri, split_cue_uri, PlaylistEntry, ResolutionContext, TrackTags};
pub use error::{ErrorKind, LastError, PlaylistError, Result};
pub use formats::PlaylistFormat;
pub use importer::{natural_cmp, Importer, LoadFlags};
pub use source::{
    resolve_entry, AudioBackend, ChannelType, ExtensionResolver, Source, SourceId, SourceOpener,
};
