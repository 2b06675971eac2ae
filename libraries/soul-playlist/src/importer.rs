//! Directory and playlist import
//!
//! Every discovered item goes through [`Importer::add_anything`], which
//! routes it by kind: remote URL, directory, playlist file, plain file.
//! Individual failures do not stop an import; the most recent one is kept
//! in [`Importer::last_error`].

use crate::cue::CueSheetCache;
use crate::entry::PlaylistEntry;
use crate::error::{LastError, PlaylistError, Result};
use crate::formats::{self, PlaylistFormat};
use crate::source::{resolve_entry, AudioBackend, ChannelType, Source};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// How nested sources (directories, playlists) are followed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadFlags {
    /// Parse playlists found while scanning directories
    pub load_playlists: bool,

    /// Ignore directories listed inside playlists
    pub skip_dirs: bool,

    /// Ignore playlists listed inside playlists (CUE sheets are still read)
    pub skip_playlists: bool,
}

/// Collects sources from files, URLs, directories and playlists
pub struct Importer<'a> {
    backend: &'a dyn AudioBackend,
    cues: &'a mut CueSheetCache,
    sources: Vec<Source>,
    last_error: Option<LastError>,
    /// Directories and playlists currently being expanded
    visiting: HashSet<PathBuf>,
}

impl<'a> Importer<'a> {
    pub fn new(backend: &'a dyn AudioBackend, cues: &'a mut CueSheetCache) -> Self {
        Self {
            backend,
            cues,
            sources: Vec::new(),
            last_error: None,
            visiting: HashSet::new(),
        }
    }

    /// Sources collected so far
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn last_error(&self) -> Option<&LastError> {
        self.last_error.as_ref()
    }

    /// Finish, returning the collected sources and the last failure
    pub fn finish(self) -> (Vec<Source>, Option<LastError>) {
        (self.sources, self.last_error)
    }

    fn record(&mut self, err: &PlaylistError) {
        tracing::warn!("Import: {}", err);
        self.last_error = Some(LastError::from(err));
    }

    /// Add a single playable file
    pub fn add_file(&mut self, entry: PlaylistEntry) -> Result<()> {
        let source = resolve_entry(entry, self.backend, self.cues)?;
        self.sources.push(source);
        Ok(())
    }

    /// Add a network URL; fails with `NotUrl` for anything else
    pub fn add_url(&mut self, entry: PlaylistEntry) -> Result<()> {
        if self.backend.resolve_type(entry.uri()) != ChannelType::Remote {
            return Err(PlaylistError::NotUrl(entry.uri().to_string()));
        }
        self.add_file(entry)
    }

    /// Classify `entry` and add whatever it points at
    ///
    /// Returns the number of sources added.
    pub fn add_anything(&mut self, entry: PlaylistEntry, flags: LoadFlags) -> usize {
        let channel_type = self.backend.resolve_type(entry.uri());

        if channel_type == ChannelType::Remote {
            return match self.add_url(entry) {
                Ok(()) => 1,
                Err(e) => {
                    self.record(&e);
                    0
                }
            };
        }

        if entry.cue_index().is_some() {
            return self.add_single(entry);
        }

        let path = entry.filename().to_path_buf();
        if !entry.is_remote() && path.is_dir() {
            if flags.skip_dirs {
                return 0;
            }
            return self.add_from_directory(&path, flags);
        }

        if let Some(format) = formats::has_supported_extension(&path) {
            if flags.skip_playlists && format != PlaylistFormat::Cue {
                return 0;
            }
            return self.add_from_playlist(&path, flags);
        }

        if channel_type == ChannelType::Unknown {
            tracing::debug!("Skipping unrecognized entry {}", entry.uri());
            return 0;
        }
        self.add_single(entry)
    }

    fn add_single(&mut self, entry: PlaylistEntry) -> usize {
        match self.add_file(entry) {
            Ok(()) => 1,
            Err(e) => {
                self.record(&e);
                0
            }
        }
    }

    /// Add every playable file below `dir`
    ///
    /// Subdirectories come first, then files, each in natural order. Audio
    /// files described by a CUE sheet in the same directory are replaced by
    /// the sheet's tracks.
    pub fn add_from_directory(&mut self, dir: &Path, flags: LoadFlags) -> usize {
        let dir = match canonical_dir(dir) {
            Ok(dir) => dir,
            Err(e) => {
                self.record(&e);
                return 0;
            }
        };
        if !self.visiting.insert(dir.clone()) {
            tracing::debug!("Already importing {}, skipping", dir.display());
            return 0;
        }

        let (mut subdirs, mut files) = list_directory(&dir);
        subdirs.sort_by(|a, b| natural_cmp(a, b));

        let mut added = 0;
        for name in &subdirs {
            added += self.add_from_directory(&dir.join(name), flags);
        }

        self.blank_cue_covered(&dir, &mut files);

        let mut flags = flags;
        if !flags.load_playlists {
            flags.skip_playlists = true;
        }

        files.sort_by(|a, b| natural_cmp(a, b));
        for name in files.iter().filter(|name| !name.is_empty()) {
            let entry = PlaylistEntry::new(&dir.join(name).to_string_lossy(), &Default::default());
            added += self.add_anything(entry, flags);
        }

        self.visiting.remove(&dir);
        if added == 0 && self.visiting.is_empty() {
            self.record(&PlaylistError::NoValidFilesFound(dir.display().to_string()));
        }
        tracing::info!("Imported {} sources from {}", added, dir.display());
        added
    }

    /// Blank out files that a CUE sheet in the same listing stands in for
    fn blank_cue_covered(&mut self, dir: &Path, files: &mut [String]) {
        let cue_names: Vec<String> = files
            .iter()
            .filter(|name| name.to_ascii_lowercase().ends_with(".cue"))
            .cloned()
            .collect();

        for cue_name in cue_names {
            let prefix = format!("{}.", &cue_name[..cue_name.len() - 4]);
            let mut covered: Vec<PathBuf> = Vec::new();
            if let Ok(sheet) = self.cues.load(&dir.join(&cue_name), self.backend) {
                covered.extend(sheet.referenced_files().into_iter().map(Path::to_path_buf));
            }

            for name in files.iter_mut() {
                if *name == cue_name || name.is_empty() {
                    continue;
                }
                if name.starts_with(&prefix) || covered.contains(&dir.join(name.as_str())) {
                    name.clear();
                }
            }
        }
    }

    /// Add the entries of a playlist file, or the tracks of a CUE sheet
    pub fn add_from_playlist(&mut self, path: &Path, flags: LoadFlags) -> usize {
        if !path.exists() {
            self.record(&PlaylistError::PathNotFound(path.to_path_buf()));
            return 0;
        }

        if PlaylistFormat::from_path(path) == Some(PlaylistFormat::Cue) {
            return self.add_cue_tracks(path);
        }

        let entries = match formats::parse_file(path) {
            Ok(entries) => entries,
            Err(e) => {
                self.record(&e);
                return 0;
            }
        };
        if entries.is_empty() {
            self.record(&PlaylistError::PlaylistIsEmpty);
            return 0;
        }

        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if !self.visiting.insert(key.clone()) {
            tracing::debug!("Playlist {} includes itself, skipping", path.display());
            return 0;
        }
        let added: usize = entries
            .into_iter()
            .map(|entry| self.add_anything(entry, flags))
            .sum();
        self.visiting.remove(&key);
        added
    }

    fn add_cue_tracks(&mut self, path: &Path) -> usize {
        let tracks = match self.cues.tracks(path, self.backend) {
            Ok(tracks) => tracks,
            Err(e) => {
                self.record(&e);
                return 0;
            }
        };

        tracks
            .iter()
            .map(|track| self.add_single(PlaylistEntry::cue_track(path, track.index())))
            .sum()
    }
}

fn canonical_dir(dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(PlaylistError::PathNotFound(dir.to_path_buf()));
    }
    dir.canonicalize()
        .map_err(|_| PlaylistError::CannotGetCanonicalPath(dir.to_path_buf()))
}

/// Names of the subdirectories and files directly inside `dir`
fn list_directory(dir: &Path) -> (Vec<String>, Vec<String>) {
    let mut subdirs = Vec::new();
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Failed to read entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::warn!("Skipping non UTF-8 name in {}", dir.display());
            continue;
        };
        if entry.file_type().is_dir() {
            subdirs.push(name);
        } else {
            files.push(name);
        }
    }

    (subdirs, files)
}

/// Numeric-aware, case-insensitive ordering ("track2" < "track10")
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ln = take_digits(&mut left);
                let rn = take_digits(&mut right);
                let ordering = ln
                    .len()
                    .cmp(&rn.len())
                    .then_with(|| ln.cmp(&rn));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                let ordering = l.to_lowercase().cmp(r.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left.next();
                right.next();
            }
        }
    }
}

/// Consume a digit run, without leading zeros
fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        chars.next();
        if !(digits.is_empty() && c == '0') {
            digits.push(c);
        }
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_order() {
        let mut names = vec!["track10.mp3", "Track2.mp3", "track1.mp3", "intro.mp3", "track02b.mp3"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(
            names,
            vec!["intro.mp3", "track1.mp3", "Track2.mp3", "track02b.mp3", "track10.mp3"]
        );
    }

    #[test]
    fn natural_order_ties_break_on_raw_text() {
        assert_eq!(natural_cmp("a01", "a1"), "a01".cmp("a1"));
        assert_eq!(natural_cmp("abc", "abc"), Ordering::Equal);
    }

    #[test]
    fn flags_deserialize_with_defaults() {
        let flags: LoadFlags = serde_json::from_str(r#"{"skip_dirs": true}"#).unwrap();
        assert!(flags.skip_dirs);
        assert!(!flags.load_playlists);
    }
}
