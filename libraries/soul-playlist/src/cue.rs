//! CUE sheet parsing and caching
//!
//! A CUE sheet splits one (or a few) audio files into logical tracks.
//! Sheets are parsed once per file and cached, including failures, so a
//! broken sheet referenced by many playlist entries is only read once.

use crate::entry::TrackTags;
use crate::error::{PlaylistError, Result};
use crate::formats::{read_file, skip_bom};
use crate::source::{AudioBackend, ChannelType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// CUE timestamps count frames at 75 per second
pub const CUE_FRAMES_PER_SECOND: f64 = 75.0;

static PERFORMER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*PERFORMER\s*"([^"]*)"\s*$"#).expect("PERFORMER pattern"));
static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*TITLE\s*"([^"]*)"\s*$"#).expect("TITLE pattern"));
static TRACK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*TRACK\s*(\d+)\s*AUDIO\s*$").expect("TRACK pattern"));
static INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*INDEX\s*0?1\s*(\d+):(\d+):(\d+)\s*$").expect("INDEX pattern"));
static REM_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*REM\s*DATE\s*"?(.*?)"?\s*$"#).expect("REM_DATE pattern"));
static FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*FILE\s+(?:"([^"]*)"|(\S+))(?:\s+\S+)?\s*$"#).expect("FILE pattern"));

/// One logical track of a CUE sheet
#[derive(Debug, Clone, PartialEq)]
pub struct CueTrack {
    /// 0-based track index
    pub index: usize,

    /// Start offset in seconds
    pub start_pos: f64,

    /// End offset in seconds (0 = until the end of the data file)
    pub end_pos: f64,

    pub title: Option<String>,
    pub performer: Option<String>,

    /// Audio file declared by the closest preceding `FILE` line
    pub file: Option<PathBuf>,
}

/// A parsed CUE sheet
#[derive(Debug, Clone, PartialEq)]
pub struct CueSheet {
    cue_filename: PathBuf,
    data_source: Option<PathBuf>,
    source_type: ChannelType,
    tracks: Vec<CueTrack>,
    title: Option<String>,
    performer: Option<String>,
    date: Option<String>,
}

impl CueSheet {
    /// Parse sheet text
    ///
    /// The data source is not located here; see [`CueSheetCache::load`].
    pub fn parse(cue_filename: &Path, text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let base_dir = cue_filename.parent().unwrap_or_else(|| Path::new(""));

        let mut sheet = Self {
            cue_filename: cue_filename.to_path_buf(),
            data_source: None,
            source_type: ChannelType::Unknown,
            tracks: Vec::new(),
            title: None,
            performer: None,
            date: None,
        };
        let mut current_file: Option<PathBuf> = None;

        for line in text.lines() {
            if let Some(caps) = FILE.captures(line) {
                if let Some(name) = caps.get(1).or_else(|| caps.get(2)) {
                    current_file = Some(base_dir.join(name.as_str()));
                }
            } else if let Some(caps) = TRACK.captures(line) {
                let number: usize = caps[1].parse().unwrap_or(0);
                let expected = sheet.tracks.len() + 1;
                if number != expected {
                    return Err(PlaylistError::CueIndexLost {
                        path: cue_filename.to_path_buf(),
                        expected,
                        found: number,
                    });
                }
                sheet.tracks.push(CueTrack {
                    index: number - 1,
                    start_pos: 0.0,
                    end_pos: 0.0,
                    title: None,
                    performer: None,
                    file: current_file.clone(),
                });
            } else if let Some(caps) = PERFORMER.captures(line) {
                let value = caps[1].to_string();
                match sheet.tracks.last_mut() {
                    Some(track) => track.performer = Some(value),
                    None => sheet.performer = Some(value),
                }
            } else if let Some(caps) = TITLE.captures(line) {
                let value = caps[1].to_string();
                match sheet.tracks.last_mut() {
                    Some(track) => track.title = Some(value),
                    None => sheet.title = Some(value),
                }
            } else if let Some(caps) = INDEX.captures(line) {
                let minutes: f64 = caps[1].parse().unwrap_or(0.0);
                let seconds: f64 = caps[2].parse().unwrap_or(0.0);
                let frames: f64 = caps[3].parse().unwrap_or(0.0);
                let position = minutes * 60.0 + seconds + frames / CUE_FRAMES_PER_SECOND;
                sheet.set_track_start(position);
            } else if let Some(caps) = REM_DATE.captures(line) {
                sheet.date = Some(caps[1].to_string()).filter(|date| !date.is_empty());
            }
        }

        for track in &mut sheet.tracks {
            if track.performer.is_none() {
                track.performer.clone_from(&sheet.performer);
            }
            if track.title.is_none() {
                track.title.clone_from(&sheet.title);
            }
        }

        Ok(sheet)
    }

    /// Start the current track at `position`, closing the previous one
    /// when both play from the same file.
    fn set_track_start(&mut self, position: f64) {
        let Some((current, earlier)) = self.tracks.split_last_mut() else {
            return;
        };
        current.start_pos = position;
        if let Some(previous) = earlier.last_mut() {
            if previous.file == current.file {
                previous.end_pos = position;
            }
        }
    }

    pub fn cue_filename(&self) -> &Path {
        &self.cue_filename
    }

    /// Audio file the sheet describes
    pub fn data_source(&self) -> Option<&Path> {
        self.data_source.as_deref()
    }

    pub fn source_type(&self) -> ChannelType {
        self.source_type
    }

    pub fn tracks(&self) -> &[CueTrack] {
        &self.tracks
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn performer(&self) -> Option<&str> {
        self.performer.as_deref()
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    /// Distinct audio files named by `FILE` lines, in order of appearance
    pub fn referenced_files(&self) -> Vec<&Path> {
        let mut files: Vec<&Path> = Vec::new();
        for file in self.tracks.iter().filter_map(|track| track.file.as_deref()) {
            if !files.contains(&file) {
                files.push(file);
            }
        }
        files
    }

    /// Locate the audio file for this sheet
    ///
    /// Files declared with `FILE` are tried first, then siblings named
    /// `<cue base name>.*`. The first candidate with a known channel type wins.
    fn locate_data_source(&mut self, backend: &dyn AudioBackend) -> Result<()> {
        let declared: Vec<PathBuf> = self
            .referenced_files()
            .into_iter()
            .filter(|file| file.is_file())
            .map(Path::to_path_buf)
            .collect();

        for file in declared.into_iter().chain(self.sibling_candidates()) {
            let channel_type = backend.resolve_type(&file.to_string_lossy());
            if channel_type != ChannelType::Unknown {
                tracing::debug!(
                    "CUE {} uses data source {}",
                    self.cue_filename.display(),
                    file.display()
                );
                self.data_source = Some(file);
                self.source_type = channel_type;
                return Ok(());
            }
        }

        Err(PlaylistError::CueSourceNotFound(self.cue_filename.clone()))
    }

    fn sibling_candidates(&self) -> Vec<PathBuf> {
        let Some(dir) = self.cue_filename.parent() else {
            return Vec::new();
        };
        let Some(stem) = self.cue_filename.file_stem().and_then(|stem| stem.to_str()) else {
            return Vec::new();
        };
        let prefix = format!("{stem}.");

        let Ok(read_dir) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut siblings: Vec<PathBuf> = read_dir
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && *path != self.cue_filename)
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(&prefix))
            })
            .collect();
        siblings.sort();
        siblings
    }
}

/// A track inside a shared sheet
#[derive(Debug, Clone)]
pub struct CueTrackRef {
    sheet: Arc<CueSheet>,
    index: usize,
}

impl CueTrackRef {
    pub fn sheet(&self) -> &Arc<CueSheet> {
        &self.sheet
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn track(&self) -> &CueTrack {
        // index is checked by CueSheetCache::track
        &self.sheet.tracks[self.index]
    }

    /// Audio file this track plays from
    pub fn data_file(&self) -> Option<&Path> {
        self.track().file.as_deref().or(self.sheet.data_source())
    }

    /// Tags derived from the sheet
    pub fn tags(&self) -> TrackTags {
        let track = self.track();
        let mut tags = TrackTags {
            artist: track.performer.clone(),
            title: track.title.clone(),
            album: self.sheet.title.clone(),
            date: self.sheet.date.clone(),
            track_index: u32::try_from(self.index + 1).ok(),
            track_count: u32::try_from(self.sheet.tracks.len()).ok(),
            ..Default::default()
        };
        tags.clean();
        tags
    }
}

#[derive(Debug, Clone)]
enum CacheSlot {
    Valid(Arc<CueSheet>),
    IndexLost { expected: usize, found: usize },
    SourceNotFound,
}

/// Parsed sheets keyed by CUE filename
///
/// Invalid sheets stay cached as invalid; open failures are not cached so a
/// sheet that appears later can still be loaded.
#[derive(Debug, Default)]
pub struct CueSheetCache {
    sheets: HashMap<PathBuf, CacheSlot>,
}

impl CueSheetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a sheet, parsing it on first reference
    pub fn load(&mut self, path: &Path, backend: &dyn AudioBackend) -> Result<Arc<CueSheet>> {
        if let Some(slot) = self.sheets.get(path) {
            tracing::debug!("CUE cache hit for {}", path.display());
            return Self::slot_result(path, slot);
        }

        let bytes = read_file(path)?;
        let text = String::from_utf8_lossy(skip_bom(&bytes));

        let slot = match CueSheet::parse(path, &text) {
            Ok(mut sheet) => match sheet.locate_data_source(backend) {
                Ok(()) => CacheSlot::Valid(Arc::new(sheet)),
                Err(_) => CacheSlot::SourceNotFound,
            },
            Err(PlaylistError::CueIndexLost {
                expected, found, ..
            }) => CacheSlot::IndexLost { expected, found },
            Err(e) => return Err(e),
        };

        if !matches!(slot, CacheSlot::Valid(_)) {
            tracing::warn!("Caching invalid CUE sheet {}", path.display());
        }
        let result = Self::slot_result(path, &slot);
        self.sheets.insert(path.to_path_buf(), slot);
        result
    }

    /// Look up one track of a sheet
    pub fn track(
        &mut self,
        path: &Path,
        index: usize,
        backend: &dyn AudioBackend,
    ) -> Result<CueTrackRef> {
        let sheet = self.load(path, backend)?;
        if index >= sheet.tracks.len() {
            return Err(PlaylistError::CueIndexOutOfRange {
                path: path.to_path_buf(),
                index,
            });
        }
        Ok(CueTrackRef { sheet, index })
    }

    /// All tracks of a sheet, in order
    pub fn tracks(&mut self, path: &Path, backend: &dyn AudioBackend) -> Result<Vec<CueTrackRef>> {
        let sheet = self.load(path, backend)?;
        Ok((0..sheet.tracks.len())
            .map(|index| CueTrackRef {
                sheet: Arc::clone(&sheet),
                index,
            })
            .collect())
    }

    /// Whether `path` is cached as an invalid sheet
    pub fn is_invalid(&self, path: &Path) -> bool {
        self.sheets
            .get(path)
            .is_some_and(|slot| !matches!(slot, CacheSlot::Valid(_)))
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.sheets.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn clear(&mut self) {
        self.sheets.clear();
    }

    fn slot_result(path: &Path, slot: &CacheSlot) -> Result<Arc<CueSheet>> {
        match slot {
            CacheSlot::Valid(sheet) => Ok(Arc::clone(sheet)),
            CacheSlot::IndexLost { expected, found } => Err(PlaylistError::CueIndexLost {
                path: path.to_path_buf(),
                expected: *expected,
                found: *found,
            }),
            CacheSlot::SourceNotFound => Err(PlaylistError::CueSourceNotFound(path.to_path_buf())),
        }
    }
}
