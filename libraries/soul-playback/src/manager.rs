//! Playlist engine - sequencing state machine
//!
//! Owns the ordered source list and decides what plays next under the
//! current [`PlaybackMode`], with a play queue that overrides the mode for
//! forward moves and a block-structured history for random playback.
//!
//! The engine is synchronous and single-threaded. State changes are
//! reported as [`PlaylistEvent`]s that the owner drains.

use crate::{
    error::{PlaybackError, Result},
    events::PlaylistEvent,
    history::History,
    queue::PlayQueue,
    shuffle::Shuffler,
    types::{PlaybackMode, PlaylistConfig},
};
use soul_playlist::{
    formats, AudioBackend, CueSheetCache, Importer, LastError, LoadFlags, PlaylistEntry,
    PlaylistError, PlaylistFormat, ResolutionContext, Source, SourceId, SourceOpener,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Backend shared between the engine and its owner
pub type SharedBackend = Arc<dyn AudioBackend + Send + Sync>;

/// Where a navigation step lands
#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    index: Option<usize>,
    history: Option<usize>,
}

/// State a directory walk returns to when it fails
#[derive(Debug)]
struct Checkpoint {
    current: SourceId,
    queue: PlayQueue,
}

/// A computed forward or backward move, not yet applied
#[derive(Debug, Clone, Copy)]
struct Step {
    cursor: Cursor,
    from_queue: bool,
}

/// Playlist sequencing engine
///
/// Holds the sources of one playlist and answers "what plays next".
pub struct PlaylistEngine {
    /// Sources in playlist order; `entries[i].index() == i`
    entries: Vec<Source>,

    /// Source identity to list position
    positions: HashMap<SourceId, usize>,

    queue: PlayQueue,

    /// Random-mode order (empty in other modes)
    history: History,

    /// Current source
    index: Option<usize>,

    mode: PlaybackMode,

    shuffler: Shuffler,

    backend: SharedBackend,

    cues: CueSheetCache,

    load_flags: LoadFlags,

    last_error: Option<LastError>,

    pending_events: Vec<PlaylistEvent>,
}

impl PlaylistEngine {
    /// Create an engine classifying entries with the configured extension
    /// tables
    pub fn new(config: PlaylistConfig) -> Self {
        let backend: SharedBackend = Arc::new(config.backend.clone());
        Self::with_backend(config, backend)
    }

    /// Create an engine with an explicit audio backend
    pub fn with_backend(config: PlaylistConfig, backend: SharedBackend) -> Self {
        let mut engine = Self {
            entries: Vec::new(),
            positions: HashMap::new(),
            queue: PlayQueue::new(),
            history: History::new(),
            index: None,
            mode: config.mode,
            shuffler: Shuffler::new(config.shuffle_seed),
            backend,
            cues: CueSheetCache::new(),
            load_flags: config.load_flags,
            last_error: None,
            pending_events: Vec::new(),
        };
        engine.sync_history();
        engine
    }

    // ===== State Queries =====

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of the current source
    pub fn current_index(&self) -> Option<usize> {
        self.index
    }

    pub fn current(&self) -> Option<&Source> {
        self.index.and_then(|index| self.entries.get(index))
    }

    pub fn get(&self, index: usize) -> Option<&Source> {
        self.entries.get(index)
    }

    pub fn sources(&self) -> &[Source] {
        &self.entries
    }

    /// Position of the first source with this URI
    pub fn index_of_uri(&self, uri: &str) -> Option<usize> {
        self.entries.iter().position(|source| source.uri() == uri)
    }

    /// Random-mode history as playlist positions
    pub fn history(&self) -> Vec<usize> {
        self.history
            .ids()
            .iter()
            .filter_map(|id| self.positions.get(id).copied())
            .collect()
    }

    /// Position of the current source inside [`PlaylistEngine::history`]
    pub fn history_index(&self) -> Option<usize> {
        self.history.position()
    }

    /// True without a current source, for lists of one, and at position 0
    ///
    /// List positions say nothing about the order in random mode, so there
    /// only the first two conditions apply.
    pub fn is_at_start(&self) -> bool {
        match self.index {
            None => true,
            _ if self.entries.len() <= 1 => true,
            Some(index) => index == 0 && self.mode != PlaybackMode::Random,
        }
    }

    /// True without a current source, for lists of one, and at the last position
    pub fn is_at_end(&self) -> bool {
        match self.index {
            None => true,
            _ if self.entries.len() <= 1 => true,
            Some(index) => index + 1 == self.entries.len() && self.mode != PlaybackMode::Random,
        }
    }

    pub fn load_flags(&self) -> LoadFlags {
        self.load_flags
    }

    pub fn set_load_flags(&mut self, flags: LoadFlags) {
        self.load_flags = flags;
    }

    /// Most recent failure of an add or import
    pub fn last_error(&self) -> Option<&LastError> {
        self.last_error.as_ref()
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    // ===== Playback Mode =====

    /// Change the playback mode
    ///
    /// The random history is discarded, and rebuilt when entering
    /// `Random`. The queue is kept.
    pub fn set_mode(&mut self, mode: PlaybackMode) {
        if self.mode == mode {
            return;
        }
        tracing::debug!("Playback mode {} -> {}", self.mode, mode);
        self.mode = mode;
        self.history.clear();
        self.sync_history();
        self.pending_events.push(PlaylistEvent::ModeChanged { mode });
    }

    // ===== Navigation =====

    /// Index that [`PlaylistEngine::move_to_next`] would select
    ///
    /// Does not change the current source. In random mode this may grow
    /// the history.
    pub fn next_index(&mut self) -> Option<usize> {
        self.next_step().and_then(|step| step.cursor.index)
    }

    /// Index that [`PlaylistEngine::move_to_prev`] would select
    pub fn prev_index(&mut self) -> Option<usize> {
        self.prev_step().and_then(|step| step.cursor.index)
    }

    pub fn next_source(&mut self) -> Option<&Source> {
        let index = self.next_index()?;
        self.entries.get(index)
    }

    pub fn prev_source(&mut self) -> Option<&Source> {
        let index = self.prev_index()?;
        self.entries.get(index)
    }

    /// Advance; on failure the state is left unchanged
    pub fn try_move_to_next(&mut self) -> bool {
        let Some(step) = self.next_step() else {
            return false;
        };
        self.apply(step);
        true
    }

    /// Step back; on failure the state is left unchanged
    pub fn try_move_to_prev(&mut self) -> bool {
        let Some(step) = self.prev_step() else {
            return false;
        };
        self.apply(step);
        true
    }

    /// Advance; on failure there is no current source afterwards
    pub fn move_to_next(&mut self) -> bool {
        if self.try_move_to_next() {
            return true;
        }
        self.set_current(None);
        false
    }

    /// Step back; on failure there is no current source afterwards
    pub fn move_to_prev(&mut self) -> bool {
        if self.try_move_to_prev() {
            return true;
        }
        self.set_current(None);
        false
    }

    /// Make `index` the current source
    pub fn set_index(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.set_current(Some(index));
        self.sync_history();
        Ok(())
    }

    /// Deselect the current source
    pub fn clear_index(&mut self) {
        self.set_current(None);
        self.history.set_position(None);
    }

    // ===== Queue Management =====

    /// Queue the source at `index`
    pub fn append_to_queue(&mut self, index: usize) -> Result<()> {
        let id = self.source_id(index)?;
        self.queue.push(id);
        self.queue_changed();
        Ok(())
    }

    /// Queue the source at `index` at queue `position` (clamped)
    pub fn insert_into_queue(&mut self, index: usize, position: usize) -> Result<()> {
        let id = self.source_id(index)?;
        self.queue.insert(position, id);
        self.queue_changed();
        Ok(())
    }

    /// Remove the queue entry at `position`
    pub fn remove_from_queue(&mut self, position: usize) -> Result<()> {
        let len = self.queue.len();
        self.queue
            .remove_at(position)
            .ok_or(PlaybackError::OutOfRange {
                index: position,
                len,
            })?;
        self.queue_changed();
        Ok(())
    }

    /// Remove the first queue entry for the source at `index`
    pub fn remove_source_from_queue(&mut self, index: usize) -> Result<bool> {
        let id = self.source_id(index)?;
        let removed = self.queue.remove_first(id);
        if removed {
            self.queue_changed();
        }
        Ok(removed)
    }

    /// Remove every queue entry for the source at `index`
    pub fn remove_all_sources_from_queue(&mut self, index: usize) -> Result<usize> {
        let id = self.source_id(index)?;
        let removed = self.queue.remove_all(id);
        if removed > 0 {
            self.queue_changed();
        }
        Ok(removed)
    }

    pub fn clear_queue(&mut self) {
        if !self.queue.is_empty() {
            self.queue.clear();
            self.queue_changed();
        }
    }

    /// Queued sources as playlist positions, front first
    pub fn queue(&self) -> Vec<usize> {
        self.queue
            .iter()
            .filter_map(|id| self.positions.get(&id).copied())
            .collect()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    // ===== Directory Navigation =====

    /// Whether the previous source lives in another directory
    ///
    /// True whenever [`PlaylistEngine::is_at_start`] is, and for remote
    /// sources.
    pub fn is_first_in_dir(&mut self) -> bool {
        if self.is_at_start() {
            return true;
        }
        let Some(index) = self.index else {
            return true;
        };
        match self.prev_index() {
            Some(prev) => self.in_different_dirs(index, prev),
            None => true,
        }
    }

    /// Whether the next source lives in another directory
    pub fn is_last_in_dir(&mut self) -> bool {
        if self.is_at_end() {
            return true;
        }
        let Some(index) = self.index else {
            return true;
        };
        match self.next_index() {
            Some(next) => self.in_different_dirs(index, next),
            None => true,
        }
    }

    /// Walk back to the first source of the current directory
    ///
    /// Random and track-loop orders may never reach a boundary, so the walk
    /// stops after one step per source and the source it stopped on counts
    /// as the first. On failure nothing moves.
    pub fn move_to_first_in_dir(&mut self) -> bool {
        let Some(start) = self.checkpoint() else {
            return false;
        };
        if self.walk_to_first_in_dir() {
            return true;
        }
        self.restore(start);
        false
    }

    /// Move to the first source of the previous directory
    pub fn move_to_first_in_prev_dir(&mut self) -> bool {
        let Some(start) = self.checkpoint() else {
            return false;
        };
        if self.walk_to_first_in_dir() && self.try_move_to_prev() && self.walk_to_first_in_dir() {
            return true;
        }
        self.restore(start);
        false
    }

    /// Move to the first source of the next directory
    ///
    /// Bounded like [`PlaylistEngine::move_to_first_in_dir`]; when the bound
    /// is hit the final step is still taken. On failure nothing moves.
    pub fn move_to_first_in_next_dir(&mut self) -> bool {
        let Some(start) = self.checkpoint() else {
            return false;
        };
        for _ in 0..=self.entries.len() {
            if self.is_last_in_dir() {
                break;
            }
            if !self.try_move_to_next() {
                self.restore(start);
                return false;
            }
        }
        if self.try_move_to_next() {
            return true;
        }
        self.restore(start);
        false
    }

    // ===== Lookahead & Order =====

    /// Up to `count` upcoming positions: the queue first, then the mode
    pub fn next_sources(&mut self, count: usize) -> Vec<usize> {
        let mut upcoming: Vec<usize> = self.queue().into_iter().take(count).collect();

        let mut cursor = self.cursor();
        if let Some(&last_queued) = upcoming.last() {
            cursor.index = Some(last_queued);
        }
        while upcoming.len() < count {
            let Some(next) = self.mode_next(cursor) else {
                break;
            };
            let Some(index) = next.index else {
                break;
            };
            upcoming.push(index);
            cursor = next;
        }
        upcoming
    }

    /// Shuffle the list order
    ///
    /// The current source stays current and the random history, which is
    /// keyed by source identity, survives.
    pub fn shuffle(&mut self) {
        if self.entries.len() < 2 {
            return;
        }
        let current = self.current().map(Source::id);
        self.shuffler.shuffle(&mut self.entries);
        self.reindex();

        let index = current.and_then(|id| self.positions.get(&id).copied());
        self.set_current(index);
        self.list_changed();
    }

    // ===== Adding & Removing =====

    /// Add one playable file
    pub fn add_file(&mut self, path: &str) -> Result<()> {
        let entry = PlaylistEntry::new(path, &ResolutionContext::current());
        self.import_one(entry, |importer, entry| importer.add_file(entry))
    }

    /// Add a network stream; fails with `NotUrl` for local paths
    pub fn add_url(&mut self, url: &str) -> Result<()> {
        let entry = PlaylistEntry::new(url, &ResolutionContext::default());
        self.import_one(entry, |importer, entry| importer.add_url(entry))
    }

    /// Add whatever `path` points at: URL, directory, playlist or file
    ///
    /// Returns the number of sources added; failures are kept in
    /// [`PlaylistEngine::last_error`].
    pub fn add_anything(&mut self, path: &str) -> usize {
        let entry = PlaylistEntry::new(path, &ResolutionContext::current());
        let flags = self.load_flags;
        self.import_with(|importer| importer.add_anything(entry, flags))
    }

    /// Add every playable file below `dir`
    pub fn add_from_directory(&mut self, dir: &Path) -> usize {
        let flags = self.load_flags;
        self.import_with(|importer| importer.add_from_directory(dir, flags))
    }

    /// Add the entries of a playlist file or CUE sheet
    pub fn add_from_playlist(&mut self, path: &Path) -> usize {
        let flags = self.load_flags;
        self.import_with(|importer| importer.add_from_playlist(path, flags))
    }

    /// Replace the list with whatever `path` points at
    pub fn set_file(&mut self, path: &str) -> usize {
        self.clear();
        self.add_anything(path)
    }

    /// Remove the source at `index`
    ///
    /// Queue entries for it are dropped. If it was current, nothing is
    /// current afterwards.
    pub fn remove(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        let removed = self.entries.remove(index);
        self.reindex();

        if self.queue.remove_all(removed.id()) > 0 {
            self.queue_changed();
        }

        let current = match self.index {
            Some(current) if current == index => None,
            Some(current) if current > index => Some(current - 1),
            other => other,
        };
        self.set_current(current);
        self.reset_history();
        self.list_changed();

        tracing::debug!("Removed {} at {}", removed.uri(), index);
        Ok(())
    }

    /// Remove every source
    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
        self.history.clear();
        self.cues.clear();
        self.clear_queue();
        self.set_current(None);
        self.list_changed();
    }

    // ===== Persistence =====

    /// Entries as they would be written, with CUE tags attached
    pub fn entries_for_write(&self) -> Vec<PlaylistEntry> {
        self.entries
            .iter()
            .map(|source| match (source.entry().tags(), source.tags()) {
                (None, Some(tags)) => source.entry().clone().with_tags(tags),
                _ => source.entry().clone(),
            })
            .collect()
    }

    /// Serialize the list
    pub fn write(&self, format: PlaylistFormat) -> Result<Vec<u8>> {
        Ok(formats::write(format, &self.entries_for_write())?)
    }

    /// Save the list; the format follows the file extension
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let format = formats::has_supported_extension(path)
            .filter(|format| PlaylistFormat::WRITABLE.contains(format))
            .ok_or_else(|| PlaylistError::InvalidFormat(path.display().to_string()))?;
        formats::write_file(path, format, &self.entries_for_write())?;
        tracing::info!("Saved {} sources to {}", self.entries.len(), path.display());
        Ok(())
    }

    /// Open the current source through the platform's opener
    pub fn open_current<O: SourceOpener>(&self, opener: &O) -> Result<O::Handle> {
        let source = self.current().ok_or(PlaybackError::NoCurrentSource)?;
        Ok(opener.open(source)?)
    }

    // ===== Events =====

    /// Take all events recorded since the last call
    pub fn drain_events(&mut self) -> Vec<PlaylistEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internal =====

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            return Err(PlaybackError::OutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(())
    }

    fn source_id(&self, index: usize) -> Result<SourceId> {
        self.check_index(index)?;
        Ok(self.entries[index].id())
    }

    fn cursor(&mut self) -> Cursor {
        if self.mode == PlaybackMode::Random {
            self.ensure_history();
        }
        Cursor {
            index: self.index,
            history: self.history.position(),
        }
    }

    fn next_step(&mut self) -> Option<Step> {
        if let Some(index) = self.queue.front().and_then(|id| self.positions.get(&id).copied()) {
            return Some(Step {
                cursor: Cursor {
                    index: Some(index),
                    history: self.history.position(),
                },
                from_queue: true,
            });
        }
        let from = self.cursor();
        self.mode_next(from).map(|cursor| Step {
            cursor,
            from_queue: false,
        })
    }

    fn prev_step(&mut self) -> Option<Step> {
        let from = self.cursor();
        self.mode_prev(from).map(|cursor| Step {
            cursor,
            from_queue: false,
        })
    }

    /// Next position under the playback mode alone
    fn mode_next(&mut self, from: Cursor) -> Option<Cursor> {
        let len = self.entries.len();
        if len == 0 {
            return None;
        }

        let index = match (self.mode, from.index) {
            (PlaybackMode::Random, _) => {
                let target = from.history.map_or(0, |pos| pos + 1);
                while target >= self.history.len() {
                    self.append_history_block();
                }
                let id = self.history.get(target)?;
                return Some(Cursor {
                    index: self.positions.get(&id).copied(),
                    history: Some(target),
                });
            }
            (PlaybackMode::TrackOnce, _) | (PlaybackMode::TrackLoop, None) => None,
            (PlaybackMode::TrackLoop, Some(index)) => Some(index),
            (PlaybackMode::AllOnce | PlaybackMode::AllLoop, None) => Some(0),
            (PlaybackMode::AllOnce, Some(index)) => Some(index + 1).filter(|&next| next < len),
            (PlaybackMode::AllLoop, Some(index)) => Some((index + 1) % len),
        }?;

        Some(Cursor {
            index: Some(index),
            history: from.history,
        })
    }

    /// Previous position under the playback mode alone
    fn mode_prev(&mut self, from: Cursor) -> Option<Cursor> {
        let len = self.entries.len();
        let current = from.index?;

        let index = match self.mode {
            PlaybackMode::Random => {
                let mut pos = from.history?;
                if pos == 0 {
                    self.prepend_history_block();
                    pos = self.history.position()?;
                }
                let target = pos - 1;
                let id = self.history.get(target)?;
                return Some(Cursor {
                    index: self.positions.get(&id).copied(),
                    history: Some(target),
                });
            }
            PlaybackMode::TrackOnce => None,
            PlaybackMode::TrackLoop => Some(current),
            PlaybackMode::AllOnce => current.checked_sub(1),
            PlaybackMode::AllLoop => Some((current + len - 1) % len),
        }?;

        Some(Cursor {
            index: Some(index),
            history: from.history,
        })
    }

    fn apply(&mut self, step: Step) {
        if step.from_queue {
            self.queue.pop_front();
            self.queue_changed();
        } else if self.mode == PlaybackMode::Random {
            self.history.set_position(step.cursor.history);
        }
        self.set_current(step.cursor.index);
    }

    fn set_current(&mut self, index: Option<usize>) {
        if self.index == index {
            return;
        }
        self.index = index;
        tracing::debug!("Current source: {:?}", index);
        self.pending_events.push(PlaylistEvent::IndexChanged { index });
    }

    fn walk_to_first_in_dir(&mut self) -> bool {
        for _ in 0..=self.entries.len() {
            if self.is_first_in_dir() {
                return true;
            }
            if !self.try_move_to_prev() {
                return false;
            }
        }
        true
    }

    fn checkpoint(&self) -> Option<Checkpoint> {
        Some(Checkpoint {
            current: self.current()?.id(),
            queue: self.queue.clone(),
        })
    }

    /// Undo an abandoned directory walk
    fn restore(&mut self, checkpoint: Checkpoint) {
        if checkpoint.queue.len() != self.queue.len() {
            self.queue = checkpoint.queue;
            self.queue_changed();
        }
        let index = self.positions.get(&checkpoint.current).copied();
        self.set_current(index);
        self.sync_history();
    }

    fn in_different_dirs(&self, a: usize, b: usize) -> bool {
        match (self.entries[a].parent_dir(), self.entries[b].parent_dir()) {
            (Some(left), Some(right)) => left != right,
            _ => true,
        }
    }

    fn reindex(&mut self) {
        self.positions.clear();
        for (index, source) in self.entries.iter_mut().enumerate() {
            source.set_index(index);
            self.positions.insert(source.id(), index);
        }
    }

    fn extend(&mut self, sources: Vec<Source>) {
        if sources.is_empty() {
            return;
        }
        for mut source in sources {
            let index = self.entries.len();
            source.set_index(index);
            self.positions.insert(source.id(), index);
            self.entries.push(source);
        }
        self.reset_history();
        self.list_changed();
    }

    fn import_one<F>(&mut self, entry: PlaylistEntry, add: F) -> Result<()>
    where
        F: FnOnce(&mut Importer<'_>, PlaylistEntry) -> soul_playlist::Result<()>,
    {
        let (result, sources) = {
            let mut importer = Importer::new(self.backend.as_ref(), &mut self.cues);
            let result = add(&mut importer, entry);
            (result, importer.finish().0)
        };
        if let Err(e) = &result {
            self.last_error = Some(LastError::from(e));
        }
        self.extend(sources);
        Ok(result?)
    }

    fn import_with<F>(&mut self, import: F) -> usize
    where
        F: FnOnce(&mut Importer<'_>) -> usize,
    {
        let (sources, error) = {
            let mut importer = Importer::new(self.backend.as_ref(), &mut self.cues);
            import(&mut importer);
            importer.finish()
        };
        if let Some(error) = error {
            self.last_error = Some(error);
        }
        let added = sources.len();
        self.extend(sources);
        added
    }

    // ===== Random History =====

    fn append_history_block(&mut self) {
        let ids: Vec<SourceId> = self.entries.iter().map(Source::id).collect();
        let block = self.shuffler.permutation(&ids);
        tracing::debug!("Appending history block of {} sources", block.len());
        self.history.append_block(block);
    }

    fn prepend_history_block(&mut self) {
        let ids: Vec<SourceId> = self.entries.iter().map(Source::id).collect();
        let block = self.shuffler.permutation(&ids);
        tracing::debug!("Prepending history block of {} sources", block.len());
        self.history.prepend_block(block);
    }

    fn ensure_history(&mut self) {
        if self.history.is_empty() {
            self.sync_history();
        }
    }

    fn reset_history(&mut self) {
        self.history.clear();
        self.sync_history();
    }

    /// Point the history at the current source after an out-of-band change
    fn sync_history(&mut self) {
        if self.mode != PlaybackMode::Random || self.entries.is_empty() {
            self.history.clear();
            return;
        }
        let Some(id) = self.current().map(Source::id) else {
            self.history.set_position(None);
            return;
        };
        if self.history.current() == Some(id) {
            return;
        }
        if let Some(position) = self.history.find(id) {
            self.history.set_position(Some(position));
            return;
        }

        // A fresh block leads with the current source so its first cycle
        // still plays every other source
        self.history.clear();
        self.append_history_block();
        self.history.start_at(id);
    }

    fn queue_changed(&mut self) {
        self.pending_events.push(PlaylistEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    fn list_changed(&mut self) {
        self.pending_events.push(PlaylistEvent::ListChanged {
            length: self.entries.len(),
        });
    }
}

impl Default for PlaylistEngine {
    fn default() -> Self {
        Self::new(PlaylistConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn create_test_engine(mode: PlaybackMode, count: usize) -> PlaylistEngine {
        let mut engine = PlaylistEngine::new(PlaylistConfig {
            mode,
            shuffle_seed: Some(7),
            ..Default::default()
        });
        for i in 0..count {
            engine.add_file(&format!("/music/track{i}.mp3")).unwrap();
        }
        engine.drain_events();
        engine
    }

    #[test]
    fn all_loop_wraps() {
        let mut engine = create_test_engine(PlaybackMode::AllLoop, 3);
        engine.set_index(2).unwrap();

        assert_eq!(engine.next_index(), Some(0));
        assert_eq!(engine.prev_index(), Some(1));
    }

    #[test]
    fn all_once_stops_at_ends() {
        let mut engine = create_test_engine(PlaybackMode::AllOnce, 3);
        engine.set_index(0).unwrap();
        assert_eq!(engine.prev_index(), None);

        engine.set_index(2).unwrap();
        assert_eq!(engine.next_index(), None);
        assert!(!engine.try_move_to_next());
        assert_eq!(engine.current_index(), Some(2));

        assert!(!engine.move_to_next());
        assert_eq!(engine.current_index(), None);
    }

    #[test]
    fn track_modes() {
        let mut engine = create_test_engine(PlaybackMode::TrackOnce, 3);
        engine.set_index(1).unwrap();
        assert_eq!(engine.next_index(), None);
        assert_eq!(engine.prev_index(), None);

        engine.set_mode(PlaybackMode::TrackLoop);
        assert_eq!(engine.next_index(), Some(1));
        assert_eq!(engine.prev_index(), Some(1));
    }

    #[test]
    fn no_current_source() {
        let mut engine = create_test_engine(PlaybackMode::AllLoop, 3);
        assert_eq!(engine.next_index(), Some(0));
        assert_eq!(engine.prev_index(), None);

        engine.set_mode(PlaybackMode::TrackLoop);
        assert_eq!(engine.next_index(), None);
    }

    #[test]
    fn empty_engine() {
        let mut engine = create_test_engine(PlaybackMode::Random, 0);
        assert_eq!(engine.next_index(), None);
        assert_eq!(engine.prev_index(), None);
        assert!(!engine.move_to_next());
        assert!(engine.is_first_in_dir());
        assert!(engine.next_sources(3).is_empty());
    }

    #[test]
    fn queue_overrides_next_only() {
        let mut engine = create_test_engine(PlaybackMode::TrackOnce, 4);
        engine.set_index(1).unwrap();
        engine.append_to_queue(3).unwrap();

        assert_eq!(engine.next_index(), Some(3));
        assert_eq!(engine.prev_index(), None);

        assert!(engine.move_to_next());
        assert_eq!(engine.current_index(), Some(3));
        assert_eq!(engine.queue_len(), 0);
        assert_eq!(engine.next_index(), None);
    }

    #[test]
    fn queue_bounds() {
        let mut engine = create_test_engine(PlaybackMode::AllLoop, 2);
        assert!(matches!(
            engine.append_to_queue(2),
            Err(PlaybackError::OutOfRange { index: 2, len: 2 })
        ));
        assert!(matches!(
            engine.remove_from_queue(0),
            Err(PlaybackError::OutOfRange { index: 0, len: 0 })
        ));

        engine.insert_into_queue(1, 99).unwrap();
        engine.insert_into_queue(0, 0).unwrap();
        assert_eq!(engine.queue(), vec![0, 1]);
    }

    #[test]
    fn remove_adjusts_index_and_queue() {
        let mut engine = create_test_engine(PlaybackMode::AllLoop, 4);
        engine.set_index(3).unwrap();
        engine.append_to_queue(1).unwrap();
        engine.append_to_queue(2).unwrap();
        engine.append_to_queue(1).unwrap();

        engine.remove(1).unwrap();

        assert_eq!(engine.len(), 3);
        assert_eq!(engine.current_index(), Some(2));
        assert_eq!(engine.queue(), vec![1]);
        assert!(engine.sources().iter().enumerate().all(|(i, s)| s.index() == i));

        engine.remove(2).unwrap();
        assert_eq!(engine.current_index(), None);
        assert!(engine.remove(5).is_err());
    }

    #[test]
    fn random_history_tracks_current() {
        let mut engine = create_test_engine(PlaybackMode::Random, 5);
        engine.set_index(3).unwrap();

        let position = engine.history_index().unwrap();
        assert_eq!(engine.history()[position], 3);
        assert_eq!(engine.history().len(), 5);

        let next = engine.next_index().unwrap();
        assert!(engine.move_to_next());
        assert_eq!(engine.current_index(), Some(next));
        assert_eq!(engine.history_index(), Some(position + 1));

        assert!(engine.move_to_prev());
        assert_eq!(engine.current_index(), Some(3));
    }

    #[test]
    fn random_prev_prepends_block() {
        let mut engine = create_test_engine(PlaybackMode::Random, 4);
        engine.set_index(0).unwrap();
        let position = engine.history_index().unwrap();
        for _ in 0..=position {
            assert!(engine.move_to_prev());
        }

        assert_eq!(engine.history().len(), 8);
        assert_eq!(engine.history_index(), Some(3));
    }

    #[test]
    fn random_first_cycle_covers_every_source() {
        let mut engine = create_test_engine(PlaybackMode::Random, 6);
        engine.set_index(2).unwrap();
        assert_eq!(engine.history_index(), Some(0));

        let mut visited = HashSet::new();
        for _ in 0..5 {
            assert!(engine.move_to_next());
            visited.extend(engine.current_index());
        }

        assert_eq!(visited, HashSet::from([0, 1, 3, 4, 5]));
        assert_eq!(engine.history().len(), 6);
    }

    #[test]
    fn random_boundaries_ignore_list_positions() {
        let mut engine = create_test_engine(PlaybackMode::Random, 5);

        engine.set_index(0).unwrap();
        assert!(!engine.is_at_start());
        assert!(!engine.is_first_in_dir());

        engine.set_index(4).unwrap();
        assert!(!engine.is_at_end());
        assert!(!engine.is_last_in_dir());
    }

    #[test]
    fn boundaries_without_current_source() {
        let engine = create_test_engine(PlaybackMode::AllLoop, 3);
        assert!(engine.is_at_start());
        assert!(engine.is_at_end());

        let mut single = create_test_engine(PlaybackMode::Random, 1);
        single.set_index(0).unwrap();
        assert!(single.is_at_start());
        assert!(single.is_at_end());
    }

    #[test]
    fn leaving_random_clears_history() {
        let mut engine = create_test_engine(PlaybackMode::Random, 3);
        engine.set_index(1).unwrap();
        assert!(!engine.history().is_empty());

        engine.set_mode(PlaybackMode::AllOnce);
        assert!(engine.history().is_empty());
        assert_eq!(engine.history_index(), None);
        assert_eq!(
            engine.drain_events(),
            vec![
                PlaylistEvent::IndexChanged { index: Some(1) },
                PlaylistEvent::ModeChanged {
                    mode: PlaybackMode::AllOnce
                },
            ]
        );
    }

    #[test]
    fn shuffle_keeps_current_source() {
        let mut engine = create_test_engine(PlaybackMode::AllLoop, 10);
        engine.set_index(4).unwrap();
        let uri = engine.current().unwrap().uri().to_string();

        engine.shuffle();

        assert_eq!(engine.current().unwrap().uri(), uri);
        assert_eq!(engine.index_of_uri(&uri), engine.current_index());
        assert!(engine.sources().iter().enumerate().all(|(i, s)| s.index() == i));
    }

    #[test]
    fn lookahead_follows_queue_then_mode() {
        let mut engine = create_test_engine(PlaybackMode::AllOnce, 5);
        engine.set_index(0).unwrap();
        engine.append_to_queue(3).unwrap();

        assert_eq!(engine.next_sources(3), vec![3, 4]);

        engine.set_mode(PlaybackMode::AllLoop);
        assert_eq!(engine.next_sources(4), vec![3, 4, 0, 1]);
    }

    #[test]
    fn add_url_rejects_local_paths() {
        let mut engine = create_test_engine(PlaybackMode::AllLoop, 0);
        let err = engine.add_url("/music/a.mp3").unwrap_err();
        assert!(matches!(err, PlaybackError::Playlist(PlaylistError::NotUrl(_))));
        assert_eq!(
            engine.last_error().map(|e| e.kind),
            Some(soul_playlist::ErrorKind::NotUrl)
        );

        engine.add_url("http://radio.example.com/stream").unwrap();
        assert_eq!(engine.len(), 1);
        assert!(!engine.sources()[0].is_local());
    }

    #[test]
    fn write_uses_current_order() {
        let mut engine = create_test_engine(PlaybackMode::AllLoop, 2);
        let text = String::from_utf8(engine.write(PlaylistFormat::M3u).unwrap()).unwrap();
        assert_eq!(text, "#EXTM3U\n/music/track0.mp3\n/music/track1.mp3\n");

        assert!(engine.write_file(Path::new("/tmp/list.cue")).is_err());
        engine.clear();
        assert!(engine.is_empty());
    }

    struct UriOpener;

    impl SourceOpener for UriOpener {
        type Handle = String;

        fn open(&self, source: &Source) -> soul_playlist::Result<String> {
            Ok(source.uri().to_string())
        }
    }

    #[test]
    fn open_current_delegates() {
        let mut engine = create_test_engine(PlaybackMode::AllLoop, 2);
        assert!(matches!(
            engine.open_current(&UriOpener),
            Err(PlaybackError::NoCurrentSource)
        ));

        engine.set_index(1).unwrap();
        assert_eq!(engine.open_current(&UriOpener).unwrap(), "/music/track1.mp3");
    }
}
